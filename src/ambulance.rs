use std::collections::HashMap;

use crate::chooser::movements_compatible;
use crate::movement::{LaneId, Movement, MovementKey};
use crate::queue_state::QueueState;
use crate::topology::Topology;

/// A registered ambulance: `eta_abs` and `detected_at` are absolute times on
/// the injected clock (spec §3).
#[derive(Clone, Debug, PartialEq)]
pub struct Ambulance {
    pub id: String,
    pub lane: LaneId,
    pub movement: Movement,
    pub eta_abs: f64,
    pub detected_at: f64,
}

impl Ambulance {
    pub fn movement_key(&self) -> MovementKey {
        MovementKey::new(self.lane.clone(), self.movement)
    }
}

/// Tracks live ambulances by id; latest registration wins (spec §4.2).
#[derive(Clone, Debug, Default)]
pub struct AmbulanceRegistry {
    ambulances: Vec<Ambulance>,
}

impl AmbulanceRegistry {
    pub fn new() -> AmbulanceRegistry {
        AmbulanceRegistry::default()
    }

    pub fn register(
        &mut self,
        amb_id: &str,
        lane: &str,
        movement: Movement,
        eta_seconds: f64,
        now: f64,
    ) {
        self.ambulances.retain(|a| a.id != amb_id);
        self.ambulances.push(Ambulance {
            id: amb_id.to_string(),
            lane: lane.to_string(),
            movement,
            eta_abs: now + eta_seconds.max(0.0),
            detected_at: now,
        });
    }

    /// Bounds memory: drops ambulances whose ETA is more than one cycle in
    /// the past. Not required for correctness (spec §4.2).
    pub fn purge_expired(&mut self, now: f64, grace: f64) {
        self.ambulances.retain(|a| a.eta_abs >= now - grace);
    }

    pub fn live(&self) -> &[Ambulance] {
        &self.ambulances
    }
}

/// A scheduled pre-clearance window for one ambulance (spec §3 PlannedJob).
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedJob {
    pub ambulance_id: String,
    pub movement_key: MovementKey,
    pub dest: LaneId,
    pub t_arrival: f64,
    pub t_start: f64,
    pub g_required: f64,
    pub start: f64,
}

impl PlannedJob {
    pub fn is_running(&self, now: f64) -> bool {
        self.start <= now && now <= self.start + self.g_required
    }

    pub fn is_imminent(&self, now: f64, reaction_margin: f64) -> bool {
        self.start <= now + reaction_margin
    }
}

/// Earliest-deadline-first, conflict-aware pre-clearance scheduler (spec §4.3).
pub fn plan_ambulances(
    registry: &AmbulanceRegistry,
    topology: &Topology,
    queue: &QueueState,
    now: f64,
    clearance_rate: f64,
    safety_margin: f64,
    min_green: f64,
    max_green: f64,
    reaction_margin: f64,
) -> Vec<PlannedJob> {
    let mut jobs: Vec<PlannedJob> = Vec::new();
    for amb in registry.live() {
        let key = amb.movement_key();
        let Some(dest) = topology.destination(&key) else {
            // Missing topology (spec §7): silently dropped, not an error.
            continue;
        };
        let dest = dest.clone();
        let q_dest = queue.lane_total(&dest);
        let g_required = (q_dest as f64 / clearance_rate.max(1e-6) + safety_margin)
            .clamp(min_green, max_green);
        let t_start = amb.eta_abs - g_required;
        jobs.push(PlannedJob {
            ambulance_id: amb.id.clone(),
            movement_key: key,
            dest,
            t_arrival: amb.eta_abs,
            t_start,
            g_required,
            start: t_start,
        });
    }

    jobs.sort_by(|a, b| a.t_arrival.partial_cmp(&b.t_arrival).unwrap());

    let mut scheduled: Vec<PlannedJob> = Vec::new();
    for mut job in jobs {
        if job.t_start <= now + reaction_margin {
            job.start = now;
            scheduled.push(job);
            continue;
        }
        let job_end = job.t_start + job.g_required;
        let mut conflict = false;
        for sj in &scheduled {
            let sj_end = sj.start + sj.g_required;
            let overlaps = !(job_end <= sj.start || sj_end <= job.t_start);
            if overlaps && !movements_compatible(topology, queue, &job.movement_key, &sj.movement_key)
            {
                conflict = true;
                break;
            }
        }
        if conflict {
            job.start = now;
        } else {
            job.start = job.t_start;
        }
        scheduled.push(job);
    }
    scheduled
}

/// Convenience lookup used by the orchestrator/tests: the last planned job
/// per ambulance id.
pub fn jobs_by_ambulance(jobs: &[PlannedJob]) -> HashMap<&str, &PlannedJob> {
    jobs.iter().map(|j| (j.ambulance_id.as_str(), j)).collect()
}
