use std::collections::{HashMap, HashSet};

use log::{debug, trace, warn};

use crate::ambulance::{plan_ambulances, AmbulanceRegistry, PlannedJob};
use crate::chooser::{build_co_phase, choose_normal, movements_compatible, EmergencyChooser};
use crate::config::Config;
use crate::flow::{simulate_flow, ArrivalSource};
use crate::green_time::{green_for_movement, phase_duration};
use crate::movement::{LaneId, Movement, MovementKey};
use crate::phase::{Phase, PhaseKind};
use crate::queue_state::{Light, QueueState};
use crate::topology::Topology;

/// One entry of the per-cycle sensor snapshot (spec §6).
#[derive(Clone, Debug, Default)]
pub struct SnapshotEntry {
    pub lane_id: LaneId,
    pub movements: HashMap<Movement, u32>,
    pub emergency: HashMap<Movement, u32>,
}

impl SnapshotEntry {
    pub fn new(lane_id: impl Into<LaneId>) -> SnapshotEntry {
        SnapshotEntry {
            lane_id: lane_id.into(),
            movements: HashMap::new(),
            emergency: HashMap::new(),
        }
    }

    pub fn with_normal(mut self, movement: Movement, count: u32) -> SnapshotEntry {
        self.movements.insert(movement, count);
        self
    }

    pub fn with_emergency(mut self, movement: Movement, count: u32) -> SnapshotEntry {
        self.emergency.insert(movement, count);
        self
    }
}

/// `lane_id -> {straight, left, right} -> light`, the wire output of spec §6.
pub type LightTable = HashMap<LaneId, HashMap<Movement, Light>>;

/// Owns the topology, queue state and ambulance registry for a single
/// intersection, and drives the cycle orchestrator of spec §4.8. The only
/// mutating entry points are `register_ambulance` and `update`; the caller
/// is responsible for serialising calls (spec §5 -- no internal locking).
pub struct Controller {
    config: Config,
    topology: Topology,
    queue: QueueState,
    ambulances: AmbulanceRegistry,
    emergency_chooser: EmergencyChooser,
    active_phase: Option<Phase>,
}

impl Controller {
    pub fn new(config: Config) -> Controller {
        Controller {
            topology: Topology::new(config.exit_capacity_default),
            queue: QueueState::new(),
            ambulances: AmbulanceRegistry::new(),
            emergency_chooser: EmergencyChooser::new(),
            active_phase: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn active_phase(&self) -> Option<&Phase> {
        self.active_phase.as_ref()
    }

    pub fn queue_state(&self) -> &QueueState {
        &self.queue
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Lazily ensures the lane exists before recording the registration
    /// (spec §4.2: "unknown lanes cause lazy ensure_lane").
    pub fn register_ambulance(
        &mut self,
        amb_id: &str,
        lane: &str,
        movement: Movement,
        eta_seconds: f64,
        now: f64,
    ) {
        self.topology.ensure_lane(lane);
        self.ambulances.register(amb_id, lane, movement, eta_seconds, now);
        debug!(
            "ambulance {} registered on {}:{} eta={:.1}s",
            amb_id, lane, movement, eta_seconds
        );
    }

    /// Runs one cycle: ingest -> plan -> choose -> activate -> simulate -> emit
    /// (spec §4.8).
    pub fn update(
        &mut self,
        snapshot: &[SnapshotEntry],
        now: f64,
        arrivals: &mut dyn ArrivalSource,
    ) -> LightTable {
        for entry in snapshot {
            self.topology.ensure_lane(&entry.lane_id);
        }
        self.topology.rebuild();

        for entry in snapshot {
            for key in self.topology.movement_keys() {
                if key.lane != entry.lane_id {
                    continue;
                }
                self.queue.ensure(&key);
                if let Some(&count) = entry.movements.get(&key.movement) {
                    self.queue.set_normal(&key, count);
                }
                let emergency = entry.emergency.get(&key.movement).copied().unwrap_or(0);
                self.queue.set_emergency(&key, emergency);
            }
        }

        // Grace is one cycle (spec §4.2), approximated by the previous
        // phase's duration -- or `max_green` before any phase has run --
        // rather than a multiple of it, so an already-arrived ambulance
        // doesn't keep re-planning as "running" for several cycles past
        // its ETA.
        let purge_grace = self
            .active_phase
            .as_ref()
            .map(|p| p.duration)
            .unwrap_or(self.config.max_green);
        self.ambulances.purge_expired(now, purge_grace);
        let planned = plan_ambulances(
            &self.ambulances,
            &self.topology,
            &self.queue,
            now,
            self.config.clearance_rate,
            self.config.ambulance_safety_margin,
            self.config.min_green,
            self.config.max_green,
            self.config.reaction_margin,
        );

        let phase = self
            .try_ambulance_policy(&planned, now)
            .or_else(|| self.try_emergency_policy(now))
            .unwrap_or_else(|| self.normal_policy(now));

        // Scratch/commit (spec §4.7, §5): the flow model -- and the light
        // assignment that goes with it -- runs on a clone of the queue
        // state. Nothing in this cycle touches `self.queue` until the
        // commit at the very end, so a mid-cycle failure would leave the
        // committed state untouched.
        let mut scratch = self.queue.clone();
        let all_keys = self.topology.movement_keys();
        scratch.set_all_red(&all_keys);
        scratch.set_green(&phase.movements);

        simulate_flow(
            &mut scratch,
            &self.topology,
            &phase.movements,
            phase.duration,
            self.config.clearance_rate,
            arrivals,
        );

        let granted: HashSet<MovementKey> = phase.movements.iter().cloned().collect();
        scratch.update_waits(&all_keys, &granted);

        self.queue = scratch;

        debug!(
            "phase {:?} movements={:?} duration={:.1}s",
            phase.kind, phase.movements, phase.duration
        );
        self.active_phase = Some(phase);

        self.emit()
    }

    fn try_ambulance_policy(&self, planned: &[PlannedJob], now: f64) -> Option<Phase> {
        let mut running: Vec<&PlannedJob> = planned
            .iter()
            .filter(|j| j.is_running(now))
            .collect();
        if running.is_empty() {
            running = planned
                .iter()
                .filter(|j| j.is_imminent(now, self.config.reaction_margin))
                .collect();
        }
        if running.is_empty() {
            trace!("no ambulance job running or imminent, falling through to emergency policy");
            return None;
        }
        running.sort_by(|a, b| a.t_arrival.partial_cmp(&b.t_arrival).unwrap());

        let mut greens: Vec<MovementKey> = Vec::new();
        for job in &running {
            if greens
                .iter()
                .all(|g| movements_compatible(&self.topology, &self.queue, &job.movement_key, g))
            {
                greens.push(job.movement_key.clone());
            }
        }
        if greens.is_empty() {
            greens.push(running[0].movement_key.clone());
        }

        let duration = running
            .iter()
            .filter(|j| greens.contains(&j.movement_key))
            .map(|j| j.g_required)
            .fold(self.config.min_green, f64::max);

        Some(Phase {
            kind: PhaseKind::Ambulance,
            movements: greens,
            started_at: now,
            duration,
        })
    }

    fn try_emergency_policy(&mut self, now: f64) -> Option<Phase> {
        let chosen = self.emergency_chooser.choose(&self.topology, &self.queue)?;
        let duration = green_for_movement(
            self.queue.get(&chosen),
            self.config.min_green,
            self.config.max_green,
        );
        Some(Phase {
            kind: PhaseKind::Emergency,
            movements: vec![chosen],
            started_at: now,
            duration,
        })
    }

    fn normal_policy(&self, now: f64) -> Phase {
        let n_lanes = self.topology.lanes().len().max(1);
        let limit = (n_lanes / 2).max(1);

        let seed = choose_normal(
            &self.topology,
            &self.queue,
            self.config.wait_boost,
            self.config.starvation_limit,
        );
        let seed = match seed {
            Some(s) => s,
            None => {
                warn!("normal policy found no candidate movement; no lanes in topology");
                return Phase {
                    kind: PhaseKind::Normal,
                    movements: Vec::new(),
                    started_at: now,
                    duration: self.config.min_green,
                };
            }
        };

        // Policy-vacuum fallback (spec §7): if every destination is blocked,
        // `choose_normal` scored everything -inf but still returned the
        // highest-scored (tied-first) key -- that *is* the fallback. We only
        // need to flag it for observability.
        if let Some(dest) = self.topology.destination(&seed) {
            if self.topology.is_blocked(dest, self.queue.lane_total(dest)) {
                warn!(
                    "policy-vacuum fallback: every destination blocked, selecting {} anyway",
                    seed
                );
            }
        }

        let movements = build_co_phase(
            &self.topology,
            &self.queue,
            seed,
            self.config.wait_boost,
            self.config.starvation_limit,
            limit,
        );

        let duration = phase_duration(
            movements.iter().map(|k| {
                green_for_movement(self.queue.get(k), self.config.min_green, self.config.max_green)
            }),
            self.config.min_green,
        );

        Phase {
            kind: PhaseKind::Normal,
            movements,
            started_at: now,
            duration,
        }
    }

    fn emit(&self) -> LightTable {
        let mut table: LightTable = HashMap::new();
        for lane in self.topology.lanes() {
            let mut row = HashMap::new();
            for m in Movement::ALL {
                row.insert(m, self.queue.get(&MovementKey::new(lane.clone(), m)).light);
            }
            table.insert(lane.clone(), row);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::NoArrivals;

    fn controller() -> Controller {
        Controller::new(Config::default())
    }

    #[test]
    fn single_lane_no_traffic_grants_straight_for_min_green() {
        let mut c = controller();
        let snapshot = vec![SnapshotEntry::new("A")];
        let table = c.update(&snapshot, 0.0, &mut NoArrivals);
        assert_eq!(table["A"][&Movement::Straight], Light::Green);
        assert_eq!(table["A"][&Movement::Left], Light::Red);
        assert_eq!(table["A"][&Movement::Right], Light::Red);
        assert_eq!(c.active_phase().unwrap().duration, 3.0);
        assert_eq!(c.active_phase().unwrap().kind, PhaseKind::Normal);
    }

    #[test]
    fn emergency_preempts_congested_normal() {
        let mut c = controller();
        let snapshot = vec![
            SnapshotEntry::new("A").with_normal(Movement::Straight, 20),
            SnapshotEntry::new("B").with_emergency(Movement::Left, 1),
        ];
        let table = c.update(&snapshot, 0.0, &mut NoArrivals);
        assert_eq!(c.active_phase().unwrap().kind, PhaseKind::Emergency);
        assert_eq!(table["B"][&Movement::Left], Light::Green);
        assert_eq!(table["A"][&Movement::Straight], Light::Red);
    }

    #[test]
    fn ambulance_imminent_preempts_everything() {
        let mut c = controller();
        let snapshot = vec![
            SnapshotEntry::new("L0"),
            SnapshotEntry::new("L1"),
            SnapshotEntry::new("L2"),
            SnapshotEntry::new("L3"),
        ];
        c.update(&snapshot, 0.0, &mut NoArrivals);
        c.register_ambulance("amb1", "L2", Movement::Straight, 0.1, 0.0);
        let table = c.update(&snapshot, 0.05, &mut NoArrivals);
        assert_eq!(c.active_phase().unwrap().kind, PhaseKind::Ambulance);
        assert_eq!(table["L2"][&Movement::Straight], Light::Green);
    }

    #[test]
    fn starvation_bonus_grants_green_eventually() {
        let mut c = controller();
        let snapshot = vec![
            SnapshotEntry::new("A").with_normal(Movement::Straight, 1),
            SnapshotEntry::new("B").with_normal(Movement::Straight, 100),
        ];
        let mut last_table = None;
        for i in 0..9 {
            last_table = Some(c.update(&snapshot, i as f64, &mut NoArrivals));
        }
        assert_eq!(last_table.unwrap()["A"][&Movement::Straight], Light::Green);
    }

    #[test]
    fn no_two_conflicting_movements_are_ever_green() {
        let mut c = controller();
        let snapshot = vec![
            SnapshotEntry::new("L0").with_normal(Movement::Straight, 10),
            SnapshotEntry::new("L1").with_normal(Movement::Straight, 10),
            SnapshotEntry::new("L2").with_normal(Movement::Straight, 10),
            SnapshotEntry::new("L3").with_normal(Movement::Straight, 10),
        ];
        for i in 0..20 {
            c.update(&snapshot, i as f64, &mut NoArrivals);
            let greens = &c.active_phase().unwrap().movements;
            for a in greens {
                for b in greens {
                    if a != b {
                        assert!(!c.topology().conflicts_with(a, b));
                    }
                }
            }
        }
    }
}
