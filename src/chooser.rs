use crate::movement::{Movement, MovementKey};
use crate::queue_state::QueueState;
use crate::topology::Topology;

/// Spec §4.5: `a` and `b` can hold GREEN at the same time iff they're
/// distinct, neither conflicts with the other, both have a defined
/// destination, and neither destination is currently blocked (I5).
pub fn movements_compatible(
    topology: &Topology,
    queue: &QueueState,
    a: &MovementKey,
    b: &MovementKey,
) -> bool {
    if a == b {
        return false;
    }
    if topology.conflicts_with(a, b) {
        return false;
    }
    let (Some(dest_a), Some(dest_b)) = (topology.destination(a), topology.destination(b)) else {
        return false;
    };
    if topology.is_blocked(dest_a, queue.lane_total(dest_a)) {
        return false;
    }
    if topology.is_blocked(dest_b, queue.lane_total(dest_b)) {
        return false;
    }
    true
}

/// Picks among movements with `emergency > 0`, tied at the maximum count,
/// via a lane-cyclic round-robin remembered across calls (spec §4.5).
#[derive(Clone, Debug, Default)]
pub struct EmergencyChooser {
    last_lane: Option<String>,
}

impl EmergencyChooser {
    pub fn new() -> EmergencyChooser {
        EmergencyChooser::default()
    }

    pub fn choose(&mut self, topology: &Topology, queue: &QueueState) -> Option<MovementKey> {
        let lanes = topology.lanes();
        let mut max_count = 0;
        let mut tied = Vec::new();
        for lane in lanes {
            for m in Movement::ALL {
                let key = MovementKey::new(lane.clone(), m);
                let emergency = queue.get(&key).emergency;
                if emergency == 0 {
                    continue;
                }
                if emergency > max_count {
                    max_count = emergency;
                    tied.clear();
                    tied.push(key);
                } else if emergency == max_count {
                    tied.push(key);
                }
            }
        }
        if tied.is_empty() {
            return None;
        }
        if tied.len() == 1 {
            let chosen = tied.into_iter().next().unwrap();
            self.last_lane = Some(chosen.lane.clone());
            return Some(chosen);
        }

        let start = self
            .last_lane
            .as_ref()
            .and_then(|last| lanes.iter().position(|l| l == last))
            .map(|idx| (idx + 1) % lanes.len())
            .unwrap_or(0);

        let mut chosen = None;
        'outer: for i in 0..lanes.len() {
            let lane = &lanes[(start + i) % lanes.len()];
            for m in Movement::ALL {
                let key = MovementKey::new(lane.clone(), m);
                if tied.contains(&key) {
                    chosen = Some(key);
                    break 'outer;
                }
            }
        }
        let chosen = chosen.unwrap_or_else(|| tied[0].clone());
        self.last_lane = Some(chosen.lane.clone());
        Some(chosen)
    }
}

/// Spec §4.5: `score = normal * (1 + wait * wait_boost)`, `+10_000` past
/// `starvation_limit`, `-inf` if the destination is blocked.
pub fn normal_score(
    topology: &Topology,
    queue: &QueueState,
    key: &MovementKey,
    wait_boost: f64,
    starvation_limit: u32,
) -> f64 {
    let counts = queue.get(key);
    if let Some(dest) = topology.destination(key) {
        if topology.is_blocked(dest, queue.lane_total(dest)) {
            return f64::NEG_INFINITY;
        }
    }
    let mut score = counts.normal as f64 * (1.0 + counts.wait as f64 * wait_boost);
    if counts.wait >= starvation_limit {
        score += 10_000.0;
    }
    score
}

/// Highest-scored MovementKey, ties broken by iteration order (spec §4.5:
/// lane-insertion, then straight/left/right — the order `Topology::movement_keys`
/// already produces).
pub fn choose_normal(
    topology: &Topology,
    queue: &QueueState,
    wait_boost: f64,
    starvation_limit: u32,
) -> Option<MovementKey> {
    topology
        .movement_keys()
        .into_iter()
        .map(|key| {
            let score = normal_score(topology, queue, &key, wait_boost, starvation_limit);
            (key, score)
        })
        .fold(None, |best: Option<(MovementKey, f64)>, (key, score)| {
            match &best {
                Some((_, b)) if *b >= score => best,
                _ => Some((key, score)),
            }
        })
        .map(|(key, _)| key)
}

/// Greedily extends `seed` with compatible movements, scanning remaining
/// candidates in descending score order, up to `limit` members (spec §4.5).
pub fn build_co_phase(
    topology: &Topology,
    queue: &QueueState,
    seed: MovementKey,
    wait_boost: f64,
    starvation_limit: u32,
    limit: usize,
) -> Vec<MovementKey> {
    let mut candidates: Vec<MovementKey> = topology
        .movement_keys()
        .into_iter()
        .filter(|k| *k != seed)
        .collect();
    candidates.sort_by(|a, b| {
        let sa = normal_score(topology, queue, a, wait_boost, starvation_limit);
        let sb = normal_score(topology, queue, b, wait_boost, starvation_limit);
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut set = vec![seed];
    for candidate in candidates {
        if set.len() >= limit {
            break;
        }
        if set
            .iter()
            .all(|chosen| movements_compatible(topology, queue, &candidate, chosen))
        {
            set.push(candidate);
        }
    }
    set
}
