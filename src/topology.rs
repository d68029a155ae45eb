use std::collections::{HashMap, HashSet};

use crate::movement::{LaneId, Movement, MovementKey};

/// A destination lane is blocked once its total queue is within this many
/// vehicles of its exit capacity.
pub const BLOCK_MARGIN: u32 = 2;

/// The lane set, the derived turn mapping, and the derived conflict relation.
///
/// Lanes are insertion-ordered and never removed (spec invariant I4): once a
/// lane has been mentioned in a snapshot it stays in the topology for the
/// life of the controller. `turn_map` and `conflicts` are purely functions of
/// the current lane ordering, so they're thrown away and recomputed by
/// `rebuild` rather than incrementally patched — cheap, and it can't drift.
#[derive(Clone, Debug)]
pub struct Topology {
    lanes: Vec<LaneId>,
    lane_index: HashMap<LaneId, usize>,
    turn_map: HashMap<MovementKey, LaneId>,
    conflicts: HashMap<MovementKey, HashSet<MovementKey>>,
    exit_capacity: HashMap<LaneId, u32>,
    exit_capacity_default: u32,
}

impl Topology {
    pub fn new(exit_capacity_default: u32) -> Topology {
        Topology {
            lanes: Vec::new(),
            lane_index: HashMap::new(),
            turn_map: HashMap::new(),
            conflicts: HashMap::new(),
            exit_capacity: HashMap::new(),
            exit_capacity_default,
        }
    }

    /// Idempotent insertion. Returns true if the lane was new.
    pub fn ensure_lane(&mut self, lane: &str) -> bool {
        if self.lane_index.contains_key(lane) {
            return false;
        }
        self.lane_index.insert(lane.to_string(), self.lanes.len());
        self.lanes.push(lane.to_string());
        self.exit_capacity
            .insert(lane.to_string(), self.exit_capacity_default);
        true
    }

    pub fn lanes(&self) -> &[LaneId] {
        &self.lanes
    }

    pub fn exit_capacity(&self, lane: &str) -> u32 {
        self.exit_capacity
            .get(lane)
            .copied()
            .unwrap_or(self.exit_capacity_default)
    }

    pub fn set_exit_capacity(&mut self, lane: &str, capacity: u32) {
        self.exit_capacity.insert(lane.to_string(), capacity);
    }

    /// Every MovementKey in the topology, in lane-insertion then
    /// straight/left/right order — the deterministic tie-break order used by
    /// the choosers.
    pub fn movement_keys(&self) -> Vec<MovementKey> {
        let mut keys = Vec::with_capacity(self.lanes.len() * Movement::ALL.len());
        for lane in &self.lanes {
            for movement in Movement::ALL {
                keys.push(MovementKey::new(lane.clone(), movement));
            }
        }
        keys
    }

    pub fn destination(&self, key: &MovementKey) -> Option<&LaneId> {
        self.turn_map.get(key)
    }

    /// True iff `total` queued vehicles leaves `lane` with less than
    /// `BLOCK_MARGIN` spare capacity (spec invariant I5).
    pub fn is_blocked(&self, lane: &str, total: u32) -> bool {
        total >= self.exit_capacity(lane).saturating_sub(BLOCK_MARGIN)
    }

    pub fn conflicts_with(&self, a: &MovementKey, b: &MovementKey) -> bool {
        self.conflicts.get(a).is_some_and(|s| s.contains(b))
            || self.conflicts.get(b).is_some_and(|s| s.contains(a))
    }

    /// Recompute `turn_map` and `conflicts` from the current lane ordering.
    /// Must be called after any change to the lane set, before choosing.
    pub fn rebuild(&mut self) {
        self.turn_map.clear();
        let n = self.lanes.len();
        if n > 0 {
            let half = n / 2;
            for (i, lane) in self.lanes.iter().enumerate() {
                let straight = self.lanes[(i + half) % n].clone();
                let left = self.lanes[(i + n - 1) % n].clone();
                let right = self.lanes[(i + 1) % n].clone();
                self.turn_map
                    .insert(MovementKey::new(lane.clone(), Movement::Straight), straight);
                self.turn_map
                    .insert(MovementKey::new(lane.clone(), Movement::Left), left);
                self.turn_map
                    .insert(MovementKey::new(lane.clone(), Movement::Right), right);
            }
        }

        self.conflicts.clear();
        let keys = self.movement_keys();
        for key in &keys {
            let mut set = HashSet::new();
            let dest = self.turn_map.get(key);
            for other in &keys {
                if other == key {
                    continue;
                }
                if other.lane == key.lane {
                    set.insert(other.clone());
                    continue;
                }
                if let (Some(d1), Some(d2)) = (dest, self.turn_map.get(other)) {
                    if d1 == d2 {
                        set.insert(other.clone());
                    }
                }
            }
            self.conflicts.insert(key.clone(), set);
        }
    }
}
