use serde::{Deserialize, Serialize};

use crate::movement::MovementKey;

/// Which policy produced the active phase — also the priority order in which
/// policies are attempted each cycle (spec §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseKind {
    Ambulance,
    Emergency,
    Normal,
}

/// The result of one cycle's policy resolution: which movements got GREEN,
/// for how long, starting when, and under which policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    pub movements: Vec<MovementKey>,
    pub started_at: f64,
    pub duration: f64,
}

impl Phase {
    pub fn contains(&self, key: &MovementKey) -> bool {
        self.movements.contains(key)
    }
}
