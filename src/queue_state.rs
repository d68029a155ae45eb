use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::movement::{Movement, MovementKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Light {
    Red,
    Yellow,
    Green,
}

impl Default for Light {
    fn default() -> Light {
        Light::Red
    }
}

/// Per-movement bookkeeping: spec §3 LaneState, flattened to a map keyed by
/// MovementKey rather than a nested lane->movement structure, since every
/// consumer (chooser, flow model, orchestrator) addresses a single movement
/// at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub normal: u32,
    pub emergency: u32,
    pub wait: u32,
    pub light: Light,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueueState {
    counts: HashMap<MovementKey, Counts>,
}

impl QueueState {
    pub fn new() -> QueueState {
        QueueState {
            counts: HashMap::new(),
        }
    }

    /// Idempotent insertion of a fresh (all-zero, RED) entry.
    pub fn ensure(&mut self, key: &MovementKey) {
        self.counts.entry(key.clone()).or_insert_with(Counts::default);
    }

    pub fn get(&self, key: &MovementKey) -> Counts {
        self.counts.get(key).copied().unwrap_or_default()
    }

    pub fn set_normal(&mut self, key: &MovementKey, normal: u32) {
        self.counts.entry(key.clone()).or_default().normal = normal;
    }

    pub fn set_emergency(&mut self, key: &MovementKey, emergency: u32) {
        self.counts.entry(key.clone()).or_default().emergency = emergency;
    }

    pub fn set_wait(&mut self, key: &MovementKey, wait: u32) {
        self.counts.entry(key.clone()).or_default().wait = wait;
    }

    pub fn set_light(&mut self, key: &MovementKey, light: Light) {
        self.counts.entry(key.clone()).or_default().light = light;
    }

    /// Sum of `normal + emergency` across every movement of `lane` — the
    /// quantity the blocking test (I5) and the ambulance planner's
    /// `Q_dest` both need.
    pub fn lane_total(&self, lane: &str) -> u32 {
        Movement::ALL
            .into_iter()
            .map(|m| {
                let c = self.get(&MovementKey::new(lane, m));
                c.normal + c.emergency
            })
            .sum()
    }

    pub fn set_all_red(&mut self, keys: &[MovementKey]) {
        for key in keys {
            self.set_light(key, Light::Red);
        }
    }

    pub fn set_green(&mut self, keys: &[MovementKey]) {
        for key in keys {
            self.set_light(key, Light::Green);
        }
    }

    /// Spec invariant I6 / testable property P8: reset wait for granted
    /// movements, increment it for everything else.
    pub fn update_waits(&mut self, all_keys: &[MovementKey], granted: &HashSet<MovementKey>) {
        for key in all_keys {
            if granted.contains(key) {
                self.set_wait(key, 0);
            } else {
                let w = self.get(key).wait;
                self.set_wait(key, w + 1);
            }
        }
    }
}
