use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three turn movements a lane can offer at the intersection.
///
/// `ALL` fixes the iteration order used everywhere a tie has to be broken
/// deterministically: straight, then left, then right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    Straight,
    Left,
    Right,
}

impl Movement {
    pub const ALL: [Movement; 3] = [Movement::Straight, Movement::Left, Movement::Right];

    /// The wire/config name used in snapshots, e.g. `"straight"`.
    pub fn wire_name(self) -> &'static str {
        match self {
            Movement::Straight => "straight",
            Movement::Left => "left",
            Movement::Right => "right",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Movement> {
        Movement::ALL.into_iter().find(|m| m.wire_name() == name)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

pub type LaneId = String;

/// A (lane, movement) pair — the unit the chooser and flow model operate on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementKey {
    pub lane: LaneId,
    pub movement: Movement,
}

impl MovementKey {
    pub fn new(lane: impl Into<LaneId>, movement: Movement) -> MovementKey {
        MovementKey {
            lane: lane.into(),
            movement,
        }
    }
}

impl fmt::Display for MovementKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.lane, self.movement)
    }
}
