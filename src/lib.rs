//! A dynamic traffic-signal controller for a single multi-lane intersection.
//!
//! The core is synchronous and single-threaded: `Controller::update` is the
//! only mutating entry point, driven by a caller-supplied sensor snapshot and
//! an injected clock. See the crate's design notes for the conflict graph,
//! ambulance pre-clearance scheduler, and fairness-weighted chooser that
//! together decide which movements get GREEN each cycle.

pub mod ambulance;
pub mod chooser;
pub mod config;
pub mod controller;
pub mod error;
pub mod flow;
pub mod green_time;
pub mod logging;
pub mod movement;
pub mod phase;
pub mod queue_state;
pub mod topology;

pub use ambulance::{Ambulance, AmbulanceRegistry, PlannedJob};
pub use config::Config;
pub use controller::{Controller, LightTable, SnapshotEntry};
pub use error::ConfigError;
pub use movement::{LaneId, Movement, MovementKey};
pub use phase::{Phase, PhaseKind};
pub use queue_state::{Counts, Light, QueueState};
pub use topology::Topology;
