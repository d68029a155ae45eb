use std::{error, fmt};

/// The one thing that can go wrong at the config boundary: a tunable out of
/// its sane range. Mirrors `abstutil::Error`'s shape (message + manual
/// Display/Debug/Error impls) shrunk to this crate's single failure mode.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> ConfigError {
        ConfigError {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.message)
    }
}

impl error::Error for ConfigError {}
