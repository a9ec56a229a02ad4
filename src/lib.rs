//! Fuzzy Car - a corridor-driving car steered by a fuzzy controller
//!
//! Core modules:
//! - `geometry`: Lines and segments for radar beams and wall distances
//! - `fuzzy`: Fuzzy sets, operator families, rule base and inference
//! - `sim`: Car model, deterministic tick and the paced run loop
//! - `track`: Scenario files
//! - `settings`: Controller and loop configuration
//! - `export`: Training-set and JSON output

pub mod error;
pub mod export;
pub mod fuzzy;
pub mod geometry;
pub mod settings;
pub mod sim;
pub mod track;

pub use error::{Error, Result};
pub use settings::Settings;
pub use track::Track;

/// Simulation constants
pub mod consts {
    /// Wheel angle limit in degrees, both directions
    pub const MAX_WHEEL_ANGLE: f64 = 40.0;

    /// Car defaults
    pub const DEFAULT_CAR_RADIUS: f64 = 3.0;

    /// Loop pacing (ticks per second)
    pub const DEFAULT_FPS: f64 = 20.0;
    /// Safety cap so a car circling forever still ends its run
    pub const DEFAULT_MAX_STEPS: u64 = 10_000;
}

/// Angle in degrees normalized to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // tiny negative inputs round up to exactly 360
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
