//! Plane geometry for radar rays and wall collision
//!
//! Lines carry exact decimal coefficients; segments add a bounding box.
//! Parallel or coincident lines are a normal occurrence in a corridor and are
//! reported as "no intersection", never as an error.

pub mod line;
pub mod segment;

pub use line::Line;
pub use segment::{Linear, Segment, polyline};

/// A point in the plane
pub type Point = glam::DVec2;
