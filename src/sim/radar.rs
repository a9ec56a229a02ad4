//! Radar directions and readings

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// One of the three fixed radar beams, relative to the car heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadarDirection {
    Front,
    Left,
    Right,
}

impl RadarDirection {
    pub const ALL: [RadarDirection; 3] = [
        RadarDirection::Front,
        RadarDirection::Left,
        RadarDirection::Right,
    ];

    /// Offset from the heading in degrees (counter-clockwise positive)
    pub fn offset(&self) -> f64 {
        match self {
            RadarDirection::Front => 0.0,
            RadarDirection::Left => 45.0,
            RadarDirection::Right => -45.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RadarDirection::Front => "front",
            RadarDirection::Left => "left",
            RadarDirection::Right => "right",
        }
    }
}

impl fmt::Display for RadarDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one radar query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RadarReading {
    /// Nearest wall hit in front of the beam
    Hit { point: Point, distance: f64 },
    /// No wall crosses the beam on the forward side
    NoReading,
}

impl RadarReading {
    pub fn distance(&self) -> Option<f64> {
        match self {
            RadarReading::Hit { distance, .. } => Some(*distance),
            RadarReading::NoReading => None,
        }
    }

    pub fn point(&self) -> Option<Point> {
        match self {
            RadarReading::Hit { point, .. } => Some(*point),
            RadarReading::NoReading => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, RadarReading::Hit { .. })
    }
}

impl fmt::Display for RadarReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadarReading::Hit { distance, .. } => write!(f, "{distance:.3}"),
            RadarReading::NoReading => f.write_str("--"),
        }
    }
}

/// All three readings taken at the same pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Radar {
    pub front: RadarReading,
    pub left: RadarReading,
    pub right: RadarReading,
}

impl Radar {
    pub fn get(&self, direction: RadarDirection) -> RadarReading {
        match direction {
            RadarDirection::Front => self.front,
            RadarDirection::Left => self.left,
            RadarDirection::Right => self.right,
        }
    }

    /// `(front, left, right)` distances, `None` if any beam has no reading
    pub fn distances(&self) -> Option<(f64, f64, f64)> {
        Some((
            self.front.distance()?,
            self.left.distance()?,
            self.right.distance()?,
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = (RadarDirection, RadarReading)> + '_ {
        RadarDirection::ALL.into_iter().map(|d| (d, self.get(d)))
    }
}

impl fmt::Display for Radar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "front {} / left {} / right {}",
            self.front, self.left, self.right
        )
    }
}
