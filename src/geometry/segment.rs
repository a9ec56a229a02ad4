//! Bounded line segments

use super::{Line, Point};
use crate::error::GeometryError;

/// Relative slack on bounding-box tests so rounding on axis-aligned segments
/// does not drop hits that lie exactly on them.
const BOUNDS_EPS: f64 = 1e-9;

/// Anything that can take part in a line/segment intersection query
pub trait Linear {
    /// The underlying infinite line
    fn line(&self) -> &Line;

    /// Whether an intersection point on the line is inside this shape's extent
    fn admits(&self, p: Point) -> bool;
}

impl Linear for Line {
    fn line(&self) -> &Line {
        self
    }

    fn admits(&self, _p: Point) -> bool {
        true
    }
}

/// A line restricted to the bounding box of its two endpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    line: Line,
    start: Point,
    end: Point,
    min: Point,
    max: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Result<Self, GeometryError> {
        Ok(Self {
            line: Line::through(start, end)?,
            start,
            end,
            min: start.min(end),
            max: start.max(end),
        })
    }

    #[inline]
    pub fn start(&self) -> Point {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Point {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Inclusive bounding-box test
    pub fn in_bounds(&self, p: Point) -> bool {
        let tol = BOUNDS_EPS * (1.0 + self.min.abs().max(self.max.abs()).max_element());
        p.x >= self.min.x - tol
            && p.x <= self.max.x + tol
            && p.y >= self.min.y - tol
            && p.y <= self.max.y + tol
    }

    /// Intersection with a line or another segment
    ///
    /// The point must fall inside this segment's bounding box and, when
    /// `other` is a segment, inside its box too.
    pub fn intersection<L: Linear>(&self, other: &L) -> Option<Point> {
        self.line
            .intersection(other.line())
            .filter(|&p| self.in_bounds(p) && other.admits(p))
    }

    /// Distance from a point using the clamped projection onto the segment
    pub fn distance_to(&self, p: Point) -> f64 {
        p.distance(self.closest_point(p))
    }

    /// Closest point on the segment
    pub fn closest_point(&self, p: Point) -> Point {
        let dir = self.end - self.start;
        let len_sq = dir.length_squared();
        if len_sq == 0.0 {
            return self.start;
        }
        let t = ((p - self.start).dot(dir) / len_sq).clamp(0.0, 1.0);
        self.start + dir * t
    }
}

impl Linear for Segment {
    fn line(&self) -> &Line {
        &self.line
    }

    fn admits(&self, p: Point) -> bool {
        self.in_bounds(p)
    }
}

/// Consecutive segments of a polyline
pub fn polyline(points: &[Point]) -> Result<Vec<Segment>, GeometryError> {
    points
        .windows(2)
        .map(|pair| Segment::new(pair[0], pair[1]))
        .collect()
}
