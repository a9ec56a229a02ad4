//! Infinite lines in general form `a·x + b·y = c`
//!
//! Coefficients are kept as `Decimal` so that the slope and intercept of a
//! line through two points are derived without cancellation error. They are
//! converted to `f64` only when a system is solved or a distance measured.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use super::Point;
use crate::error::GeometryError;

/// Determinants smaller than this (relative to the coefficient products) are
/// treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// A 2D line `a·x + b·y = c` with `(a, b) != (0, 0)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    a: Decimal,
    b: Decimal,
    c: Decimal,
}

impl Line {
    /// Line from explicit general-form coefficients
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self, GeometryError> {
        let (a, b, c) = (to_decimal(a)?, to_decimal(b)?, to_decimal(c)?);
        if a.is_zero() && b.is_zero() {
            return Err(GeometryError::DegenerateLine);
        }
        Ok(Self { a, b, c })
    }

    /// Line `y = m·x + c`
    pub fn from_slope_intercept(slope: f64, intercept: f64) -> Result<Self, GeometryError> {
        Ok(Self::slope_intercept(to_decimal(slope)?, to_decimal(intercept)?))
    }

    /// Line through two points
    ///
    /// Equal x coordinates give the vertical line `x = p1.x`; identical points
    /// therefore also produce a vertical line rather than an error.
    pub fn through(p1: Point, p2: Point) -> Result<Self, GeometryError> {
        let (x1, y1) = (to_decimal(p1.x)?, to_decimal(p1.y)?);
        let (x2, y2) = (to_decimal(p2.x)?, to_decimal(p2.y)?);

        if x1 == x2 {
            return Ok(Self {
                a: Decimal::ONE,
                b: Decimal::ZERO,
                c: x1,
            });
        }

        let rise = y1.checked_sub(y2).ok_or(GeometryError::Overflow)?;
        let run = x1.checked_sub(x2).ok_or(GeometryError::Overflow)?;
        let slope = rise.checked_div(run).ok_or(GeometryError::Overflow)?;
        let intercept = slope
            .checked_mul(x1)
            .and_then(|mx| y1.checked_sub(mx))
            .ok_or(GeometryError::Overflow)?;

        Ok(Self::slope_intercept(slope, intercept))
    }

    fn slope_intercept(slope: Decimal, intercept: Decimal) -> Self {
        Self {
            a: slope,
            b: Decimal::NEGATIVE_ONE,
            c: -intercept,
        }
    }

    /// Coefficients `(a, b, c)` as floats
    pub fn coefficients(&self) -> (f64, f64, f64) {
        (to_f64(self.a), to_f64(self.b), to_f64(self.c))
    }

    /// True when the line is parallel to the y axis
    pub fn is_vertical(&self) -> bool {
        self.b.is_zero()
    }

    /// y for a given x, `None` for vertical lines
    pub fn y_at(&self, x: f64) -> Option<f64> {
        let (a, b, c) = self.coefficients();
        (!self.b.is_zero()).then(|| (c - a * x) / b)
    }

    /// x for a given y, `None` for horizontal lines
    pub fn x_at(&self, y: f64) -> Option<f64> {
        let (a, b, c) = self.coefficients();
        (!self.a.is_zero()).then(|| (c - b * y) / a)
    }

    /// Unique intersection point with another line
    ///
    /// Parallel and coincident lines have no unique solution and yield `None`.
    pub fn intersection(&self, other: &Line) -> Option<Point> {
        let (a1, b1, c1) = self.coefficients();
        let (a2, b2, c2) = other.coefficients();

        let det = a1 * b2 - a2 * b1;
        let scale = (a1 * b2).abs() + (a2 * b1).abs();
        if det == 0.0 || det.abs() <= SINGULAR_EPS * scale {
            return None;
        }

        let x = (c1 * b2 - c2 * b1) / det;
        let y = (a1 * c2 - a2 * c1) / det;
        (x.is_finite() && y.is_finite()).then(|| Point::new(x, y))
    }

    /// Perpendicular distance from a point
    pub fn distance_to(&self, p: Point) -> f64 {
        let (a, b, c) = self.coefficients();
        (a * p.x + b * p.y - c).abs() / a.hypot(b)
    }

    /// Residual `a·x + b·y - c` at a point (zero on the line)
    pub fn residual(&self, p: Point) -> f64 {
        let (a, b, c) = self.coefficients();
        a * p.x + b * p.y - c
    }
}

fn to_decimal(value: f64) -> Result<Decimal, GeometryError> {
    if !value.is_finite() {
        return Err(GeometryError::NotRepresentable(value));
    }
    Decimal::from_f64(value).ok_or(GeometryError::NotRepresentable(value))
}

#[inline]
fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
