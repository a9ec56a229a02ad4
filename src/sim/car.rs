//! Car kinematics, radar and collision

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::radar::{Radar, RadarDirection, RadarReading};
use crate::consts::MAX_WHEEL_ANGLE;
use crate::error::{Error, Result};
use crate::geometry::{Line, Point, Segment, polyline};
use crate::normalize_degrees;

/// Direction components smaller than this are snapped to zero so that a beam
/// at 90° or 270° is built as an exactly vertical line.
const AXIS_SNAP: f64 = 1e-12;

/// Position, heading and wheel angle at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    /// Degrees in [0, 360)
    pub heading: f64,
    /// Degrees in [-40, 40]
    pub wheel_angle: f64,
}

/// A round car driving between polyline walls
#[derive(Debug, Clone)]
pub struct Car {
    position: Point,
    heading: f64,
    wheel_angle: f64,
    radius: f64,
    walls: Arc<[Segment]>,
}

impl Car {
    /// Build a car from its start pose and the wall polyline
    pub fn new(position: Point, heading: f64, radius: f64, wall_points: &[Point]) -> Result<Self> {
        let walls: Arc<[Segment]> = polyline(wall_points)?.into();
        Self::with_walls(position, heading, radius, walls)
    }

    /// Build a car over walls that are already segmented (and possibly shared)
    pub fn with_walls(
        position: Point,
        heading: f64,
        radius: f64,
        walls: Arc<[Segment]>,
    ) -> Result<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(Error::InvalidRadius(radius));
        }
        Ok(Self {
            position,
            heading: normalize_degrees(heading),
            wheel_angle: 0.0,
            radius,
            walls,
        })
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    #[inline]
    pub fn heading(&self) -> f64 {
        self.heading
    }

    #[inline]
    pub fn wheel_angle(&self) -> f64 {
        self.wheel_angle
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn walls(&self) -> &[Segment] {
        &self.walls
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            heading: self.heading,
            wheel_angle: self.wheel_angle,
        }
    }

    /// Advance one unit step with the given wheel angle (degrees)
    ///
    /// The angle is clamped to ±40° and kept as the current wheel angle.
    pub fn move_step(&mut self, wheel_angle: f64) {
        self.wheel_angle = wheel_angle.clamp(-MAX_WHEEL_ANGLE, MAX_WHEEL_ANGLE);
        let phi = self.wheel_angle.to_radians();
        let theta = self.heading.to_radians();

        self.position.x += (theta + phi).cos() + phi.sin() * theta.sin();
        self.position.y += (theta + phi).sin() - phi.sin() * theta.cos();

        let turn = (phi.sin() / self.radius).clamp(-1.0, 1.0).asin().to_degrees();
        self.heading = normalize_degrees(self.heading - turn);
    }

    /// Nearest wall hit along one radar beam
    pub fn sense(&self, direction: RadarDirection) -> RadarReading {
        let degree = normalize_degrees(self.heading + direction.offset());
        let Some(beam) = self.beam(degree) else {
            return RadarReading::NoReading;
        };

        let pos = self.position;
        self.walls
            .iter()
            .filter_map(|wall| wall.intersection(&beam))
            .filter(|hit| ahead(degree, pos, *hit))
            .map(|point| (point, pos.distance(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(RadarReading::NoReading, |(point, distance)| {
                RadarReading::Hit { point, distance }
            })
    }

    pub fn sense_all(&self) -> Radar {
        Radar {
            front: self.sense(RadarDirection::Front),
            left: self.sense(RadarDirection::Left),
            right: self.sense(RadarDirection::Right),
        }
    }

    /// True when any wall is within the car radius (touching counts)
    pub fn is_collided(&self) -> bool {
        self.walls
            .iter()
            .any(|wall| wall.distance_to(self.position) <= self.radius)
    }

    /// Distance to the closest wall, `None` without walls
    pub fn clearance(&self) -> Option<f64> {
        self.walls
            .iter()
            .map(|wall| wall.distance_to(self.position))
            .min_by(f64::total_cmp)
    }

    fn beam(&self, degree: f64) -> Option<Line> {
        let rad = degree.to_radians();
        let snap = |v: f64| if v.abs() < AXIS_SNAP { 0.0 } else { v };
        let dir = Point::new(snap(rad.cos()), snap(rad.sin()));
        match Line::through(self.position, self.position + dir) {
            Ok(line) => Some(line),
            Err(err) => {
                log::debug!("radar beam at {degree:.1}° unavailable: {err}");
                None
            }
        }
    }
}

/// Whether a hit lies on the forward side of a beam at `degree`
fn ahead(degree: f64, pos: Point, hit: Point) -> bool {
    (0.0 < degree && degree < 180.0 && hit.y > pos.y)
        || (180.0 < degree && degree < 360.0 && hit.y < pos.y)
        || (((0.0..90.0).contains(&degree) || (270.0 < degree && degree < 360.0)) && hit.x > pos.x)
        || (90.0 < degree && degree < 270.0 && hit.x < pos.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    /// Car at the origin facing +x with a short wall 10 units ahead
    fn facing_wall() -> Car {
        Car::new(Point::ZERO, 0.0, 3.0, &pts(&[(10.0, -5.0), (10.0, 5.0)])).unwrap()
    }

    /// Straight corridor along +y, 6 units either side, closed at y = 50
    fn corridor(position: Point, heading: f64) -> Car {
        let walls = pts(&[(-6.0, -10.0), (-6.0, 50.0), (6.0, 50.0), (6.0, -10.0)]);
        Car::new(position, heading, 3.0, &walls).unwrap()
    }

    #[test]
    fn test_front_wall_distance() {
        let car = facing_wall();
        let front = car.sense(RadarDirection::Front);
        assert_relative_eq!(front.distance().unwrap(), 10.0, epsilon = 1e-9);
        let point = front.point().unwrap();
        assert_relative_eq!(point.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(point.y, 0.0, epsilon = 1e-9);

        // the diagonal beams pass the wall ends at y = ±10
        assert_eq!(car.sense(RadarDirection::Left), RadarReading::NoReading);
        assert_eq!(car.sense(RadarDirection::Right), RadarReading::NoReading);
    }

    #[test]
    fn test_wall_behind_is_ignored() {
        let car = Car::new(Point::ZERO, 180.0, 3.0, &pts(&[(10.0, -5.0), (10.0, 5.0)])).unwrap();
        assert_eq!(car.sense(RadarDirection::Front), RadarReading::NoReading);
    }

    #[test]
    fn test_corridor_readings() {
        let car = corridor(Point::new(0.0, 0.0), 90.0);
        let radar = car.sense_all();
        assert_relative_eq!(radar.front.distance().unwrap(), 50.0, epsilon = 1e-9);
        let diag = 6.0 * std::f64::consts::SQRT_2;
        assert_relative_eq!(radar.left.distance().unwrap(), diag, epsilon = 1e-9);
        assert_relative_eq!(radar.right.distance().unwrap(), diag, epsilon = 1e-9);
        // left beam at 135° hits the x = -6 wall
        assert_relative_eq!(radar.left.point().unwrap().x, -6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nearest_hit_wins() {
        let walls = pts(&[(20.0, -5.0), (20.0, 5.0), (8.0, 5.0), (8.0, -5.0)]);
        let car = Car::new(Point::ZERO, 0.0, 1.0, &walls).unwrap();
        assert_relative_eq!(
            car.sense(RadarDirection::Front).distance().unwrap(),
            8.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_straight_move() {
        let mut car = corridor(Point::new(0.0, 0.0), 90.0);
        car.move_step(0.0);
        assert_relative_eq!(car.heading(), 90.0);
        assert_relative_eq!(car.position().x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(car.position().y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wheel_clamped_and_turns_clockwise() {
        let mut car = corridor(Point::ZERO, 90.0);
        car.move_step(75.0);
        assert_eq!(car.wheel_angle(), 40.0);
        let expected = 90.0 - (40.0_f64.to_radians().sin() / 3.0).asin().to_degrees();
        assert_relative_eq!(car.heading(), expected, epsilon = 1e-9);

        car.move_step(-75.0);
        assert_eq!(car.wheel_angle(), -40.0);
    }

    #[test]
    fn test_heading_wraps() {
        let mut car = Car::new(Point::ZERO, -30.0, 3.0, &[]).unwrap();
        assert_relative_eq!(car.heading(), 330.0);
        car = Car::new(Point::ZERO, 0.0, 3.0, &[]).unwrap();
        car.move_step(30.0);
        assert!(car.heading() > 350.0 && car.heading() < 360.0);
    }

    #[test]
    fn test_collision_boundary_inclusive() {
        let walls = pts(&[(3.0, -5.0), (3.0, 5.0)]);
        let touching = Car::new(Point::ZERO, 0.0, 3.0, &walls).unwrap();
        assert!(touching.is_collided());
        let clear = Car::new(Point::new(-0.001, 0.0), 0.0, 3.0, &walls).unwrap();
        assert!(!clear.is_collided());
    }

    #[test]
    fn test_collision_uses_segment_not_line() {
        // the infinite line x = 1 is close, but the segment ends far above
        let walls = pts(&[(1.0, 20.0), (1.0, 30.0)]);
        let car = Car::new(Point::ZERO, 0.0, 3.0, &walls).unwrap();
        assert!(!car.is_collided());
        assert_relative_eq!(car.clearance().unwrap(), 401.0_f64.sqrt());
    }

    #[test]
    fn test_sensing_is_idempotent() {
        let car = corridor(Point::new(1.5, 3.0), 80.0);
        let first = (car.sense_all(), car.is_collided());
        for _ in 0..3 {
            assert_eq!((car.sense_all(), car.is_collided()), first);
        }
    }

    #[test]
    fn test_invalid_radius() {
        assert!(matches!(
            Car::new(Point::ZERO, 0.0, 0.0, &[]),
            Err(Error::InvalidRadius(_))
        ));
        assert!(Car::new(Point::ZERO, 0.0, f64::NAN, &[]).is_err());
    }

    proptest! {
        #[test]
        fn zero_wheel_moves_one_unit_along_heading(
            x in -100.0_f64..100.0,
            y in -100.0_f64..100.0,
            heading in 0.0_f64..360.0,
        ) {
            let mut car = Car::new(Point::new(x, y), heading, 3.0, &[]).unwrap();
            car.move_step(0.0);
            let step = car.position() - Point::new(x, y);
            prop_assert!((step.length() - 1.0).abs() < 1e-9);
            let rad = heading.to_radians();
            prop_assert!((step.x - rad.cos()).abs() < 1e-9);
            prop_assert!((step.y - rad.sin()).abs() < 1e-9);
            prop_assert!((car.heading() - normalize_degrees(heading)).abs() < 1e-9);
        }

        #[test]
        fn collided_iff_within_radius(x in -10.0_f64..10.0, y in -10.0_f64..10.0) {
            let walls = pts(&[(-5.0, -5.0), (5.0, -5.0), (5.0, 5.0)]);
            let car = Car::new(Point::new(x, y), 0.0, 3.0, &walls).unwrap();
            let min = car.clearance().unwrap();
            prop_assert_eq!(car.is_collided(), min <= 3.0);
        }

        #[test]
        fn hits_are_never_behind(heading in 0.0_f64..360.0) {
            let car = corridor(Point::new(0.0, 10.0), heading);
            for (direction, reading) in car.sense_all().iter() {
                if let Some(point) = reading.point() {
                    let degree = normalize_degrees(heading + direction.offset()).to_radians();
                    let forward = Point::new(degree.cos(), degree.sin());
                    prop_assert!((point - car.position()).dot(forward) > -1e-9);
                }
            }
        }
    }
}
