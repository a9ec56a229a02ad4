//! Run state and core simulation types
//!
//! Everything needed to replay or export a run lives here.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::car::{Car, Pose};
use super::radar::Radar;
use crate::error::{Error, FuzzyError, Result};
use crate::fuzzy::FuzzySystem;
use crate::geometry::Point;
use crate::track::Track;

/// Number of crisp inputs the steering controller takes: front distance and
/// left minus right distance.
pub const CONTROLLER_INPUTS: usize = 2;

/// Why a run ended on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Reached the goal area
    Goal,
    /// Touched a wall
    Collision,
    /// A radar beam found no wall
    SensorError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Goal => "goal",
            Outcome::Collision => "collision",
            Outcome::SensorError => "sensor_error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Built, not started
    #[default]
    Idle,
    Running,
    Finished(Outcome),
    /// Stopped from outside, or by the step cap
    Aborted,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Finished(_) | RunPhase::Aborted)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            RunPhase::Finished(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => f.write_str("idle"),
            RunPhase::Running => f.write_str("running"),
            RunPhase::Finished(outcome) => write!(f, "finished ({outcome})"),
            RunPhase::Aborted => f.write_str("aborted"),
        }
    }
}

/// Axis-aligned goal rectangle, boundary included
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalArea {
    min: Point,
    max: Point,
}

impl GoalArea {
    /// Any two opposite corners, in any order
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    pub fn contains(&self, p: Point) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// State at one controlled step: where the car was, what it saw, what it chose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub front: f64,
    pub right: f64,
    pub left: f64,
    pub wheel_angle: f64,
}

impl StepRecord {
    /// `[front, right, left, wheel]`
    pub fn as_4d(&self) -> [f64; 4] {
        [self.front, self.right, self.left, self.wheel_angle]
    }

    /// `[x, y, front, right, left, wheel]`
    pub fn as_6d(&self) -> [f64; 6] {
        [
            self.x,
            self.y,
            self.front,
            self.right,
            self.left,
            self.wheel_angle,
        ]
    }
}

/// Append-only sequence of step records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrajectoryLog {
    records: Vec<StepRecord>,
}

impl TrajectoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a TrajectoryLog {
    type Item = &'a StepRecord;
    type IntoIter = std::slice::Iter<'a, StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Final report of a run, possibly partial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub phase: RunPhase,
    /// Ticks executed, including the terminal one
    pub ticks: u64,
    pub final_pose: Pose,
    pub log: TrajectoryLog,
}

impl RunResult {
    pub fn outcome(&self) -> Option<Outcome> {
        self.phase.outcome()
    }

    pub fn reached_goal(&self) -> bool {
        self.outcome() == Some(Outcome::Goal)
    }
}

/// One car under fuzzy control on one track
#[derive(Debug, Clone)]
pub struct Simulation {
    pub car: Car,
    /// Shared, read-only controller
    pub system: Arc<FuzzySystem>,
    pub goal: GoalArea,
    pub phase: RunPhase,
    /// Ticks executed so far
    pub time_ticks: u64,
    pub log: TrajectoryLog,
    /// Readings from the latest tick
    pub last_radar: Option<Radar>,
}

impl Simulation {
    /// Pair a car with a controller
    ///
    /// The controller must take exactly two inputs and have at least one rule.
    pub fn new(car: Car, system: Arc<FuzzySystem>, goal: GoalArea) -> Result<Self> {
        if system.antecedent_count() != CONTROLLER_INPUTS {
            return Err(FuzzyError::arity(CONTROLLER_INPUTS, system.antecedent_count()).into());
        }
        if system.rule_count() == 0 {
            return Err(Error::Fuzzy(FuzzyError::EmptyRuleBase));
        }
        Ok(Self {
            car,
            system,
            goal,
            phase: RunPhase::Idle,
            time_ticks: 0,
            log: TrajectoryLog::new(),
            last_radar: None,
        })
    }

    /// Place a fresh car at the track's start pose
    pub fn from_track(track: &Track, radius: f64, system: Arc<FuzzySystem>) -> Result<Self> {
        let car = Car::new(track.start, track.heading, radius, &track.walls)?;
        Self::new(car, system, track.goal)
    }

    /// Idle → Running; no effect in any other phase
    pub fn start(&mut self) {
        if self.phase == RunPhase::Idle {
            self.phase = RunPhase::Running;
        }
    }

    /// Running → Aborted; terminal phases are kept
    pub fn abort(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = RunPhase::Aborted;
        }
    }

    /// Snapshot of the run so far
    pub fn result(&self) -> RunResult {
        RunResult {
            phase: self.phase,
            ticks: self.time_ticks,
            final_pose: self.car.pose(),
            log: self.log.clone(),
        }
    }
}
