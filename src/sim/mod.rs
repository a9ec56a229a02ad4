//! Deterministic simulation module
//!
//! Car kinematics, radar and the control loop. The step function is pure
//! logic:
//! - Fixed logical step, no wall-clock integration
//! - No randomness
//! - Pacing, cancellation and observers live in `runner` only

pub mod car;
pub mod radar;
pub mod runner;
pub mod state;
pub mod tick;

pub use car::{Car, Pose};
pub use radar::{Radar, RadarDirection, RadarReading};
pub use runner::{RunHandle, Runner, SimEvent, StopToken};
pub use state::{
    CONTROLLER_INPUTS, GoalArea, Outcome, RunPhase, RunResult, Simulation, StepRecord,
    TrajectoryLog,
};
pub use tick::{TickOutcome, tick};
