//! Fixed logical step of the control loop
//!
//! One tick senses, checks for the end of the run, asks the controller for a
//! wheel angle, records the step and moves the car. Nothing here sleeps or
//! reads the clock.

use super::car::Pose;
use super::radar::Radar;
use super::state::{Outcome, RunPhase, Simulation, StepRecord};
use crate::error::FuzzyError;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The car was steered and moved; the run goes on
    Moved {
        /// Pose the readings were taken at
        sensed: Pose,
        radar: Radar,
        record: StepRecord,
    },
    /// The run ended on this tick; the car did not move
    Finished {
        sensed: Pose,
        radar: Radar,
        outcome: Outcome,
    },
    /// The simulation was not running, nothing happened
    Halted(RunPhase),
}

impl TickOutcome {
    pub fn radar(&self) -> Option<&Radar> {
        match self {
            TickOutcome::Moved { radar, .. } | TickOutcome::Finished { radar, .. } => Some(radar),
            TickOutcome::Halted(_) => None,
        }
    }
}

/// Advance the simulation by one step
///
/// Termination is checked in this order: goal, collision, missing radar
/// reading. Fails only if the controller rejects its inputs, which
/// [`Simulation::new`] already rules out.
pub fn tick(sim: &mut Simulation) -> Result<TickOutcome, FuzzyError> {
    if sim.phase != RunPhase::Running {
        return Ok(TickOutcome::Halted(sim.phase));
    }

    sim.time_ticks += 1;
    let sensed = sim.car.pose();
    let radar = sim.car.sense_all();
    sim.last_radar = Some(radar);

    let finish = |sim: &mut Simulation, outcome: Outcome| {
        sim.phase = RunPhase::Finished(outcome);
        TickOutcome::Finished {
            sensed,
            radar,
            outcome,
        }
    };

    if sim.goal.contains(sensed.position) {
        return Ok(finish(sim, Outcome::Goal));
    }
    if sim.car.is_collided() {
        return Ok(finish(sim, Outcome::Collision));
    }
    let Some((front, left, right)) = radar.distances() else {
        return Ok(finish(sim, Outcome::SensorError));
    };

    let wheel_angle = sim.system.singleton_result(&[front, left - right])?;
    let record = StepRecord {
        x: sensed.position.x,
        y: sensed.position.y,
        heading: sensed.heading,
        front,
        right,
        left,
        wheel_angle,
    };
    sim.log.push(record);
    sim.car.move_step(wheel_angle);

    log::trace!(
        "tick {}: front {front:.3} left {left:.3} right {right:.3} -> wheel {wheel_angle:.3}",
        sim.time_ticks
    );

    Ok(TickOutcome::Moved {
        sensed,
        radar,
        record,
    })
}
