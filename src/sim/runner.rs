//! Paced run loop with cancellation and event fan-out
//!
//! The runner owns one [`Simulation`] and drives it tick by tick. Observers
//! receive [`SimEvent`]s over channels and never see the simulation itself.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::radar::Radar;
use super::state::{Outcome, RunResult, Simulation};
use super::tick::{TickOutcome, tick};
use crate::consts::{DEFAULT_FPS, DEFAULT_MAX_STEPS};
use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::settings::Settings;

/// Cooperative cancellation flag shared between a runner and its controllers
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop at the next tick boundary
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Update pushed to observers
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Pose at the start of a tick
    Car {
        position: Point,
        heading: f64,
        wheel_angle: f64,
    },
    /// Radar readings taken at `position`
    Radar { position: Point, readings: Radar },
    /// Human-readable status line
    Console(String),
    Collided,
    GoalReached,
    /// Last event of every run
    Finished(RunResult),
}

/// Drives a simulation at a fixed cadence until it ends or is stopped
pub struct Runner {
    sim: Simulation,
    tick_interval: Duration,
    max_steps: Option<u64>,
    stop: StopToken,
    observers: Vec<Sender<SimEvent>>,
    finished: bool,
}

impl Runner {
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim,
            tick_interval: Duration::from_secs_f64(1.0 / DEFAULT_FPS),
            max_steps: Some(DEFAULT_MAX_STEPS),
            stop: StopToken::new(),
            observers: Vec::new(),
            finished: false,
        }
    }

    /// Pacing and step cap taken from settings
    pub fn from_settings(sim: Simulation, settings: &Settings) -> Self {
        Self::new(sim)
            .with_tick_interval(settings.tick_interval())
            .with_max_steps(settings.max_steps)
    }

    /// Pause between ticks; zero runs headless
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// New observer channel; events sent after this call are delivered
    pub fn subscribe(&mut self) -> Receiver<SimEvent> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Run to completion in the calling thread
    ///
    /// `SimEvent::Finished` is sent exactly once, whichever way the run ends.
    pub fn run(mut self) -> Result<RunResult> {
        self.run_to_end()
    }

    /// Run on a worker thread
    ///
    /// A panic inside the loop still aborts the simulation and sends
    /// `Finished`; the handle then reports [`Error::WorkerPanicked`].
    pub fn spawn(self) -> RunHandle {
        let stop = self.stop_token();
        let thread = thread::spawn(move || self.run_guarded(Self::run_to_end));
        RunHandle { stop, thread }
    }

    fn run_guarded(
        mut self,
        body: impl FnOnce(&mut Self) -> Result<RunResult>,
    ) -> Result<RunResult> {
        match panic::catch_unwind(AssertUnwindSafe(|| body(&mut self))) {
            Ok(result) => result,
            Err(_) => {
                log::error!("Run panicked at tick {}", self.sim.time_ticks);
                self.sim.abort();
                if !self.finished {
                    self.emit(SimEvent::Console("Error: simulation thread panicked.".into()));
                    self.finish();
                }
                Err(Error::WorkerPanicked)
            }
        }
    }

    fn run_to_end(&mut self) -> Result<RunResult> {
        self.sim.start();
        let start = self.sim.car.pose();
        log::info!(
            "Run started at ({:.2}, {:.2}) heading {:.1}°",
            start.position.x,
            start.position.y,
            start.heading
        );

        let failure = self.drive();
        if let Err(err) = &failure {
            log::error!("Run failed: {err}");
            self.sim.abort();
            self.emit(SimEvent::Console(format!("Error: controller failed: {err}")));
        }

        let result = self.finish();
        failure.map(|()| result)
    }

    /// Send the final result; only the first call emits
    fn finish(&mut self) -> RunResult {
        let result = self.sim.result();
        if !self.finished {
            log::info!(
                "Run {} after {} ticks ({} records)",
                result.phase,
                result.ticks,
                result.log.len()
            );
            self.finished = true;
            self.emit(SimEvent::Finished(result.clone()));
        }
        result
    }

    fn drive(&mut self) -> Result<()> {
        loop {
            if self.stop.is_stopped() {
                self.interrupt("WARNING: run interrupted by user.");
                return Ok(());
            }
            if self
                .max_steps
                .is_some_and(|max| self.sim.time_ticks >= max)
            {
                self.interrupt("WARNING: step limit reached, run aborted.");
                return Ok(());
            }
            if !self.tick_interval.is_zero() {
                thread::sleep(self.tick_interval);
                // a stop during the wait discards the pending tick
                if self.stop.is_stopped() {
                    self.interrupt("WARNING: run interrupted by user.");
                    return Ok(());
                }
            }

            let outcome = tick(&mut self.sim)?;
            self.publish(&outcome);
            if self.sim.phase.is_terminal() {
                return Ok(());
            }
        }
    }

    fn interrupt(&mut self, message: &str) {
        log::warn!("{message} (tick {})", self.sim.time_ticks);
        self.sim.abort();
        self.emit(SimEvent::Console(message.to_string()));
    }

    fn publish(&mut self, outcome: &TickOutcome) {
        let (sensed, radar) = match outcome {
            TickOutcome::Moved { sensed, radar, .. }
            | TickOutcome::Finished { sensed, radar, .. } => (*sensed, *radar),
            TickOutcome::Halted(_) => return,
        };

        self.emit(SimEvent::Car {
            position: sensed.position,
            heading: sensed.heading,
            wheel_angle: sensed.wheel_angle,
        });
        self.emit(SimEvent::Radar {
            position: sensed.position,
            readings: radar,
        });

        match outcome {
            TickOutcome::Moved { record, .. } => {
                log::debug!(
                    "tick {}: {radar} -> wheel {:.3}",
                    self.sim.time_ticks,
                    record.wheel_angle
                );
            }
            TickOutcome::Finished {
                outcome: Outcome::Goal,
                ..
            } => {
                log::info!("Goal reached at tick {}", self.sim.time_ticks);
                self.emit(SimEvent::Console("Note: car has reached the goal area.".into()));
                self.emit(SimEvent::GoalReached);
            }
            TickOutcome::Finished {
                outcome: Outcome::Collision,
                ..
            } => {
                log::info!("Collision at tick {}", self.sim.time_ticks);
                self.emit(SimEvent::Console("Note: car has collided.".into()));
                self.emit(SimEvent::Collided);
            }
            TickOutcome::Finished {
                outcome: Outcome::SensorError,
                ..
            } => {
                log::warn!("No radar reading at tick {}: {radar}", self.sim.time_ticks);
                self.emit(SimEvent::Console(
                    "Error: radar lost the walls, distances cannot feed the controller.".into(),
                ));
            }
            TickOutcome::Halted(_) => {}
        }
    }

    /// Send to every observer, forgetting the ones that hung up
    fn emit(&mut self, event: SimEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Handle to a run on a worker thread
#[derive(Debug)]
pub struct RunHandle {
    stop: StopToken,
    thread: JoinHandle<Result<RunResult>>,
}

impl RunHandle {
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the run and return its result
    pub fn join(self) -> Result<RunResult> {
        self.thread.join().map_err(|_| Error::WorkerPanicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::{FuzzySystem, SetName};
    use crate::sim::car::Car;
    use crate::sim::state::{GoalArea, RunPhase};

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn balanced_controller() -> Arc<FuzzySystem> {
        let mut settings = Settings::default();
        for rule in &mut settings.rules {
            rule.wheel = match rule.lr_diff {
                SetName::Small => SetName::Large,
                SetName::Medium => SetName::Medium,
                SetName::Large => SetName::Small,
            };
        }
        Arc::new(settings.build_fuzzy_system().unwrap())
    }

    /// Long straight corridor along +y with the goal near the far end
    fn corridor_sim(goal_y: f64) -> Simulation {
        let walls = pts(&[(-8.0, -10.0), (-8.0, 200.0), (8.0, 200.0), (8.0, -10.0), (-8.0, -10.0)]);
        let car = Car::new(Point::ZERO, 90.0, 3.0, &walls).unwrap();
        let goal = GoalArea::new(Point::new(-8.0, goal_y), Point::new(8.0, goal_y + 5.0));
        Simulation::new(car, balanced_controller(), goal).unwrap()
    }

    fn headless(sim: Simulation) -> Runner {
        Runner::new(sim).with_tick_interval(Duration::ZERO)
    }

    fn finished_count(events: &[SimEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SimEvent::Finished(_)))
            .count()
    }

    #[test]
    fn test_reaches_goal() {
        let mut runner = headless(corridor_sim(20.0));
        let rx = runner.subscribe();
        let result = runner.run().unwrap();

        assert_eq!(result.phase, RunPhase::Finished(Outcome::Goal));
        assert!(result.reached_goal());
        assert!(result.log.len() >= 20);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(finished_count(&events), 1);
        assert!(matches!(events.last(), Some(SimEvent::Finished(_))));
        assert!(events.contains(&SimEvent::GoalReached));
        assert!(!events.contains(&SimEvent::Collided));
    }

    #[test]
    fn test_collision_reported() {
        // car starts touching the right wall
        let walls = pts(&[(5.0, -10.0), (5.0, 100.0)]);
        let car = Car::new(Point::new(3.0, 0.0), 90.0, 3.0, &walls).unwrap();
        let goal = GoalArea::new(Point::new(50.0, 50.0), Point::new(60.0, 60.0));
        let sim = Simulation::new(car, balanced_controller(), goal).unwrap();

        let mut runner = headless(sim);
        let rx = runner.subscribe();
        let result = runner.run().unwrap();

        assert_eq!(result.outcome(), Some(Outcome::Collision));
        assert_eq!(result.ticks, 1);
        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events[0], SimEvent::Car { .. }));
        assert!(matches!(events[1], SimEvent::Radar { .. }));
        assert!(events.contains(&SimEvent::Collided));
        assert_eq!(finished_count(&events), 1);
    }

    #[test]
    fn test_sensor_error_reported() {
        let walls = pts(&[(0.0, 10.0), (1.0, 10.0)]);
        let car = Car::new(Point::ZERO, 90.0, 3.0, &walls).unwrap();
        let goal = GoalArea::new(Point::new(50.0, 50.0), Point::new(60.0, 60.0));
        let sim = Simulation::new(car, balanced_controller(), goal).unwrap();

        let result = headless(sim).run().unwrap();
        assert_eq!(result.outcome(), Some(Outcome::SensorError));
        assert!(result.log.is_empty());
        assert_eq!(result.final_pose.position, Point::ZERO);
    }

    #[test]
    fn test_step_cap_aborts() {
        let result = headless(corridor_sim(150.0))
            .with_max_steps(Some(5))
            .run()
            .unwrap();
        assert_eq!(result.phase, RunPhase::Aborted);
        assert_eq!(result.ticks, 5);
        assert_eq!(result.log.len(), 5);
    }

    #[test]
    fn test_stop_before_start() {
        let mut runner = headless(corridor_sim(20.0));
        let rx = runner.subscribe();
        runner.stop_token().stop();
        let result = runner.run().unwrap();

        assert_eq!(result.phase, RunPhase::Aborted);
        assert_eq!(result.ticks, 0);
        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events[0], SimEvent::Console(_)));
        assert_eq!(finished_count(&events), 1);
    }

    #[test]
    fn test_stop_from_another_thread() {
        let mut runner = Runner::new(corridor_sim(150.0))
            .with_tick_interval(Duration::from_millis(5))
            .with_max_steps(None);
        let rx = runner.subscribe();
        let handle = runner.spawn();

        // wait until the loop is visibly running
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, SimEvent::Car { .. }));
        handle.stop();
        let result = handle.join().unwrap();

        assert_eq!(result.phase, RunPhase::Aborted);
        assert!(result.ticks < 150);
        let rest: Vec<_> = rx.try_iter().collect();
        assert_eq!(finished_count(&rest), 1);
    }

    #[test]
    fn test_stock_controller_on_stock_track_terminates() {
        let track = crate::Track::parse(include_str!("../../tracks/case01.txt")).unwrap();
        let settings = Settings {
            fps: 0.0,
            ..Default::default()
        };
        let system = Arc::new(settings.build_fuzzy_system().unwrap());
        let sim = Simulation::from_track(&track, settings.car_radius, system).unwrap();

        let mut runner = Runner::from_settings(sim, &settings);
        let rx = runner.subscribe();
        let result = runner.run().unwrap();

        assert!(result.phase.is_terminal());
        assert!(result.ticks <= DEFAULT_MAX_STEPS);
        // every tick but a terminal one records a step
        let moves = if result.outcome().is_some() {
            result.ticks - 1
        } else {
            result.ticks
        };
        assert_eq!(result.log.len() as u64, moves);
        assert_eq!(finished_count(&rx.try_iter().collect::<Vec<_>>()), 1);
    }

    #[test]
    fn test_worker_panic_still_finishes() {
        let mut runner = headless(corridor_sim(150.0));
        let rx = runner.subscribe();
        let result = runner.run_guarded(|runner| {
            runner.sim.start();
            tick(&mut runner.sim).unwrap();
            panic!("controller blew up");
        });
        assert!(matches!(result, Err(Error::WorkerPanicked)));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(finished_count(&events), 1);
        match events.last() {
            Some(SimEvent::Finished(result)) => {
                assert_eq!(result.phase, RunPhase::Aborted);
                assert_eq!(result.ticks, 1);
            }
            other => panic!("last event was {other:?}"),
        }
    }

    #[test]
    fn test_panic_after_finish_sends_nothing_more() {
        let mut runner = headless(corridor_sim(20.0));
        let rx = runner.subscribe();
        let result = runner.run_guarded(|runner| {
            runner.run_to_end().unwrap();
            panic!("observer bookkeeping failed");
        });
        assert!(matches!(result, Err(Error::WorkerPanicked)));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(finished_count(&events), 1);
        match events.last() {
            Some(SimEvent::Finished(result)) => assert!(result.reached_goal()),
            other => panic!("last event was {other:?}"),
        }
    }

    #[test]
    fn test_dropped_observer_does_not_stall() {
        let mut runner = headless(corridor_sim(20.0));
        drop(runner.subscribe());
        let kept = runner.subscribe();
        let result = runner.run().unwrap();
        assert!(result.reached_goal());
        assert_eq!(finished_count(&kept.try_iter().collect::<Vec<_>>()), 1);
    }
}
