//! Simulation loop and trajectory recording.

use serde::{Deserialize, Serialize};
use tl_controls::{FeedbackController, PidTerms};
use tl_core::sanitize_dt;
use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::error::{SimError, SimResult};
use crate::model::Plant;
use crate::schedule::SetpointSchedule;

/// Options for simulation runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimOptions {
    /// Run length (seconds). The loop stops once elapsed time exceeds it.
    pub duration: f64,
    /// Maximum number of iterations (safety limit)
    pub max_steps: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            duration: 10.0,
            max_steps: 10_000_000,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(SimError::InvalidConfiguration {
                what: "duration must be finite and non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidConfiguration {
                what: "max_steps must be positive",
            });
        }
        Ok(())
    }
}

/// Lifecycle of a loop. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    NotStarted,
    Running,
    Stopped,
}

/// One loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Elapsed time (seconds)
    pub elapsed: f64,
    /// Reported measurement after the plant advanced
    pub measurement: f64,
    /// Setpoint the controller acted on
    pub setpoint: f64,
    /// Controller output fed to the plant
    pub output: f64,
    pub terms: PidTerms,
}

/// Record of simulation results.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimRecord {
    pub samples: Vec<Sample>,
    /// Iterations whose `dt` was zero, negative or non-finite.
    pub degenerate_steps: usize,
    pub setpoint_changes_applied: usize,
}

impl SimRecord {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// `(elapsed, measurement)` pairs.
    pub fn measurement_series(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|s| (s.elapsed, s.measurement)).collect()
    }

    /// `(elapsed, setpoint)` pairs.
    pub fn setpoint_series(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|s| (s.elapsed, s.setpoint)).collect()
    }

    /// `(elapsed, output)` pairs.
    pub fn output_series(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|s| (s.elapsed, s.output)).collect()
    }
}

/// Closed loop of one controller, one plant and a clock.
///
/// Each iteration: tick the clock, compute the actuation from the current
/// measurement, advance the plant, record a [`Sample`], then apply any
/// setpoint change whose time has passed. Changes therefore take effect on
/// the following iteration.
pub struct Simulation<C, P, K> {
    controller: C,
    plant: P,
    clock: K,
    schedule: SetpointSchedule,
    options: SimOptions,
    state: LoopState,
    measurement: f64,
    steps: usize,
    record: SimRecord,
}

impl<C, P, K> Simulation<C, P, K>
where
    C: FeedbackController,
    P: Plant,
    K: Clock,
{
    pub fn new(
        controller: C,
        plant: P,
        clock: K,
        schedule: SetpointSchedule,
        options: SimOptions,
    ) -> SimResult<Self> {
        options.validate()?;
        let measurement = plant.reported();
        Ok(Self {
            controller,
            plant,
            clock,
            schedule,
            options,
            state: LoopState::NotStarted,
            measurement,
            steps: 0,
            record: SimRecord::default(),
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn plant(&self) -> &P {
        &self.plant
    }

    /// Measurement the controller will see on the next iteration.
    pub fn measurement(&self) -> f64 {
        self.measurement
    }

    pub fn record(&self) -> &SimRecord {
        &self.record
    }

    pub fn into_record(self) -> SimRecord {
        self.record
    }

    fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            info!(
                steps = self.steps,
                degenerate_steps = self.record.degenerate_steps,
                "simulation stopped"
            );
            self.state = LoopState::Stopped;
        }
    }

    /// Run one iteration. Returns `None` once the loop has stopped.
    pub fn step(&mut self) -> Option<Sample> {
        if self.state == LoopState::Stopped {
            return None;
        }
        if self.steps >= self.options.max_steps {
            self.stop();
            return None;
        }

        let tick = self.clock.tick();
        if tick.elapsed > self.options.duration {
            self.stop();
            return None;
        }

        if self.state == LoopState::NotStarted {
            info!(
                duration = self.options.duration,
                setpoint = self.controller.target(),
                measurement = self.measurement,
                "simulation started"
            );
            self.state = LoopState::Running;
        }

        if sanitize_dt(tick.dt).is_none() {
            debug!(elapsed = tick.elapsed, dt = tick.dt, "degenerate time step");
            self.record.degenerate_steps += 1;
        }

        let setpoint = self.controller.target();
        let output = self.controller.compute(self.measurement, tick.dt);
        self.measurement = self.plant.advance(output, tick.dt);
        self.steps += 1;

        let sample = Sample {
            elapsed: tick.elapsed,
            measurement: self.measurement,
            setpoint,
            output,
            terms: self.controller.terms(),
        };
        trace!(
            elapsed = sample.elapsed,
            measurement = sample.measurement,
            setpoint = sample.setpoint,
            output = sample.output,
            p = sample.terms.proportional,
            i = sample.terms.integral,
            d = sample.terms.derivative,
            "step"
        );
        self.record.samples.push(sample);

        for change in self.schedule.due(tick.elapsed) {
            info!(elapsed = tick.elapsed, setpoint = change.value, "setpoint changed");
            self.controller.set_target(change.value);
            self.record.setpoint_changes_applied += 1;
        }

        self.clock.pace();
        Some(sample)
    }

    /// Run to completion, calling `observer` after every iteration.
    pub fn run_with_observer<F>(&mut self, mut observer: F) -> &SimRecord
    where
        F: FnMut(&Sample),
    {
        while let Some(sample) = self.step() {
            observer(&sample);
        }
        &self.record
    }

    /// Run to completion.
    pub fn run(&mut self) -> &SimRecord {
        self.run_with_observer(|_| {})
    }
}

/// Build a loop, run it to completion and return the trajectory.
pub fn run_sim<C, P, K>(
    controller: C,
    plant: P,
    clock: K,
    schedule: SetpointSchedule,
    options: SimOptions,
) -> SimResult<SimRecord>
where
    C: FeedbackController,
    P: Plant,
    K: Clock,
{
    let mut sim = Simulation::new(controller, plant, clock, schedule, options)?;
    sim.run();
    Ok(sim.into_record())
}
