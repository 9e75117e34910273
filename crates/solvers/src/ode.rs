//! Controlled time stepping for [`OdeSystem`]s.
//!
//! The [`Solver`] owns the clock and the step size controller, not the
//! system. Each call to [`Solver::step`] borrows the system, reads its state
//! vector, evaluates [`OdeSystem::derivs`] at the trial stages, and writes the
//! accepted state back:
//!
//! ```text
//! y_{n+1} = y_n + h * Σ b_i k_i,    k_i = f(t_n + c_i h, y_n + h Σ a_ij k_j)
//! ```
//!
//! With [`Method::CashKarp`] the difference between the embedded fourth- and
//! fifth-order solutions estimates the local error. A step is rejected when
//!
//! ```text
//! max_i |err_i| / (abs_tol + rel_tol * |y_i|) > 1.1
//! ```
//!
//! and retried with a smaller step; accepted steps with a small error ratio
//! grow the next step.
//!
//! # Example
//!
//! ```ignore
//! use canopy_solvers::ode::{Config, Solver};
//!
//! let mut solver = Solver::new(Config::default())?;
//! let solution = solver.advance(&mut system, 10.0, ())?;
//! println!("reached t={} in {} steps", solution.time, solution.steps);
//! ```

mod action;
mod config;
mod error;
mod event;
mod solution;
mod tableau;


pub use action::Action;
pub use config::{Config, ConfigError, Method};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status, Step};

use canopy_core::{Observer, OdeSystem};

use tableau::{A, B4, B5, C, STAGES};

/// Largest error ratio accepted without rejecting the step.
const REJECT_RATIO: f64 = 1.1;

/// Error ratio below which the next step is allowed to grow.
const GROW_RATIO: f64 = 0.5;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// An adaptive ODE solver.
///
/// Holds the current time, the step size proposed for the next step, and
/// scratch buffers reused across steps.
#[derive(Debug, Clone)]
pub struct Solver {
    config: Config,
    time: f64,
    step_size: f64,
    y: Vec<f64>,
    y_stage: Vec<f64>,
    y_next: Vec<f64>,
    k: [Vec<f64>; STAGES],
}

impl Default for Solver {
    fn default() -> Self {
        Self::with_valid_config(Config::default())
    }
}

impl Solver {
    /// Creates a solver starting at time zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails validation.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: Config) -> Self {
        Self {
            config,
            time: 0.0,
            step_size: config.step_size_initial,
            y: Vec::new(),
            y_stage: Vec::new(),
            y_next: Vec::new(),
            k: Default::default(),
        }
    }

    /// Returns the solver configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Returns the step size that the next step will attempt.
    #[must_use]
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Resets the clock to `time` and the step size to its initial value.
    pub fn reset(&mut self, time: f64) {
        self.time = time;
        self.step_size = self.config.step_size_initial;
    }

    /// Takes one accepted step, leaving `system` at the new state.
    ///
    /// On error the clock does not move and `system` is put back at the
    /// state it held before the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the system fails to compute a derivative, or if the
    /// step size must shrink below `step_size_min` to meet the tolerances.
    pub fn step<S: OdeSystem>(&mut self, system: &mut S) -> Result<Step, Error> {
        self.resize(system.ode_size());
        system.ode_values(&mut self.y);

        let result = self.step_from_start(system);
        if result.is_err() {
            system.ode_values_set(&self.y);
        }
        result
    }

    /// Steps from `self.y`, which must already hold the system's state.
    fn step_from_start<S: OdeSystem>(&mut self, system: &mut S) -> Result<Step, Error> {
        let n = self.y.len();
        system
            .derivs(self.time, &self.y, &mut self.k[0])
            .map_err(Error::system)?;

        if self.config.method == Method::ForwardEuler {
            let h = self.step_size;
            for i in 0..n {
                self.y_next[i] = self.y[i] + h * self.k[0][i];
            }
            return Ok(self.accept(system, h, 0));
        }

        let mut rejected = 0;
        loop {
            let h = self.step_size;
            let ratio = self.try_cash_karp(system, h)?;

            if ratio.is_finite() && ratio <= REJECT_RATIO {
                let step = self.accept(system, h, rejected);
                if ratio < GROW_RATIO {
                    let factor = if ratio > 0.0 {
                        (SAFETY * ratio.powf(-0.2)).min(MAX_FACTOR)
                    } else {
                        MAX_FACTOR
                    };
                    self.step_size = (h * factor).min(self.config.step_size_max);
                }
                return Ok(step);
            }

            let factor = if ratio.is_finite() {
                (SAFETY * ratio.powf(-0.25)).max(MIN_FACTOR)
            } else {
                MIN_FACTOR
            };
            let shrunk = h * factor;
            if shrunk < self.config.step_size_min {
                return Err(Error::StepSizeTooSmall {
                    time: self.time,
                    step_size: shrunk,
                });
            }

            log::debug!(
                "rejected step at t = {} (h = {h:e}, error ratio = {ratio:e})",
                self.time
            );
            self.step_size = shrunk;
            rejected += 1;
        }
    }

    /// Steps `system` until `t_end`, observing every accepted step.
    ///
    /// The final step is shortened to land exactly on `t_end`. The observer
    /// receives an [`Event`] after each accepted step and may return
    /// [`Action::StopEarly`].
    ///
    /// # Errors
    ///
    /// Returns an error if `t_end` is before the current time, a step fails,
    /// or `max_steps` steps are taken without reaching `t_end`.
    pub fn advance<S, Obs>(
        &mut self,
        system: &mut S,
        t_end: f64,
        mut observer: Obs,
    ) -> Result<Solution, Error>
    where
        S: OdeSystem,
        Obs: Observer<Event, Action>,
    {
        if t_end < self.time {
            return Err(Error::EndBeforeStart {
                time: self.time,
                t_end,
            });
        }

        let mut steps = 0;
        let mut rejected = 0;

        while self.time < t_end {
            if steps == self.config.max_steps {
                return Err(Error::MaxSteps(steps));
            }

            let remaining = t_end - self.time;
            let planned = self.step_size;
            let clamped = planned > remaining;
            if clamped {
                self.step_size = remaining;
            }

            let step = self.step(system)?;
            steps += 1;
            rejected += step.rejected;

            if clamped {
                if (t_end - self.time).abs() <= f64::EPSILON * t_end.abs().max(1.0) {
                    self.time = t_end;
                }
                if step.rejected == 0 {
                    self.step_size = self.step_size.max(planned.min(self.config.step_size_max));
                }
            }

            let event = Event {
                step: steps,
                time: self.time,
                step_size: step.step_size,
                rejected: step.rejected,
            };
            if let Some(Action::StopEarly) = observer.observe(&event) {
                return Ok(Solution {
                    status: Status::StoppedByObserver,
                    time: self.time,
                    steps,
                    rejected,
                });
            }
        }

        Ok(Solution {
            status: Status::Complete,
            time: self.time,
            steps,
            rejected,
        })
    }

    fn resize(&mut self, n: usize) {
        self.y.resize(n, 0.0);
        self.y_stage.resize(n, 0.0);
        self.y_next.resize(n, 0.0);
        for k in &mut self.k {
            k.resize(n, 0.0);
        }
    }

    /// Attempts a Cash–Karp step of size `h` from `self.y`.
    ///
    /// Fills `self.y_next` and returns the scaled error ratio.
    fn try_cash_karp<S: OdeSystem>(&mut self, system: &mut S, h: f64) -> Result<f64, Error> {
        let n = self.y.len();

        for s in 1..STAGES {
            for i in 0..n {
                let increment: f64 = (0..s).map(|j| A[s][j] * self.k[j][i]).sum();
                self.y_stage[i] = self.y[i] + h * increment;
            }
            system
                .derivs(self.time + C[s] * h, &self.y_stage, &mut self.k[s])
                .map_err(Error::system)?;
        }

        let mut ratio: f64 = 0.0;
        for i in 0..n {
            let mut high = 0.0;
            let mut err = 0.0;
            for s in 0..STAGES {
                high += B5[s] * self.k[s][i];
                err += (B5[s] - B4[s]) * self.k[s][i];
            }
            self.y_next[i] = self.y[i] + h * high;

            let scale =
                self.config.abs_tol + self.config.rel_tol * self.y[i].abs().max(self.y_next[i].abs());
            let scaled = (h * err).abs() / scale;
            if scaled.is_nan() {
                return Ok(f64::NAN);
            }
            ratio = ratio.max(scaled);
        }
        Ok(ratio)
    }

    fn accept<S: OdeSystem>(&mut self, system: &mut S, h: f64, rejected: usize) -> Step {
        self.time += h;
        system.ode_values_set(&self.y_next);
        Step {
            time: self.time,
            step_size: h,
            rejected,
        }
    }
}
