use std::error::Error as StdError;

use super::ConfigError;

/// Errors that can occur while stepping an ODE system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("system error: {0}")]
    System(#[source] Box<dyn StdError + Send + Sync>),

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("step size {step_size:e} fell below the minimum at t = {time}")]
    StepSizeTooSmall { time: f64, step_size: f64 },

    #[error("end time {t_end} is before the current time {time}")]
    EndBeforeStart { time: f64, t_end: f64 },

    #[error("reached {0} steps before the end time")]
    MaxSteps(usize),
}

impl Error {
    pub(crate) fn system<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::System(Box::new(err))
    }
}
