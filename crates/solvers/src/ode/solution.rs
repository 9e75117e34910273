/// Indicates how [`Solver::advance`](super::Solver::advance) terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Reached the requested end time.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of advancing a system over an interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// How the solver terminated.
    pub status: Status,

    /// Time reached.
    pub time: f64,

    /// Number of accepted steps.
    pub steps: usize,

    /// Number of rejected step attempts.
    pub rejected: usize,
}

/// Summary of one accepted step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Time after the step.
    pub time: f64,

    /// Size of the step that was taken.
    pub step_size: f64,

    /// Number of attempts rejected before acceptance.
    pub rejected: usize,
}
