/// Event emitted by [`Solver::advance`](super::Solver::advance) after each
/// accepted step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// The number of accepted steps so far in this call.
    pub step: usize,

    /// Time after the step.
    pub time: f64,

    /// Size of the accepted step.
    pub step_size: f64,

    /// Number of attempts rejected before this step was accepted.
    pub rejected: usize,
}
