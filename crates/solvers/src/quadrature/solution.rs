/// Indicates whether quadrature met its tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The error estimate is within tolerance.
    Converged,

    /// Stopped at the subinterval limit with the error above tolerance.
    MaxIntervals,
}

/// The result of an adaptive integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,

    /// Estimated integral.
    pub value: f64,

    /// Estimated absolute error of `value`.
    pub abs_error: f64,

    /// Number of subintervals in the final partition.
    pub intervals: usize,
}
