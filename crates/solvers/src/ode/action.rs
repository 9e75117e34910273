/// Control actions supported by the ODE solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop advancing and return the solution so far.
    StopEarly,
}
