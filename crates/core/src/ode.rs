/// A value whose mutable state can be flattened into an ODE state vector.
///
/// Implementors own a fixed-length slice of the global state vector. The
/// three slice operations must agree on ordering: the layout written by
/// [`OdeState::ode_values`] is the layout read by
/// [`OdeState::ode_values_set`] and the layout written by
/// [`OdeState::ode_rates`].
///
/// Every slice passed to these methods has length exactly
/// [`OdeState::ode_size`]. A mismatch is a programming error and
/// implementations are expected to panic rather than continue with a
/// misaligned vector.
///
/// Containers of states are states themselves: `Vec<T>` delegates to each
/// element in order, so populations of cohorts and patches of populations
/// compose without extra bookkeeping.
pub trait OdeState {
    /// Number of state variables.
    fn ode_size(&self) -> usize;

    /// Reads state from `values`.
    ///
    /// Returns `true` if any stored value changed, which owners use to decide
    /// whether derived caches must be invalidated.
    fn ode_values_set(&mut self, values: &[f64]) -> bool;

    /// Writes the current state into `out`.
    fn ode_values(&self, out: &mut [f64]);

    /// Writes the current rates of change into `out`.
    ///
    /// Rates reflect the most recent physiological computation; callers are
    /// responsible for computing them before asking.
    fn ode_rates(&self, out: &mut [f64]);

    /// Returns the current state as a new vector.
    fn ode_values_vec(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.ode_size()];
        self.ode_values(&mut out);
        out
    }

    /// Returns the current rates as a new vector.
    fn ode_rates_vec(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.ode_size()];
        self.ode_rates(&mut out);
        out
    }
}

/// An [`OdeState`] that can evaluate its own derivative.
///
/// Generic ODE solvers drive an `OdeSystem` by repeatedly calling
/// [`OdeSystem::derivs`] with trial states. The system is free to keep
/// caches between calls as long as the result depends only on `time` and `y`.
pub trait OdeSystem: OdeState {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Computes `dydt` at `time` for state `y`.
    ///
    /// Implementations typically write `y` into their own state first, so the
    /// system is left holding `y` after the call.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the derivative cannot be computed at `y`.
    fn derivs(&mut self, time: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), Self::Error>;
}

impl<T: OdeState> OdeState for Vec<T> {
    fn ode_size(&self) -> usize {
        self.iter().map(OdeState::ode_size).sum()
    }

    fn ode_values_set(&mut self, values: &[f64]) -> bool {
        assert_eq!(values.len(), self.ode_size(), "state vector length mismatch");
        let mut changed = false;
        let mut rest = values;
        for item in self.iter_mut() {
            let (head, tail) = rest.split_at(item.ode_size());
            changed |= item.ode_values_set(head);
            rest = tail;
        }
        changed
    }

    fn ode_values(&self, out: &mut [f64]) {
        assert_eq!(out.len(), self.ode_size(), "state vector length mismatch");
        let mut rest = out;
        for item in self {
            let (head, tail) = rest.split_at_mut(item.ode_size());
            item.ode_values(head);
            rest = tail;
        }
    }

    fn ode_rates(&self, out: &mut [f64]) {
        assert_eq!(out.len(), self.ode_size(), "rate vector length mismatch");
        let mut rest = out;
        for item in self {
            let (head, tail) = rest.split_at_mut(item.ode_size());
            item.ode_rates(head);
            rest = tail;
        }
    }
}
