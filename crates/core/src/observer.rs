/// Receives events from a solver and optionally returns a control action.
///
/// Solvers are generic over their observer, so an observer can be a unit
/// value (no observation), a closure, or a stateful type.
///
/// ```
/// use canopy_core::Observer;
///
/// struct CountSteps(usize);
///
/// impl<E> Observer<E, ()> for CountSteps {
///     fn observe(&mut self, _event: &E) -> Option<()> {
///         self.0 += 1;
///         None
///     }
/// }
///
/// let mut counter = CountSteps(0);
/// let action: Option<()> = counter.observe(&1.5_f64);
/// assert!(action.is_none());
/// assert_eq!(counter.0, 1);
/// ```
pub trait Observer<E, A> {
    /// Observes an event, returning an action for the solver to apply.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Action {
        Stop,
    }

    #[test]
    fn unit_observer_never_acts() {
        let mut observer = ();
        let action: Option<Action> = observer.observe(&3_usize);
        assert!(action.is_none());
    }

    #[test]
    fn closure_observer_can_act() {
        let mut seen = Vec::new();
        let mut observer = |event: &usize| {
            seen.push(*event);
            (*event >= 2).then_some(Action::Stop)
        };

        assert_eq!(observer.observe(&1), None);
        assert_eq!(observer.observe(&2), Some(Action::Stop));
        drop(observer);
        assert_eq!(seen, vec![1, 2]);
    }
}
