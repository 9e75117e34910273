/// A function of one real variable, as consumed by numeric routines.
///
/// Root finders, quadrature rules, and spline fitters in this workspace take
/// any `ScalarFn`. Closures implement it automatically, and [`Functor`]
/// adapts an object together with one of its methods.
pub trait ScalarFn {
    /// Evaluates the function at `x`.
    fn call(&mut self, x: f64) -> f64;
}

impl<F> ScalarFn for F
where
    F: FnMut(f64) -> f64,
{
    fn call(&mut self, x: f64) -> f64 {
        self(x)
    }
}

/// Binds an object to one of its `fn(&T, f64) -> f64` methods.
///
/// The binding borrows the object, so it can never outlive it.
///
/// ```
/// use canopy_core::{Functor, ScalarFn};
///
/// struct Line {
///     slope: f64,
/// }
///
/// impl Line {
///     fn at(&self, x: f64) -> f64 {
///         self.slope * x
///     }
/// }
///
/// let line = Line { slope: 3.0 };
/// let mut f = Functor::new(&line, Line::at);
/// assert_eq!(f.call(2.0), 6.0);
/// ```
pub struct Functor<'a, T: ?Sized> {
    obj: &'a T,
    method: fn(&T, f64) -> f64,
}

impl<'a, T: ?Sized> Functor<'a, T> {
    /// Creates a binding of `method` to `obj`.
    pub fn new(obj: &'a T, method: fn(&T, f64) -> f64) -> Self {
        Self { obj, method }
    }

    /// Evaluates the bound method at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        (self.method)(self.obj, x)
    }
}

impl<T: ?Sized> Clone for Functor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Functor<'_, T> {}

impl<T: ?Sized> ScalarFn for Functor<'_, T> {
    fn call(&mut self, x: f64) -> f64 {
        self.eval(x)
    }
}

/// Returns a closure that forwards its argument to `method` on `obj`.
pub fn bind<'a, T: ?Sized>(obj: &'a T, method: fn(&T, f64) -> f64) -> impl Fn(f64) -> f64 + 'a {
    move |x| method(obj, x)
}

/// Evaluates an adapter through an opaque handle.
///
/// This is the two-argument `(x, context)` calling convention for routines
/// that store their callback type-erased.
pub fn invoke(x: f64, context: &mut dyn ScalarFn) -> f64 {
    context.call(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    struct Quadratic {
        a: f64,
        b: f64,
        c: f64,
    }

    impl Quadratic {
        fn at(&self, x: f64) -> f64 {
            (self.a * x + self.b) * x + self.c
        }
    }

    fn sum_at<F: ScalarFn>(mut f: F, xs: &[f64]) -> f64 {
        xs.iter().map(|&x| f.call(x)).sum()
    }

    #[test]
    fn functor_forwards_to_method() {
        let q = Quadratic {
            a: 1.0,
            b: -2.0,
            c: 3.0,
        };
        let f = Functor::new(&q, Quadratic::at);

        for x in [-1.0, 0.0, 0.5, 4.0] {
            assert_relative_eq!(f.eval(x), q.at(x));
        }
    }

    #[test]
    fn functor_and_closure_are_interchangeable() {
        let q = Quadratic {
            a: 2.0,
            b: 0.0,
            c: -1.0,
        };
        let xs = [0.0, 1.0, 2.0];

        let via_functor = sum_at(Functor::new(&q, Quadratic::at), &xs);
        let via_bind = sum_at(bind(&q, Quadratic::at), &xs);
        let via_closure = sum_at(|x: f64| q.at(x), &xs);

        assert_relative_eq!(via_functor, 7.0);
        assert_relative_eq!(via_bind, via_functor);
        assert_relative_eq!(via_closure, via_functor);
    }

    #[test]
    fn invoke_uses_opaque_context() {
        let q = Quadratic {
            a: 0.0,
            b: 3.0,
            c: 1.0,
        };
        let mut f = Functor::new(&q, Quadratic::at);
        let mut calls = 0;
        let mut counting = |x: f64| {
            calls += 1;
            x * x
        };

        assert_relative_eq!(invoke(2.0, &mut f), 7.0);
        assert_relative_eq!(invoke(3.0, &mut counting), 9.0);
        assert_eq!(calls, 1);
    }
}
