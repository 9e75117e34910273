/// Sign of a function value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    pub(super) fn of(value: f64) -> Self {
        if value > 0.0 {
            Self::Positive
        } else if value < 0.0 {
            Self::Negative
        } else {
            Self::Zero
        }
    }
}

/// An interval whose endpoints have function values of opposite sign.
#[derive(Debug, Clone, Copy)]
pub(super) struct Bracket {
    pub(super) left: f64,
    pub(super) right: f64,
    left_sign: Sign,
}

impl Bracket {
    /// Creates a bracket, swapping reversed bounds.
    ///
    /// `f_a` and `f_b` are the function values at the given bounds.
    pub(super) fn new([a, b]: [f64; 2], [f_a, f_b]: [f64; 2]) -> Self {
        let (left, f_left) = if a <= b { (a, f_a) } else { (b, f_b) };
        let right = a.max(b);
        Self {
            left,
            right,
            left_sign: Sign::of(f_left),
        }
    }

    pub(super) fn width(&self) -> f64 {
        self.right - self.left
    }

    pub(super) fn midpoint(&self) -> f64 {
        self.left + 0.5 * self.width()
    }

    /// Replaces the bound that shares the sign of `x`'s value.
    pub(super) fn shrink(&mut self, x: f64, sign: Sign) {
        if sign == self.left_sign {
            self.left = x;
        } else {
            self.right = x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn reversed_bounds_are_swapped() {
        let bracket = Bracket::new([2.0, -1.0], [3.0, -4.0]);

        assert_relative_eq!(bracket.left, -1.0);
        assert_relative_eq!(bracket.right, 2.0);
        assert_eq!(bracket.left_sign, Sign::Negative);
    }

    #[test]
    fn shrink_keeps_the_sign_change() {
        let mut bracket = Bracket::new([0.0, 4.0], [-1.0, 1.0]);

        bracket.shrink(2.0, Sign::Negative);
        assert_relative_eq!(bracket.left, 2.0);

        bracket.shrink(3.0, Sign::Positive);
        assert_relative_eq!(bracket.right, 3.0);
        assert_relative_eq!(bracket.midpoint(), 2.5);
    }
}
