//! The 7-point Gauss / 15-point Kronrod pair on `[-1, 1]`.

use canopy_core::ScalarFn;

use super::Error;

/// Kronrod abscissae in decreasing order; the last is the centre.
///
/// Odd indices are shared with the 7-point Gauss rule.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];

/// Kronrod weights matching [`XGK`].
const WGK: [f64; 8] = [
    0.022_935_322_010_529_22,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_18,
    0.140_653_259_715_525_92,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_83,
];

/// Gauss weights for `XGK[1]`, `XGK[3]`, `XGK[5]` and the centre.
const WG: [f64; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

/// One rule application over a subinterval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Segment {
    pub(super) a: f64,
    pub(super) b: f64,
    pub(super) value: f64,
    pub(super) error: f64,
}

impl Segment {
    /// Applies the rule to `f` over `[a, b]`.
    pub(super) fn new<F: ScalarFn>(f: &mut F, a: f64, b: f64) -> Result<Self, Error> {
        let centre = 0.5 * (a + b);
        let half = 0.5 * (b - a);

        let f_centre = eval(f, centre)?;
        let mut kronrod = WGK[7] * f_centre;
        let mut gauss = WG[3] * f_centre;

        for (j, (&x, &w)) in XGK.iter().zip(&WGK).take(7).enumerate() {
            let dx = half * x;
            let pair = eval(f, centre - dx)? + eval(f, centre + dx)?;
            kronrod += w * pair;
            if j % 2 == 1 {
                gauss += WG[j / 2] * pair;
            }
        }

        Ok(Self {
            a,
            b,
            value: kronrod * half,
            error: ((kronrod - gauss) * half).abs(),
        })
    }

    /// Splits the segment at its midpoint and re-applies the rule to each half.
    pub(super) fn bisect<F: ScalarFn>(&self, f: &mut F) -> Result<[Self; 2], Error> {
        let mid = 0.5 * (self.a + self.b);
        Ok([Self::new(f, self.a, mid)?, Self::new(f, mid, self.b)?])
    }
}

fn eval<F: ScalarFn>(f: &mut F, x: f64) -> Result<f64, Error> {
    let value = f.call(x);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::NonFiniteIntegrand { x })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn weights_integrate_constants() {
        let kronrod = WGK[7] + 2.0 * WGK[..7].iter().sum::<f64>();
        let gauss = WG[3] + 2.0 * WG[..3].iter().sum::<f64>();

        assert_relative_eq!(kronrod, 2.0, epsilon = 1e-14);
        assert_relative_eq!(gauss, 2.0, epsilon = 1e-14);
    }

    #[test]
    fn exact_for_high_degree_polynomials() {
        // Gauss-7 is exact to degree 13, so the error estimate vanishes too.
        let mut f = |x: f64| x.powi(12) - 3.0 * x.powi(5) + 1.0;
        let segment = Segment::new(&mut f, -1.0, 1.0).expect("finite integrand");

        assert_relative_eq!(segment.value, 2.0 / 13.0 + 2.0, epsilon = 1e-13);
        assert!(segment.error < 1e-13);
    }

    #[test]
    fn bisect_covers_the_segment() {
        let mut f = |x: f64| x.exp();
        let whole = Segment::new(&mut f, 0.0, 2.0).expect("finite integrand");
        let [left, right] = whole.bisect(&mut f).expect("finite integrand");

        assert_relative_eq!(left.b, right.a);
        assert_relative_eq!(left.value + right.value, whole.value, epsilon = 1e-12);
    }
}
