//! Peaked and thermal spectral shapes: Gaussian, exponential, Band GRB
//! function, black body, and the cutoff power law.

use super::piecewise::{Boundary, region};

/// `norm·exp(−(x − mu)²/(2σ²))`.
pub fn gaussian(x: f64, norm: f64, mu: f64, sigma: f64) -> f64 {
    norm * (-(x - mu).powi(2) / (2.0 * sigma * sigma)).exp()
}

/// `norm·exp(a·(x − x0)^b)`.
///
/// With the default `b = −1` this is `norm·exp(a/(x − x0))`; a non-integer `b`
/// is only real for `x > x0`.
pub fn exponential(x: f64, norm: f64, x0: f64, a: f64, b: f64) -> f64 {
    norm * (a * (x - x0).powf(b)).exp()
}

/// Band GRB function parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub a: f64,
    pub ep: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl Band {
    /// Energy where the low- and high-energy pieces meet.
    pub fn break_energy(&self) -> f64 {
        (self.alpha - self.beta) * self.ep / (2.0 + self.alpha)
    }

    fn lower(&self, x: f64) -> f64 {
        self.a * ((x / 100.0).powf(self.alpha) * (-x * (2.0 + self.alpha) / self.ep).exp())
    }

    fn upper(&self, x: f64) -> f64 {
        let d = self.alpha - self.beta;
        self.a
            * ((d * self.ep / (100.0 * (2.0 + self.alpha))).powf(d)
                * (self.beta - self.alpha).exp()
                * (x / 100.0).powf(self.beta))
    }
}

/// Band function with 100 keV pivot.
pub fn band(x: f64, p: &Band) -> f64 {
    match region(x, &[p.break_energy()], Boundary::UpperClosed) {
        0 => p.lower(x),
        _ => p.upper(x),
    }
}

/// `A·x²/(exp(x/kT) − 1)`.
///
/// The denominator is formed with `exp_m1` so small `x/kT` keeps full
/// precision; `x = 0` returns the limit `0`, and an overflowing exponential
/// gives `0` rather than NaN.
pub fn black_body(x: f64, a: f64, kt: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    let denom = (x / kt).exp_m1();
    if denom.is_infinite() {
        return 0.0;
    }
    a * x * x / denom
}

/// Comptonized (cutoff power law) spectrum.
pub fn compt(x: f64, a: f64, ep: f64, index: f64, e_piv: f64) -> f64 {
    a * (-x * (2.0 + index) / ep).exp() * (x / e_piv).powf(index)
}
