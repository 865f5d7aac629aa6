//! Synchrotron emission from a thermal + power-law electron distribution.
//!
//! The photon spectrum at energy `x` is
//!
//! ```text
//! N(x) = (1/x) ∫₁^∞ EDist(γ) · F(x / (eCrit·γ²)) dγ
//! ```
//!
//! where `F` is the first synchrotron function and `EDist` is a Maxwellian
//! (`γ ≤ eta`) joined continuously to a power-law tail (`γ > eta`).
//!
//! The outer quadrature samples a wide, partly unphysical range of `γ`; any
//! special-function failure there contributes exactly zero.

use crate::math::{QuadConfig, Quadrature, integrate_to_infinity, synchrotron_1};

/// Absolute tolerance of the `γ` integral.
pub const EPS_ABS: f64 = 0.0;
/// Relative tolerance of the `γ` integral.
pub const EPS_REL: f64 = 1e-5;
/// Lower limit of the `γ` integral.
pub const GAMMA_MIN: f64 = 1.0;

/// Synchrotron model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Synchrotron {
    pub a: f64,
    pub e_crit: f64,
    pub eta: f64,
    pub index: f64,
    pub gamma_th: f64,
}

impl Synchrotron {
    /// Quadrature settings with the model's fixed tolerances.
    pub fn quad_config(max_subdivisions: usize) -> QuadConfig {
        QuadConfig {
            eps_abs: EPS_ABS,
            eps_rel: EPS_REL,
            max_subdivisions,
        }
    }

    /// Electron energy distribution.
    pub fn edist(&self, gamma: f64) -> f64 {
        if gamma <= self.eta {
            self.edist_thermal(gamma)
        } else {
            self.edist_tail(gamma)
        }
    }

    fn edist_thermal(&self, gamma: f64) -> f64 {
        let g = gamma / self.gamma_th;
        self.a * g * g * (-g).exp()
    }

    fn edist_tail(&self, gamma: f64) -> f64 {
        let ratio = self.eta / self.gamma_th;
        let epsilon = ratio.powf(2.0 + self.index) * (-ratio).exp();
        self.a * epsilon * (gamma / self.gamma_th).powf(-self.index)
    }

    /// Integrand of the `γ` integral at photon energy `x`.
    pub fn integrand(&self, gamma: f64, x: f64) -> f64 {
        match synchrotron_1(x / (self.e_crit * gamma * gamma)) {
            Ok(kernel) => self.edist(gamma) * kernel,
            Err(err) => {
                tracing::trace!(gamma, x, %err, "synchrotron kernel failed, contributing 0");
                0.0
            }
        }
    }

    /// Integrate at `x` and return the raw quadrature report.
    pub fn integrate(&self, x: f64, config: &QuadConfig) -> Quadrature {
        integrate_to_infinity(|gamma| self.integrand(gamma, x), GAMMA_MIN, config)
    }
}

/// Subdivision budget used by the catalog entry.
pub const DEFAULT_SUBDIVISIONS: usize = 50;

/// Photon spectrum at `x`.
pub fn synchrotron(x: f64, p: &Synchrotron) -> f64 {
    let q = p.integrate(x, &Synchrotron::quad_config(DEFAULT_SUBDIVISIONS));
    if !q.converged {
        tracing::debug!(
            x,
            value = q.value,
            abs_error = q.abs_error,
            subdivisions = q.subdivisions,
            "synchrotron integral hit its subdivision budget"
        );
    }
    q.value / x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::piecewise::relative_gap;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn typical() -> Synchrotron {
        Synchrotron {
            a: 1.0,
            e_crit: 1e-3,
            eta: 30.0,
            index: 3.0,
            gamma_th: 10.0,
        }
    }

    #[test]
    fn edist_is_continuous_at_eta() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..500 {
            let p = Synchrotron {
                a: rng.gen_range(0.1..10.0),
                e_crit: 1.0,
                eta: rng.gen_range(2.0..500.0),
                index: rng.gen_range(1.5..5.0),
                gamma_th: rng.gen_range(1.0..100.0),
            };
            let gap = relative_gap(p.edist_thermal(p.eta), p.edist_tail(p.eta));
            assert!(gap < 1e-12, "{p:?}: gap {gap}");
        }
    }

    #[test]
    fn integrand_absorbs_kernel_failures() {
        let p = typical();
        // Negative critical energy drives the kernel argument out of its domain.
        let bad = Synchrotron { e_crit: -1.0, ..p };
        assert_eq!(bad.integrand(5.0, 1.0), 0.0);
        // Huge argument underflows.
        assert_eq!(p.integrand(1.0, 1e9), 0.0);
    }

    #[test]
    fn spectrum_is_positive_and_finite() {
        let p = typical();
        for &x in &[1e-4, 1e-2, 0.1, 1.0, 10.0] {
            let v = synchrotron(x, &p);
            assert!(v.is_finite() && v > 0.0, "N({x}) = {v}");
        }
    }

    #[test]
    fn quadrature_meets_relative_tolerance() {
        let p = typical();
        let q = p.integrate(0.05, &Synchrotron::quad_config(500));
        assert!(q.converged);
        assert!(q.abs_error <= EPS_REL * q.value.abs());
    }

    #[test]
    fn power_law_tail_has_synchrotron_slope() {
        // Electrons with N(γ) ∝ γ^-p radiate photons with N(x) ∝ x^-(p+1)/2.
        let p = typical();
        let lo = synchrotron(100.0, &p);
        let hi = synchrotron(1000.0, &p);
        let slope = (hi / lo).log10();
        assert!((slope + (p.index + 1.0) / 2.0).abs() < 1e-2, "slope {slope}");
    }
}
