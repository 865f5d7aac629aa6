//! Power-law family: plain, shifted, broken, doubly broken, and the two
//! smoothly broken variants.

use std::f64::consts::{LN_2, LN_10};

use super::piecewise::{Boundary, region};

/// `m·x + b`.
pub fn linear(x: f64, m: f64, b: f64) -> f64 {
    m * x + b
}

/// `A·(x/Epiv)^index`.
pub fn power_law(x: f64, a: f64, e_piv: f64, index: f64) -> f64 {
    a * (x / e_piv).powf(index)
}

/// `norm·((x − t0)/pivot)^index`, the time-domain form with a zero point.
pub fn power_law_t0(x: f64, norm: f64, index: f64, t0: f64, pivot: f64) -> f64 {
    norm * ((x - t0) / pivot).powf(index)
}

/// Parameters of [`broken_pl`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrokenPl {
    pub norm: f64,
    pub indx1: f64,
    pub break_point: f64,
    pub indx2: f64,
    pub t0: f64,
    pub pivot: f64,
}

impl BrokenPl {
    fn lower(&self, x: f64) -> f64 {
        self.norm * ((x - self.t0) / self.pivot).powf(self.indx1)
    }

    fn upper(&self, x: f64) -> f64 {
        self.norm
            * ((self.break_point - self.t0) / self.pivot).powf(self.indx1 - self.indx2)
            * ((x - self.t0) / self.pivot).powf(self.indx2)
    }
}

/// Power law with one break; `x < breakPoint` uses `indx1`, else `indx2`.
pub fn broken_pl(x: f64, p: &BrokenPl) -> f64 {
    match region(x, &[p.break_point], Boundary::UpperClosed) {
        0 => p.lower(x),
        _ => p.upper(x),
    }
}

/// Parameters of [`power_law_2breaks`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw2Breaks {
    pub a: f64,
    pub pivot: f64,
    pub index1: f64,
    pub break_e1: f64,
    pub index1to2: f64,
    pub break_e2: f64,
    pub index2: f64,
}

impl PowerLaw2Breaks {
    fn segment(&self, which: usize, x: f64) -> f64 {
        let first = |x: f64| (x / self.pivot).powf(self.index1);
        let second = |x: f64| first(self.break_e1) * (x / self.break_e1).powf(self.index1to2);
        let third = |x: f64| second(self.break_e2) * (x / self.break_e2).powf(self.index2);
        let shape = match which {
            0 => first(x),
            1 => second(x),
            _ => third(x),
        };
        self.a * shape
    }
}

/// Power law with two breaks at `breakE1 < breakE2` (thresholds owned by the
/// lower region). With `breakE1 > breakE2` the middle segment is empty and
/// every `x > breakE2` takes the third segment.
pub fn power_law_2breaks(x: f64, p: &PowerLaw2Breaks) -> f64 {
    let which = region(x, &[p.break_e1, p.break_e2], Boundary::LowerClosed);
    p.segment(which, x)
}

/// Parameters of [`ryde_bpl`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RydeBpl {
    pub norm: f64,
    pub indx1: f64,
    pub indx2: f64,
    pub break_time: f64,
    pub delta: f64,
    pub tn: f64,
    pub t0: f64,
}

/// Smoothly broken power law in log-time (hyperbolic-cosine blend).
pub fn ryde_bpl(x: f64, p: &RydeBpl) -> f64 {
    let eps = (p.indx2 - p.indx1) / 2.0;
    let phi = (p.indx2 + p.indx1) / 2.0;

    let num = (((x - p.t0) / p.break_time).log10() / p.delta).cosh();
    let den = ((p.tn / p.break_time).log10() / p.delta).cosh();

    p.norm * ((x - p.t0) / p.tn).powf(phi) * (num / den).powf(eps * p.delta * LN_10)
}

/// Below this `pcosh` argument the linear asymptote is used.
pub const PCOSH_LOW: f64 = -6.0;
/// Above this `pcosh` argument the linear asymptote is used.
pub const PCOSH_HIGH: f64 = 4.0;

/// Parameters of [`sbpl`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sbpl {
    pub log_n: f64,
    pub pivot: f64,
    pub indx1: f64,
    pub break_e: f64,
    pub break_scale: f64,
    pub indx2: f64,
}

/// `ln(cosh(arg))` scaled by `m·scale`, switching to the linear asymptotes
/// outside `[PCOSH_LOW, PCOSH_HIGH]` so `cosh` never overflows.
pub fn pcosh(arg: f64, m: f64, scale: f64) -> f64 {
    if arg < PCOSH_LOW {
        pcosh_below(arg, m, scale)
    } else if arg > PCOSH_HIGH {
        pcosh_above(arg, m, scale)
    } else {
        pcosh_exact(arg, m, scale)
    }
}

fn pcosh_below(arg: f64, m: f64, scale: f64) -> f64 {
    m * scale * (-arg - LN_2)
}

fn pcosh_above(arg: f64, m: f64, scale: f64) -> f64 {
    m * scale * (arg - LN_2)
}

fn pcosh_exact(arg: f64, m: f64, scale: f64) -> f64 {
    m * scale * ((arg.exp() + (-arg).exp()) / 2.0).ln()
}

/// Smoothly broken power law (energy domain, log-cosh break).
pub fn sbpl(energy: f64, p: &Sbpl) -> f64 {
    let b = (p.indx1 + p.indx2) / 2.0;
    let m = (p.indx2 - p.indx1) / 2.0;

    let arg_piv = (p.pivot / p.break_e).log10() / p.break_scale;
    let arg = (energy / p.break_e).log10() / p.break_scale;

    let pcosh_piv = pcosh(arg_piv, m, p.break_scale);
    let pcosh_val = pcosh(arg, m, p.break_scale);

    p.log_n * (energy / p.pivot).powf(b) * 10f64.powf(pcosh_val - pcosh_piv)
}
