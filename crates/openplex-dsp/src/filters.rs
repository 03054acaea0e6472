//! Biquad filters for noise smoothing and DC/sub-audio rejection.
//!
//! Coefficients follow the Audio EQ Cookbook; state is Direct Form II
//! Transposed, which keeps the register count at two per filter.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

#[derive(Clone, Copy, Debug, Default)]
struct Coeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Coeffs {
    fn lowpass(cutoff_hz: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;

        let b1 = 1.0 - cos_w0;
        Self {
            b0: b1 / 2.0 / a0,
            b1: b1 / a0,
            b2: b1 / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn highpass(cutoff_hz: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;

        let b1 = -(1.0 + cos_w0);
        Self {
            b0: -b1 / 2.0 / a0,
            b1: b1 / a0,
            b2: -b1 / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// Second-order IIR section.
pub struct Biquad {
    coeffs: Coeffs,
    s1: f64,
    s2: f64,
}

impl Biquad {
    /// Unity passthrough, for construction before the sample rate is known.
    pub fn passthrough() -> Self {
        Self {
            coeffs: Coeffs {
                b0: 1.0,
                ..Coeffs::default()
            },
            s1: 0.0,
            s2: 0.0,
        }
    }

    /// Butterworth low-pass (Q = 1/sqrt(2), maximally flat passband).
    pub fn butterworth_lowpass(cutoff_hz: f64, sample_rate: f64) -> Self {
        Self {
            coeffs: Coeffs::lowpass(cutoff_hz, FRAC_1_SQRT_2, sample_rate),
            s1: 0.0,
            s2: 0.0,
        }
    }

    /// Butterworth high-pass (Q = 1/sqrt(2)).
    pub fn butterworth_highpass(cutoff_hz: f64, sample_rate: f64) -> Self {
        Self {
            coeffs: Coeffs::highpass(cutoff_hz, FRAC_1_SQRT_2, sample_rate),
            s1: 0.0,
            s2: 0.0,
        }
    }

    /// Recook as low-pass without touching filter state.
    pub fn set_butterworth_lowpass(&mut self, cutoff_hz: f64, sample_rate: f64) {
        self.coeffs = Coeffs::lowpass(cutoff_hz, FRAC_1_SQRT_2, sample_rate);
    }

    /// Recook as high-pass without touching filter state.
    pub fn set_butterworth_highpass(&mut self, cutoff_hz: f64, sample_rate: f64) {
        self.coeffs = Coeffs::highpass(cutoff_hz, FRAC_1_SQRT_2, sample_rate);
    }

    pub fn process(&mut self, x: f64) -> f64 {
        let c = self.coeffs;
        let y = c.b0 * x + self.s1;
        self.s1 = c.b1 * x - c.a1 * y + self.s2;
        self.s2 = c.b2 * x - c.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}
