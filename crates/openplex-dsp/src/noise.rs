//! Wideband noise source with low-pass-smoothed variants.
//!
//! One persistently seeded generator per instance. Reconstructing the
//! random engine on every tick collapses the draw sequence and silently
//! degrades randomness quality, so the engine lives in the struct and is
//! reseeded only at `reset`.

use crate::filters::Biquad;
use crate::SignalGenerator;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Smoothing filter default cutoff installed at reset.
pub const DEFAULT_SMOOTHING_HZ: f64 = 100.0;

/// One tick of noise output: raw and smoothed variants of each
/// distribution, already scaled by the output amplitude.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoiseOutput {
    pub white: f64,
    pub filtered_white: f64,
    pub gaussian: f64,
    pub filtered_gaussian: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct NoiseParams {
    pub lpf_cutoff_hz: f64,
    pub output_amplitude: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            lpf_cutoff_hz: DEFAULT_SMOOTHING_HZ,
            output_amplitude: 1.0,
        }
    }
}

/// Uniform + Gaussian noise generator with per-stream smoothing filters.
pub struct NoiseSource {
    params: NoiseParams,
    sample_rate: f64,
    seed: u64,
    rng: SmallRng,
    // Two taps sharing one cutoff, so the streams stay independent.
    white_lpf: Biquad,
    gaussian_lpf: Biquad,
}

impl NoiseSource {
    /// `seed` comes from the process-level entropy source of the host; the
    /// same seed reproduces the same draw sequence after every `reset`.
    pub fn new(seed: u64) -> Self {
        Self {
            params: NoiseParams::default(),
            sample_rate: 0.0,
            seed,
            rng: SmallRng::seed_from_u64(seed),
            white_lpf: Biquad::passthrough(),
            gaussian_lpf: Biquad::passthrough(),
        }
    }

    pub fn params(&self) -> NoiseParams {
        self.params
    }

    pub fn set_params(&mut self, params: NoiseParams) {
        self.params = params;
        if self.sample_rate > 0.0 {
            self.white_lpf
                .set_butterworth_lowpass(params.lpf_cutoff_hz, self.sample_rate);
            self.gaussian_lpf
                .set_butterworth_lowpass(params.lpf_cutoff_hz, self.sample_rate);
        }
    }
}

impl SignalGenerator for NoiseSource {
    type Output = NoiseOutput;

    fn reset(&mut self, sample_rate: f64) {
        if sample_rate <= 0.0 {
            return;
        }
        self.sample_rate = sample_rate;
        self.rng = SmallRng::seed_from_u64(self.seed);
        self.white_lpf = Biquad::butterworth_lowpass(self.params.lpf_cutoff_hz, sample_rate);
        self.gaussian_lpf = Biquad::butterworth_lowpass(self.params.lpf_cutoff_hz, sample_rate);
    }

    fn render(&mut self) -> NoiseOutput {
        let white = self.rng.random::<f64>() * 2.0 - 1.0;
        let gaussian: f64 = self.rng.sample(StandardNormal);

        let amp = self.params.output_amplitude;
        NoiseOutput {
            white: white * amp,
            filtered_white: self.white_lpf.process(white) * amp,
            gaussian: gaussian * amp,
            filtered_gaussian: self.gaussian_lpf.process(gaussian) * amp,
        }
    }
}
