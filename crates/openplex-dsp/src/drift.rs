//! Drift ("wow") source — mains-locked hum plus filtered noise.
//!
//! Slow quasi-random delay drift on real machines correlates with mains
//! hum coupling into the transport electronics. Here one LFO pinned at
//! mains frequency is soft-clipped through an arctangent shaper (tape and
//! transformer coupling are not linear) and summed with the smoothed
//! Gaussian channel of a noise source.

use crate::lfo::{PhasedLfo, PhasedLfoParams, Waveform};
use crate::noise::NoiseSource;
use crate::shaping::atan_waveshape;
use crate::SignalGenerator;

/// Mains frequency default (US line supply).
pub const MAINS_HZ: f64 = 60.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DriftParams {
    /// Arctangent shaper drive; 1.0 is a gentle knee.
    pub saturation: f64,
    /// Amplitude of the mains-frequency component.
    pub mains_amplitude: f64,
    /// Smoothing cutoff for the noise component.
    pub noise_cutoff_hz: f64,
    pub noise_amplitude: f64,
}

impl Default for DriftParams {
    fn default() -> Self {
        Self {
            saturation: 1.0,
            mains_amplitude: 1.0,
            noise_cutoff_hz: 10_000.0,
            noise_amplitude: 1.0,
        }
    }
}

/// Mains oscillator + filtered noise, combined per tick.
pub struct DriftSource {
    params: DriftParams,
    mains: PhasedLfo,
    noise: NoiseSource,
}

impl DriftSource {
    pub fn new(seed: u64) -> Self {
        Self {
            params: DriftParams::default(),
            mains: PhasedLfo::new(),
            noise: NoiseSource::new(seed),
        }
    }

    pub fn params(&self) -> DriftParams {
        self.params
    }

    pub fn set_params(&mut self, params: DriftParams) {
        let mut mains_params = self.mains.params();
        mains_params.amplitude = params.mains_amplitude;
        self.mains.set_params(mains_params);

        let mut noise_params = self.noise.params();
        noise_params.lpf_cutoff_hz = params.noise_cutoff_hz;
        noise_params.output_amplitude = params.noise_amplitude;
        self.noise.set_params(noise_params);

        self.params = params;
    }
}

impl SignalGenerator for DriftSource {
    type Output = f64;

    fn reset(&mut self, sample_rate: f64) {
        if sample_rate <= 0.0 {
            return;
        }
        self.mains.set_params(PhasedLfoParams {
            frequency_hz: MAINS_HZ,
            waveform: Waveform::Sine,
            start_phase: 0.0,
            amplitude: self.params.mains_amplitude,
        });
        self.mains.reset(sample_rate);

        let mut noise_params = self.noise.params();
        noise_params.lpf_cutoff_hz = self.params.noise_cutoff_hz;
        noise_params.output_amplitude = self.params.noise_amplitude;
        self.noise.set_params(noise_params);
        self.noise.reset(sample_rate);
    }

    fn render(&mut self) -> f64 {
        let hum = self.mains.render().normal;
        let shaped = atan_waveshape(hum, self.params.saturation);
        shaped + self.noise.render().filtered_gaussian
    }
}
