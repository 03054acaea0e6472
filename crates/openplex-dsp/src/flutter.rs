//! Triple-oscillator flutter bank — capstan / pinch-roller modulation.
//!
//! Three LFOs at mutually detuned rates model the distinct mechanical
//! periodicities of the transport. Start phases are re-randomized on every
//! `reset` so the three never line up; the averaged sum is high-pass
//! filtered to strip DC and sub-audio drift before it reaches the
//! modulation mix.

use crate::filters::Biquad;
use crate::lfo::{PhasedLfo, PhasedLfoParams, Waveform};
use crate::shaping::bipolar_to_unipolar;
use crate::SignalGenerator;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const NUM_FLUTTER_LFOS: usize = 3;

/// Default transport rates in Hz: capstan once-around, pinch-roller
/// once-around, and motor cogging.
pub const DEFAULT_FLUTTER_RATES_HZ: [f64; NUM_FLUTTER_LFOS] = [2.5, 5.0, 26.0];

/// High-pass cutoff for DC/sub-audio rejection.
pub const FLUTTER_HPF_HZ: f64 = 0.01;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FlutterParams {
    pub frequency_hz: [f64; NUM_FLUTTER_LFOS],
    pub start_phase: [f64; NUM_FLUTTER_LFOS],
    pub amplitude: [f64; NUM_FLUTTER_LFOS],
    pub output_amplitude: f64,
}

impl Default for FlutterParams {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FLUTTER_RATES_HZ,
            start_phase: [0.0; NUM_FLUTTER_LFOS],
            amplitude: [0.5; NUM_FLUTTER_LFOS],
            output_amplitude: 1.0,
        }
    }
}

/// Bank of three phase-offset LFOs, averaged and high-pass filtered.
pub struct FlutterBank {
    params: FlutterParams,
    lfos: [PhasedLfo; NUM_FLUTTER_LFOS],
    hpf: Biquad,
    seed: u64,
    rng: SmallRng,
}

impl FlutterBank {
    pub fn new(seed: u64) -> Self {
        Self {
            params: FlutterParams::default(),
            lfos: std::array::from_fn(|_| PhasedLfo::new()),
            hpf: Biquad::passthrough(),
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn params(&self) -> FlutterParams {
        self.params
    }

    /// Per-oscillator frequency and amplitude are pushed through to the
    /// bank members; start phases stay whatever the last `reset`
    /// randomized them to.
    pub fn set_params(&mut self, params: FlutterParams) {
        for (i, lfo) in self.lfos.iter_mut().enumerate() {
            let mut lfo_params = lfo.params();
            lfo_params.frequency_hz = params.frequency_hz[i];
            lfo_params.amplitude = params.amplitude[i];
            lfo.set_params(lfo_params);
        }
        self.params = params;
    }
}

impl SignalGenerator for FlutterBank {
    type Output = f64;

    fn reset(&mut self, sample_rate: f64) {
        if sample_rate <= 0.0 {
            return;
        }
        self.rng = SmallRng::seed_from_u64(self.seed);
        for (i, lfo) in self.lfos.iter_mut().enumerate() {
            let draw = self.rng.random::<f64>() * 2.0 - 1.0;
            lfo.set_params(PhasedLfoParams {
                frequency_hz: self.params.frequency_hz[i],
                waveform: Waveform::Sine,
                start_phase: bipolar_to_unipolar(draw),
                amplitude: self.params.amplitude[i],
            });
            lfo.reset(sample_rate);
        }
        self.hpf = Biquad::butterworth_highpass(FLUTTER_HPF_HZ, sample_rate);
    }

    fn render(&mut self) -> f64 {
        let [a, b, c] = &mut self.lfos;
        let avg = (a.render().normal + b.render().normal + c.render().normal) * (1.0 / 3.0);
        self.hpf.process(avg) * self.params.output_amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    #[test]
    fn test_start_phases_are_decorrelated() {
        let mut bank = FlutterBank::new(0xF1);
        bank.reset(SR);
        let phases: Vec<f64> = bank.lfos.iter().map(|l| l.params().start_phase).collect();
        assert!((phases[0] - phases[1]).abs() > 1e-6);
        assert!((phases[1] - phases[2]).abs() > 1e-6);
        for &p in &phases {
            assert!((0.0..1.0).contains(&p), "start phase out of range: {p}");
        }
    }

    #[test]
    fn test_output_bounded_by_amplitudes() {
        let mut bank = FlutterBank::new(3);
        bank.reset(SR);
        for _ in 0..48_000 {
            let y = bank.render();
            // Three 0.5-amplitude LFOs averaged can never exceed 0.5; the
            // high-pass adds at most a small transient overshoot.
            assert!(y.abs() < 0.6, "flutter escaped expected range: {y}");
        }
    }

    #[test]
    fn test_high_pass_removes_dc() {
        let mut bank = FlutterBank::new(11);
        bank.reset(SR);
        let n = (SR * 10.0) as usize;
        let mean: f64 = (0..n).map(|_| bank.render()).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.02, "flutter output has DC: {mean}");
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let mut a = FlutterBank::new(77);
        let mut b = FlutterBank::new(77);
        a.reset(SR);
        b.reset(SR);
        for _ in 0..1000 {
            assert_eq!(a.render(), b.render());
        }
    }

    #[test]
    fn test_output_amplitude_scales() {
        let mut bank = FlutterBank::new(5);
        let mut params = bank.params();
        params.output_amplitude = 0.0;
        bank.set_params(params);
        bank.reset(SR);
        for _ in 0..100 {
            assert_eq!(bank.render(), 0.0);
        }
    }

    #[test]
    fn test_params_roundtrip() {
        let p = FlutterParams {
            frequency_hz: [3.0, 6.0, 20.0],
            start_phase: [0.1, 0.2, 0.3],
            amplitude: [0.4, 0.4, 0.4],
            output_amplitude: 0.8,
        };
        let mut bank = FlutterBank::new(0);
        bank.set_params(p);
        assert_eq!(bank.params(), p);
    }

    #[test]
    fn test_zero_sample_rate_is_guarded() {
        let mut bank = FlutterBank::new(0);
        bank.reset(0.0);
        assert!(bank.render().is_finite());
    }
}
