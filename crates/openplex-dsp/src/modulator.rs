//! Delay modulator — root of the modulation chain.
//!
//! Combines the flutter bank and the drift source under a delay-time-
//! dependent depth curve, colors the mix through the comb filter, and adds
//! the nominal delay time back in. The downstream tape delay consumes the
//! result directly as its per-sample delay-time control, in milliseconds.

use crate::comb::{CombFilter, CombMode};
use crate::drift::DriftSource;
use crate::flutter::{FlutterBank, NUM_FLUTTER_LFOS};
use crate::shaping::{bipolar_modulation, map_range, normalize_range};
use crate::{SignalGenerator, SignalProcessor};

/// Valid nominal delay-time range of the instrument, in milliseconds.
pub const DELAY_TIME_MIN_MS: f64 = 90.0;
pub const DELAY_TIME_MAX_MS: f64 = 680.0;

/// Bipolar bound on the modulation excursion, in milliseconds.
pub const MODULATION_RANGE_MS: f64 = 5.0;

/// Comb ("scallop") delay derived from the nominal delay time: the full
/// 90-680 ms sweep maps linearly onto this window.
pub const SCALLOP_DELAY_MIN_MS: f64 = 0.5;
pub const SCALLOP_DELAY_MAX_MS: f64 = 5.0;

/// Depth-curve coefficients over the normalized delay time. The net slope
/// is positive: longer tape loops expose proportionally more drift depth.
pub const DEPTH_CURVE_RISE: f64 = 7.767857;
pub const DEPTH_CURVE_FALL: f64 = 4.646429;

/// Drift-depth scale factor for a normalized delay time in [0, 1].
fn drift_depth(normalized_delay: f64) -> f64 {
    1.0 + DEPTH_CURVE_RISE * normalized_delay - DEPTH_CURVE_FALL * normalized_delay
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ModulatorParams {
    pub lfo_frequency_hz: [f64; NUM_FLUTTER_LFOS],
    pub lfo_start_phase: [f64; NUM_FLUTTER_LFOS],
    pub lfo_amplitude: [f64; NUM_FLUTTER_LFOS],
    /// Flutter contribution, percent.
    pub lfo_depth_pct: f64,
    /// Drift contribution, percent.
    pub noise_depth_pct: f64,
    pub noise_filter_hz: f64,
    pub noise_filter_amplitude: f64,
    /// Nominal delay time requested by the host, milliseconds.
    pub delay_time_ms: f64,
    pub noise_saturation: f64,
    pub mains_noise_amplitude: f64,
}

impl Default for ModulatorParams {
    fn default() -> Self {
        Self {
            lfo_frequency_hz: crate::flutter::DEFAULT_FLUTTER_RATES_HZ,
            lfo_start_phase: [0.0; NUM_FLUTTER_LFOS],
            lfo_amplitude: [0.5; NUM_FLUTTER_LFOS],
            lfo_depth_pct: 50.0,
            noise_depth_pct: 50.0,
            // Voicing defaults: the mains component is coupled in lightly
            // and the drift noise is band-limited to 50 Hz.
            noise_filter_hz: 50.0,
            noise_filter_amplitude: 0.5,
            delay_time_ms: DELAY_TIME_MIN_MS,
            noise_saturation: 1.0,
            mains_noise_amplitude: 0.1,
        }
    }
}

/// Produces the modulated delay time, one value per audio sample.
pub struct DelayModulator {
    params: ModulatorParams,
    flutter: FlutterBank,
    drift: DriftSource,
    scallop: CombFilter,
}

impl DelayModulator {
    /// `seed` decorrelates the random streams of the owned components; the
    /// same seed reproduces the same modulation after every `reset`.
    pub fn new(seed: u64) -> Self {
        Self {
            params: ModulatorParams::default(),
            flutter: FlutterBank::new(seed),
            drift: DriftSource::new(seed.wrapping_mul(2654435761).wrapping_add(1)),
            scallop: CombFilter::new(),
        }
    }

    pub fn params(&self) -> ModulatorParams {
        self.params
    }

    /// Push sub-component fields through and commit the record. Reads from
    /// the incoming record directly, so sub-components never lag one
    /// update behind the committed state.
    pub fn set_params(&mut self, params: ModulatorParams) {
        self.propagate(&params);
        self.params = params;
    }

    fn propagate(&mut self, params: &ModulatorParams) {
        let mut flutter_params = self.flutter.params();
        flutter_params.frequency_hz = params.lfo_frequency_hz;
        flutter_params.start_phase = params.lfo_start_phase;
        flutter_params.amplitude = params.lfo_amplitude;
        self.flutter.set_params(flutter_params);

        let mut drift_params = self.drift.params();
        drift_params.noise_cutoff_hz = params.noise_filter_hz;
        drift_params.noise_amplitude = params.noise_filter_amplitude;
        drift_params.mains_amplitude = params.mains_noise_amplitude;
        drift_params.saturation = params.noise_saturation;
        self.drift.set_params(drift_params);

        let mut scallop_params = self.scallop.params();
        scallop_params.delay_ms = map_range(
            params.delay_time_ms,
            DELAY_TIME_MIN_MS,
            DELAY_TIME_MAX_MS,
            SCALLOP_DELAY_MIN_MS,
            SCALLOP_DELAY_MAX_MS,
        );
        self.scallop.set_params(scallop_params);
    }
}

impl SignalGenerator for DelayModulator {
    type Output = f64;

    fn reset(&mut self, sample_rate: f64) {
        if sample_rate <= 0.0 {
            return;
        }
        self.flutter.reset(sample_rate); // re-randomizes flutter phases
        self.drift.reset(sample_rate);
        self.scallop.reset(sample_rate);

        let mut scallop_params = self.scallop.params();
        scallop_params.mode = CombMode::InverseComb;
        self.scallop.set_params(scallop_params);

        let params = self.params;
        self.propagate(&params);
    }

    /// One modulated delay value in milliseconds.
    fn render(&mut self) -> f64 {
        let params = self.params;
        let lfo_depth = params.lfo_depth_pct / 100.0;
        let noise_depth = params.noise_depth_pct / 100.0;

        let normalized =
            normalize_range(params.delay_time_ms, DELAY_TIME_MIN_MS, DELAY_TIME_MAX_MS);
        let depth = drift_depth(normalized);

        let drift = self.drift.render();
        let flutter = self.flutter.render();

        let drift_factor = bipolar_modulation(
            drift * noise_depth * depth,
            -MODULATION_RANGE_MS,
            MODULATION_RANGE_MS,
        );
        let flutter_factor = bipolar_modulation(
            flutter * lfo_depth,
            -MODULATION_RANGE_MS,
            MODULATION_RANGE_MS,
        );

        let raw = drift * drift_factor + flutter * flutter_factor;
        self.scallop.process(raw) + params.delay_time_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    #[test]
    fn test_depth_curve_is_monotonic_rising() {
        let mut prev = f64::NEG_INFINITY;
        let mut delay = DELAY_TIME_MIN_MS;
        while delay <= DELAY_TIME_MAX_MS {
            let depth = drift_depth(normalize_range(delay, DELAY_TIME_MIN_MS, DELAY_TIME_MAX_MS));
            assert!(depth > prev, "depth fell at {delay} ms");
            prev = depth;
            delay += 10.0;
        }
    }

    #[test]
    fn test_depth_is_unity_at_minimum_delay() {
        assert!((drift_depth(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scallop_delay_tracks_nominal_delay() {
        let mut modulator = DelayModulator::new(0);
        let mut params = modulator.params();

        params.delay_time_ms = DELAY_TIME_MIN_MS;
        modulator.set_params(params);
        assert!((modulator.scallop.params().delay_ms - SCALLOP_DELAY_MIN_MS).abs() < 1e-12);

        params.delay_time_ms = DELAY_TIME_MAX_MS;
        modulator.set_params(params);
        assert!((modulator.scallop.params().delay_ms - SCALLOP_DELAY_MAX_MS).abs() < 1e-12);
    }

    #[test]
    fn test_set_params_reaches_subcomponents_immediately() {
        let mut modulator = DelayModulator::new(0);
        let mut params = modulator.params();
        params.mains_noise_amplitude = 0.3;
        params.noise_filter_hz = 80.0;
        params.noise_filter_amplitude = 0.25;
        params.noise_saturation = 2.0;
        params.lfo_amplitude = [0.4, 0.4, 0.4];
        modulator.set_params(params);

        let drift = modulator.drift.params();
        assert_eq!(drift.mains_amplitude, 0.3);
        assert_eq!(drift.noise_cutoff_hz, 80.0);
        assert_eq!(drift.noise_amplitude, 0.25);
        assert_eq!(drift.saturation, 2.0);
        assert_eq!(modulator.flutter.params().amplitude, [0.4, 0.4, 0.4]);
    }

    #[test]
    fn test_reset_forces_inverse_comb_mode() {
        let mut modulator = DelayModulator::new(0);
        modulator.reset(SR);
        assert_eq!(modulator.scallop.params().mode, CombMode::InverseComb);
    }

    #[test]
    fn test_bounded_excursion_end_to_end() {
        // 48 kHz, 90 ms nominal, noise depth 100%, LFO depth 0.5%, mains
        // amplitude 0.1, noise filter 50 Hz at amplitude 0.5.
        let mut modulator = DelayModulator::new(0xEC40);
        let mut params = modulator.params();
        params.delay_time_ms = 90.0;
        params.noise_depth_pct = 100.0;
        params.lfo_depth_pct = 0.5;
        params.mains_noise_amplitude = 0.1;
        params.noise_filter_hz = 50.0;
        params.noise_filter_amplitude = 0.5;
        modulator.set_params(params);
        modulator.reset(SR);

        let first = modulator.render();
        assert!(
            (90.0 - MODULATION_RANGE_MS..=90.0 + MODULATION_RANGE_MS).contains(&first),
            "first sample escaped the modulation bound: {first}"
        );
        for _ in 0..SR as usize {
            let y = modulator.render();
            assert!(
                (90.0 - MODULATION_RANGE_MS..=90.0 + MODULATION_RANGE_MS).contains(&y),
                "modulated delay escaped the bound: {y}"
            );
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let mut a = DelayModulator::new(99);
        let mut b = DelayModulator::new(99);
        a.reset(SR);
        b.reset(SR);
        for _ in 0..2000 {
            assert_eq!(a.render(), b.render());
        }
    }

    #[test]
    fn test_different_seeds_decorrelate() {
        let mut a = DelayModulator::new(1);
        let mut b = DelayModulator::new(2);
        a.reset(SR);
        b.reset(SR);
        let mut diff = 0.0;
        for _ in 0..2000 {
            diff += (a.render() - b.render()).abs();
        }
        assert!(diff > 0.0);
    }

    #[test]
    fn test_params_roundtrip() {
        let p = ModulatorParams {
            lfo_frequency_hz: [2.0, 4.0, 20.0],
            lfo_start_phase: [0.0, 0.25, 0.5],
            lfo_amplitude: [0.1, 0.2, 0.3],
            lfo_depth_pct: 12.5,
            noise_depth_pct: 80.0,
            noise_filter_hz: 200.0,
            noise_filter_amplitude: 0.75,
            delay_time_ms: 345.0,
            noise_saturation: 1.5,
            mains_noise_amplitude: 0.2,
        };
        let mut modulator = DelayModulator::new(0);
        modulator.set_params(p);
        assert_eq!(modulator.params(), p);
    }

    #[test]
    fn test_zero_sample_rate_is_guarded() {
        let mut modulator = DelayModulator::new(0);
        modulator.reset(0.0);
        assert!(modulator.render().is_finite());
    }
}
