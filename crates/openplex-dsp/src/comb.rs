//! Resonant comb filter — the "scalloping" stage of the modulation chain.
//!
//! Single-tap delay-line filter with two write rules. In comb mode the
//! delayed sample is fed back into the write path, which turns the plain
//! feed-forward comb into a resonant one. In inverse-comb mode the line
//! stores the raw input and the output blends dry and delayed signal.

use crate::SignalProcessor;

/// Fixed maximum delay window allocated at reset. Must cover the largest
/// delay the modulator's remapping can request (5 ms) with a wide margin.
pub const MAX_COMB_DELAY_MS: f64 = 500.0;

/// Circular buffer with fractional-delay interpolated reads.
///
/// The read index always trails the write index by the requested delay;
/// sub-sample offsets are linearly interpolated.
pub struct DelayLine {
    buffer: Vec<f64>,
    write_pos: usize,
    samples_per_ms: f64,
}

impl DelayLine {
    /// Zero-capacity line; reads return silence until a sized line is
    /// allocated at reset.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            write_pos: 0,
            samples_per_ms: 0.0,
        }
    }

    /// Allocate for `max_delay_ms` of history at `sample_rate`, cleared.
    pub fn with_capacity_ms(sample_rate: f64, max_delay_ms: f64) -> Self {
        let len = (max_delay_ms * sample_rate / 1000.0).ceil() as usize + 2;
        Self {
            buffer: vec![0.0; len],
            write_pos: 0,
            samples_per_ms: sample_rate / 1000.0,
        }
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Largest delay this line can serve, in milliseconds.
    pub fn max_delay_ms(&self) -> f64 {
        if self.samples_per_ms > 0.0 {
            (self.buffer.len().saturating_sub(2)) as f64 / self.samples_per_ms
        } else {
            0.0
        }
    }

    /// Interpolated read at a fractional delay. Out-of-window times are
    /// clamped to the buffer bounds rather than wrapped.
    pub fn read_at_ms(&self, delay_ms: f64) -> f64 {
        let len = self.buffer.len();
        if len == 0 {
            return 0.0;
        }
        let delay_samples = (delay_ms * self.samples_per_ms).clamp(0.0, (len - 2) as f64);
        let whole = delay_samples.floor() as usize;
        let frac = delay_samples - whole as f64;

        let i0 = (self.write_pos + len - whole) % len;
        let i1 = (i0 + len - 1) % len;
        (1.0 - frac) * self.buffer[i0] + frac * self.buffer[i1]
    }

    /// Store one sample and advance the write cursor.
    pub fn write(&mut self, x: f64) {
        if self.buffer.is_empty() {
            return;
        }
        self.buffer[self.write_pos] = x;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CombMode {
    /// Feed-forward output with feedback applied on write (resonant).
    #[default]
    Comb,
    /// Dry + delayed blend; the line stores the raw input.
    InverseComb,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CombParams {
    pub mode: CombMode,
    pub delay_ms: f64,
    pub feedback_gain: f64,
    pub dry_gain: f64,
    pub wet_gain: f64,
}

impl Default for CombParams {
    fn default() -> Self {
        Self {
            mode: CombMode::Comb,
            delay_ms: 0.0,
            feedback_gain: 0.0,
            dry_gain: 0.5,
            wet_gain: 0.5,
        }
    }
}

pub struct CombFilter {
    params: CombParams,
    line: DelayLine,
}

impl CombFilter {
    pub fn new() -> Self {
        Self {
            params: CombParams::default(),
            line: DelayLine::new(),
        }
    }

    pub fn params(&self) -> CombParams {
        self.params
    }

    /// Stores the record as given; delay times beyond the allocated window
    /// are clamped at read time, not rewritten here.
    pub fn set_params(&mut self, params: CombParams) {
        self.params = params;
    }
}

impl Default for CombFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalProcessor for CombFilter {
    fn reset(&mut self, sample_rate: f64) {
        if sample_rate <= 0.0 {
            return;
        }
        self.line = DelayLine::with_capacity_ms(sample_rate, MAX_COMB_DELAY_MS);
    }

    fn process(&mut self, x: f64) -> f64 {
        let delayed = self.line.read_at_ms(self.params.delay_ms);
        match self.params.mode {
            CombMode::Comb => {
                self.line.write(x + delayed * self.params.feedback_gain);
                delayed * self.params.wet_gain
            }
            CombMode::InverseComb => {
                self.line.write(x);
                delayed * self.params.wet_gain + x * self.params.dry_gain
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    #[test]
    fn test_comb_impulse_response() {
        let mut comb = CombFilter::new();
        comb.set_params(CombParams {
            mode: CombMode::Comb,
            delay_ms: 10.0, // 480 samples at 48 kHz
            feedback_gain: 0.5,
            dry_gain: 0.5,
            wet_gain: 0.5,
        });
        comb.reset(SR);

        let mut out = Vec::with_capacity(1200);
        out.push(comb.process(1.0));
        for _ in 1..1200 {
            out.push(comb.process(0.0));
        }

        // No dry path in comb mode: silence until the first echo.
        for (n, &y) in out.iter().enumerate() {
            match n {
                480 => assert!((y - 0.5).abs() < 1e-12, "first echo: {y}"),
                960 => assert!((y - 0.25).abs() < 1e-12, "resonant repeat: {y}"),
                _ => assert!(y.abs() < 1e-12, "unexpected output at {n}: {y}"),
            }
        }
    }

    #[test]
    fn test_inverse_comb_dc_convergence() {
        let feedback = 0.9;
        let (dry, wet) = (0.5, 0.5);
        let mut comb = CombFilter::new();
        comb.set_params(CombParams {
            mode: CombMode::InverseComb,
            delay_ms: 5.0,
            feedback_gain: feedback,
            dry_gain: dry,
            wet_gain: wet,
        });
        comb.reset(SR);

        let mut last = 0.0;
        for _ in 0..10_000 {
            last = comb.process(1.0);
        }
        // No feedback on write in this mode: DC settles at dry + wet,
        // inside the resonant bound dry + wet / (1 - feedback).
        assert!((last - (dry + wet)).abs() < 1e-12, "DC settled at {last}");
        assert!(last <= dry + wet / (1.0 - feedback));
    }

    #[test]
    fn test_fractional_delay_interpolates() {
        // 1 kHz rate makes delay_ms == delay in samples.
        let mut comb = CombFilter::new();
        comb.set_params(CombParams {
            mode: CombMode::Comb,
            delay_ms: 24.5,
            feedback_gain: 0.0,
            dry_gain: 0.0,
            wet_gain: 1.0,
        });
        comb.reset(1000.0);

        let mut out = Vec::new();
        out.push(comb.process(1.0));
        for _ in 1..40 {
            out.push(comb.process(0.0));
        }
        assert!((out[24] - 0.5).abs() < 1e-12, "early half: {}", out[24]);
        assert!((out[25] - 0.5).abs() < 1e-12, "late half: {}", out[25]);
    }

    #[test]
    fn test_reset_reallocates_and_clears() {
        let mut comb = CombFilter::new();
        comb.set_params(CombParams {
            mode: CombMode::InverseComb,
            delay_ms: 1.0,
            feedback_gain: 0.0,
            dry_gain: 0.0,
            wet_gain: 1.0,
        });
        comb.reset(SR);
        for _ in 0..1000 {
            comb.process(1.0);
        }
        comb.reset(SR);
        // History gone: only silence can come back out.
        for _ in 0..200 {
            assert_eq!(comb.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_window_covers_modulator_range() {
        let line = DelayLine::with_capacity_ms(SR, MAX_COMB_DELAY_MS);
        assert!(line.max_delay_ms() >= 5.0);
        assert!(line.max_delay_ms() >= MAX_COMB_DELAY_MS);
    }

    #[test]
    fn test_out_of_window_delay_is_clamped() {
        let mut comb = CombFilter::new();
        comb.set_params(CombParams {
            mode: CombMode::Comb,
            delay_ms: MAX_COMB_DELAY_MS * 4.0,
            feedback_gain: 0.0,
            dry_gain: 0.5,
            wet_gain: 0.5,
        });
        comb.reset(SR);
        for _ in 0..1000 {
            assert!(comb.process(1.0).is_finite());
        }
    }

    #[test]
    fn test_unreset_filter_is_silent_and_safe() {
        let mut comb = CombFilter::new();
        assert_eq!(comb.process(1.0), 0.0);
        comb.reset(0.0);
        assert_eq!(comb.process(1.0), 0.0);
    }

    #[test]
    fn test_params_roundtrip() {
        let p = CombParams {
            mode: CombMode::InverseComb,
            delay_ms: 3.25,
            feedback_gain: 0.2,
            dry_gain: 0.7,
            wet_gain: 0.3,
        };
        let mut comb = CombFilter::new();
        comb.set_params(p);
        assert_eq!(comb.params(), p);
    }
}
