//! OpenPlex DSP library — Echoplex EP-3 delay-modulation signal chain.
//!
//! Pure DSP math with no audio framework dependencies. The root object is
//! [`modulator::DelayModulator`], which renders one modulated delay value
//! (in milliseconds) per audio sample for the downstream tape delay line.

// Generators
pub mod drift;
pub mod flutter;
pub mod lfo;
pub mod noise;

// Processors
pub mod comb;
pub mod filters;

// Root orchestrator
pub mod modulator;

// Waveshaping and range-mapping helpers
pub mod shaping;

/// A per-sample signal source: pulled once per tick by its owner.
///
/// `reset` must be called with a valid sample rate before the first
/// `render`; a non-positive rate leaves the generator in a safe neutral
/// state (no coefficient cook, silent output).
pub trait SignalGenerator {
    type Output;

    fn reset(&mut self, sample_rate: f64);
    fn render(&mut self) -> Self::Output;
}

/// A per-sample mono processor.
pub trait SignalProcessor {
    fn reset(&mut self, sample_rate: f64);
    fn process(&mut self, input: f64) -> f64;
}
