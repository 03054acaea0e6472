//! Quadrature LFO — the basic generator of the modulation chain.
//!
//! Single phase accumulator with a derived quadrature accumulator held
//! exactly a quarter cycle ahead. Every tick produces four synchronized
//! waveform views (normal, quadrature +/-, inverted) so downstream
//! composites can pick phase-accurate derived signals without running a
//! second oscillator.

use crate::shaping::{parabolic_sine, unipolar_to_bipolar};
use crate::SignalGenerator;
use std::f64::consts::{PI, TAU};

/// Quadrature phase offset: 0.25 of a cycle = 90 degrees.
const QUADRATURE_OFFSET: f64 = 0.25;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Saw,
}

/// One tick of generator output. All channels are bipolar [-1, 1] before
/// amplitude scaling; consumed immediately, never stored across ticks.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuadOutput {
    pub normal: f64,
    pub quad_pos: f64,
    pub quad_neg: f64,
    pub inverted: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LfoParams {
    pub frequency_hz: f64,
    pub waveform: Waveform,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            frequency_hz: 0.0,
            waveform: Waveform::Sine,
        }
    }
}

/// Phase-accumulator LFO with quadrature outputs.
pub struct Lfo {
    params: LfoParams,
    sample_rate: f64,
    phase: f64,
    quad_phase: f64,
    phase_inc: f64,
}

impl Lfo {
    pub fn new() -> Self {
        Self {
            params: LfoParams::default(),
            sample_rate: 0.0,
            phase: 0.0,
            quad_phase: QUADRATURE_OFFSET,
            phase_inc: 0.0,
        }
    }

    pub fn params(&self) -> LfoParams {
        self.params
    }

    /// Replace the parameter record wholesale. The phase increment is
    /// recooked immediately so mid-stream frequency changes take effect on
    /// the next tick without disturbing the current phase.
    pub fn set_params(&mut self, params: LfoParams) {
        self.params = params;
        if self.sample_rate > 0.0 {
            self.phase_inc = self.params.frequency_hz / self.sample_rate;
        }
    }

    /// Reset with an explicit start phase in [0, 1).
    pub fn reset_to_phase(&mut self, sample_rate: f64, start_phase: f64) {
        if sample_rate <= 0.0 {
            return;
        }
        self.sample_rate = sample_rate;
        self.phase_inc = self.params.frequency_hz / sample_rate;
        self.phase = wrap(start_phase);
        self.quad_phase = wrap(self.phase + QUADRATURE_OFFSET);
    }

    fn evaluate(&self, phase: f64) -> f64 {
        match self.params.waveform {
            Waveform::Sine => {
                let angle = phase * TAU - PI;
                parabolic_sine(-angle)
            }
            Waveform::Triangle => {
                let ramp = unipolar_to_bipolar(phase);
                2.0 * ramp.abs() - 1.0
            }
            Waveform::Saw => unipolar_to_bipolar(phase),
        }
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalGenerator for Lfo {
    type Output = QuadOutput;

    fn reset(&mut self, sample_rate: f64) {
        self.reset_to_phase(sample_rate, 0.0);
    }

    /// Fixed order of operations: wrap-check the primary phase, derive the
    /// quadrature phase from it (+0.25, wrapped), evaluate both, then
    /// advance the primary for the next tick. The quadrature output leads
    /// by exactly 90 degrees regardless of mid-stream frequency changes.
    fn render(&mut self) -> QuadOutput {
        self.phase = wrap(self.phase);
        self.quad_phase = wrap(self.phase + QUADRATURE_OFFSET);

        let normal = self.evaluate(self.phase);
        let quad = self.evaluate(self.quad_phase);

        self.phase = wrap(self.phase + self.phase_inc);

        QuadOutput {
            normal,
            quad_pos: quad,
            quad_neg: -quad,
            inverted: -normal,
        }
    }
}

fn wrap(phase: f64) -> f64 {
    if phase >= 1.0 {
        phase - 1.0
    } else if phase < 0.0 {
        phase + 1.0
    } else {
        phase
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PhasedLfoParams {
    pub frequency_hz: f64,
    pub waveform: Waveform,
    /// Applied once at `reset`, not at construction; re-randomizing the
    /// start phase requires another `reset`.
    pub start_phase: f64,
    pub amplitude: f64,
}

impl Default for PhasedLfoParams {
    fn default() -> Self {
        Self {
            frequency_hz: 0.0,
            waveform: Waveform::Sine,
            start_phase: 0.0,
            amplitude: 1.0,
        }
    }
}

/// LFO with an explicit start phase and output amplitude, so multiple
/// instances can run mutually phase-offset and independently scaled.
pub struct PhasedLfo {
    params: PhasedLfoParams,
    osc: Lfo,
}

impl PhasedLfo {
    pub fn new() -> Self {
        Self {
            params: PhasedLfoParams::default(),
            osc: Lfo::new(),
        }
    }

    pub fn params(&self) -> PhasedLfoParams {
        self.params
    }

    pub fn set_params(&mut self, params: PhasedLfoParams) {
        self.params = params;
        self.osc.set_params(LfoParams {
            frequency_hz: params.frequency_hz,
            waveform: params.waveform,
        });
    }
}

impl Default for PhasedLfo {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalGenerator for PhasedLfo {
    type Output = QuadOutput;

    fn reset(&mut self, sample_rate: f64) {
        self.osc.reset_to_phase(sample_rate, self.params.start_phase);
    }

    fn render(&mut self) -> QuadOutput {
        let raw = self.osc.render();
        // Amplitude applies to the two primary channels; the negative
        // channels stay exact negated copies.
        let normal = raw.normal * self.params.amplitude;
        let quad = raw.quad_pos * self.params.amplitude;
        QuadOutput {
            normal,
            quad_pos: quad,
            quad_neg: -quad,
            inverted: -normal,
        }
    }
}
