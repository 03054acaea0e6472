//! Waveshaping and range-mapping helpers shared across the signal chain.

use std::f64::consts::PI;

/// Parabolic sine approximation, valid for angles in [-PI, PI].
///
/// Two-stage parabola fit (extra precision term P = 0.225); max error is
/// about 0.1% of full scale, which is inaudible for control-rate LFOs and
/// much cheaper than `f64::sin` in the per-sample path.
pub fn parabolic_sine(angle: f64) -> f64 {
    const B: f64 = 4.0 / PI;
    const C: f64 = -4.0 / (PI * PI);
    const P: f64 = 0.225;

    let y = B * angle + C * angle * angle.abs();
    P * (y * y.abs() - y) + y
}

/// Arctangent soft clipper.
///
/// `saturation` controls the knee: 1.0 is nearly linear, larger values
/// approach a hard limiter. Output stays in [-1, 1] for inputs in [-1, 1];
/// the normalization is `atan(saturation)`, so inputs beyond unity can
/// exceed the nominal range (the drift path only ever feeds it bipolar
/// oscillator output).
pub fn atan_waveshape(x: f64, saturation: f64) -> f64 {
    if saturation <= 0.0 {
        return x;
    }
    (saturation * x).atan() / saturation.atan()
}

/// Map a unipolar [0, 1] value to bipolar [-1, 1].
pub fn unipolar_to_bipolar(x: f64) -> f64 {
    2.0 * x - 1.0
}

/// Map a bipolar [-1, 1] value to unipolar [0, 1].
pub fn bipolar_to_unipolar(x: f64) -> f64 {
    0.5 * x + 0.5
}

/// Remap a bipolar [-1, 1] modulator value onto [min, max], centered on the
/// midpoint of the range.
pub fn bipolar_modulation(value: f64, min: f64, max: f64) -> f64 {
    let half_range = (max - min) / 2.0;
    let midpoint = min + half_range;
    value * half_range + midpoint
}

/// Normalize `value` from [min, max] to [0, 1]. Not clamped.
pub fn normalize_range(value: f64, min: f64, max: f64) -> f64 {
    (value - min) / (max - min)
}

/// Linear map from [in_min, in_max] to [out_min, out_max]. Not clamped.
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min)
}
