pub mod descriptor;
pub mod dsp;
pub mod error;
pub mod rotary;
pub mod scale;

#[cfg(feature = "decode")]
pub mod decode;
#[cfg(feature = "loader")]
pub mod loader;

use crate::descriptor::EnvelopeDescriptor;
use crate::dsp::automation::ParamTimeline;
use crate::dsp::envelope::{Mseg, ParamRange};
use crate::error::Result;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the mcad_core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Render a note of `duration` seconds through the envelope described by
/// `desc`, release included, as one value per sample.
///
/// Stage values are mapped into `min..max` before scheduling.
pub fn envelope_samples(
    desc: &EnvelopeDescriptor,
    duration: f64,
    sample_rate: f64,
    min: f64,
    max: f64,
) -> Result<Vec<f32>> {
    let mseg = Mseg::from_descriptor(desc)?;
    let range = ParamRange::new(min, max);

    let mut timeline = ParamTimeline::new(range.min);
    mseg.note_on_and_off(&mut timeline, 0.0, duration, range)?;

    let total = duration.max(0.0) + mseg.duration_of_release();
    let frames = (total * sample_rate).ceil().max(0.0) as usize;
    tracing::debug!(frames, sample_rate, "Rendering envelope");
    Ok(timeline
        .render(0.0, sample_rate, frames)
        .into_iter()
        .map(|v| v as f32)
        .collect())
}

/// WASM-exposed: render an envelope descriptor (`{ stages, release }`) for
/// a note of `duration` seconds.
#[wasm_bindgen]
pub fn render_envelope(
    descriptor: JsValue,
    duration: f64,
    sample_rate: f64,
    min: f64,
    max: f64,
) -> std::result::Result<Vec<f32>, JsValue> {
    let desc: EnvelopeDescriptor = serde_wasm_bindgen::from_value(descriptor)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    envelope_samples(&desc, duration, sample_rate, min, max)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

// ── Scaling exports ─────────────────────────────────────────

/// WASM-exposed: map a `0..1` value into `min..max`.
#[wasm_bindgen(js_name = unsignedNormToParam)]
pub fn unsigned_norm_to_param(t: f64, min: f64, max: f64) -> f64 {
    scale::unsigned_norm_to_param(t, min, max)
}

/// WASM-exposed: map a `min..max` value back into `0..1`.
#[wasm_bindgen(js_name = paramToUnsignedNorm)]
pub fn param_to_unsigned_norm(p: f64, min: f64, max: f64) -> f64 {
    scale::param_to_unsigned_norm(p, min, max)
}

#[wasm_bindgen(js_name = unsignedToSigned)]
pub fn unsigned_to_signed(t: f64) -> f64 {
    scale::unsigned_to_signed(t)
}

#[wasm_bindgen(js_name = signedToUnsigned)]
pub fn signed_to_unsigned(t: f64) -> f64 {
    scale::signed_to_unsigned(t)
}

#[wasm_bindgen(js_name = signedNormToParam)]
pub fn signed_norm_to_param(t: f64, min: f64, max: f64) -> f64 {
    scale::signed_norm_to_param(t, min, max)
}

#[wasm_bindgen(js_name = paramToSignedNorm)]
pub fn param_to_signed_norm(p: f64, min: f64, max: f64) -> f64 {
    scale::param_to_signed_norm(p, min, max)
}

#[wasm_bindgen(js_name = logNormToParam)]
pub fn log_norm_to_param(t: f64, min: f64, max: f64) -> f64 {
    scale::log_norm_to_param(t, min, max)
}

#[wasm_bindgen(js_name = paramToLogNorm)]
pub fn param_to_log_norm(p: f64, min: f64, max: f64) -> f64 {
    scale::param_to_log_norm(p, min, max)
}

/// WASM-exposed: MIDI note number to Hz, with A4 at `tuning` Hz.
#[wasm_bindgen(js_name = midiToFrequency)]
pub fn midi_to_frequency(note: f64, tuning: f64) -> f64 {
    scale::midi_to_frequency(note, tuning)
}

/// WASM-exposed: Hz to a fractional MIDI note number, with A4 at `tuning` Hz.
#[wasm_bindgen(js_name = frequencyToMidi)]
pub fn frequency_to_midi(frequency: f64, tuning: f64) -> f64 {
    scale::frequency_to_midi(frequency, tuning)
}
