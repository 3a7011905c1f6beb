//! Serde descriptors for envelopes, rotary controls and the buffer loader.
//!
//! These map directly to the JSON objects a host page passes across the
//! WASM boundary, so keys are camelCase and optional fields default.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scale::Taper;

// ── Envelope ────────────────────────────────────────────────

/// A multi-stage envelope: ordered stages plus an optional release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeDescriptor {
    #[serde(default)]
    pub stages: Vec<StageDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseDescriptor>,
}

impl EnvelopeDescriptor {
    /// Parse `{ "stages": [...], "release": {...} }`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One envelope stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// Seconds taken to reach `value`.
    pub duration: f64,
    /// Normalized target in `[0, 1]`.
    pub value: f64,
    /// Curve name: `"linear"` (default) or `"exp"`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
}

/// The release stage; always ramps towards the range minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub duration: f64,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
}

// ── Rotary ──────────────────────────────────────────────────

/// Rotary control configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotaryConfig {
    pub param_min: f64,
    pub param_max: f64,
    /// Angle of the minimum position, clockwise from 12 o'clock.
    #[serde(default = "default_deg_min")]
    pub deg_min: f64,
    /// Angle of the maximum position.
    #[serde(default = "default_deg_max")]
    pub deg_max: f64,
    /// Accept two-finger rotate gestures.
    #[serde(default = "default_true")]
    pub pinch: bool,
    /// Accept vertical pan gestures.
    #[serde(default = "default_true")]
    pub pan: bool,
    #[serde(default)]
    pub taper: Taper,
}

impl RotaryConfig {
    /// A config for `[param_min, param_max]` with the default 270° sweep.
    pub fn new(param_min: f64, param_max: f64) -> Self {
        RotaryConfig {
            param_min,
            param_max,
            deg_min: default_deg_min(),
            deg_max: default_deg_max(),
            pinch: true,
            pan: true,
            taper: Taper::Linear,
        }
    }
}

impl RotaryConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn default_deg_min() -> f64 {
    225.0
}

fn default_deg_max() -> f64 {
    135.0
}

fn default_true() -> bool {
    true
}

// ── Loader ──────────────────────────────────────────────────

/// Buffer loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderConfig {
    /// Upper bound on in-flight fetch + decode jobs per batch.
    pub max_concurrent: usize,
    /// HTTP request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            max_concurrent: 8,
            timeout_secs: 30,
            user_agent: format!("mcad_core/{}", crate::VERSION),
        }
    }
}

impl LoaderConfig {
    /// Parse a partial config; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
