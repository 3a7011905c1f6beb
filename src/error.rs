use thiserror::Error;

/// Top-level error type, one variant per subsystem.
#[derive(Debug, Error)]
pub enum McadError {
    #[error("Parameter error: {0}")]
    Param(#[from] ParamError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}

/// Convenience result type using [`McadError`].
pub type Result<T> = std::result::Result<T, McadError>;

/// Rejected automation scheduling requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("Non-finite value {value} scheduled at {time}")]
    NonFiniteValue { value: f64, time: f64 },
    #[error("Invalid schedule time {time}")]
    InvalidTime { time: f64 },
    #[error("Exponential ramp cannot target zero (at {time})")]
    ZeroExponentialTarget { time: f64 },
}

/// Invalid descriptors and widget configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parameter range is empty: min = max = {0}")]
    EmptyRange(f64),
    #[error("Non-finite value for {field}")]
    NonFinite { field: &'static str },
    #[error("Degree position {field} = {value} is outside [0, 360)")]
    DegreesOutOfRange { field: &'static str, value: f64 },
    #[error("Rotary sweep is zero degrees")]
    ZeroSweep,
    #[error("Negative duration {0}")]
    NegativeDuration(f64),
    #[error("Malformed descriptor: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures turning fetched bytes into an audio buffer.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unrecognized audio container")]
    UnknownFormat,
    #[error("Unsupported sample format: {bits}-bit {kind}")]
    UnsupportedFormat { bits: u16, kind: &'static str },
    #[error("No audio frames in stream")]
    Empty,
    #[error("WAV decode failed: {0}")]
    Wav(String),
    #[error("MP3 decode failed: {0}")]
    Mp3(String),
}

/// Failures fetching or decoding a single resource.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Request for {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("Request for {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("Reading {path} failed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed data URL: {0}")]
    DataUrl(String),
    #[error("Decoding {url} failed: {source}")]
    Decode {
        url: String,
        #[source]
        source: DecodeError,
    },
    #[error("Decode task for {url} was aborted")]
    Aborted { url: String },
}
