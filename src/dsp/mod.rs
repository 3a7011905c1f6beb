//! Parameter automation and the envelopes and buffers built on it.

pub mod automation;
pub mod buffer;
pub mod envelope;
