//! Parameter automation: the scheduling surface envelopes drive.
//!
//! [`AutomationParam`] mirrors the ramp-scheduling half of a Web Audio
//! `AudioParam`. [`ParamTimeline`] is an in-memory implementation that can
//! be queried and rendered offline.

use crate::error::ParamError;

/// A host parameter that accepts timed value changes.
pub trait AutomationParam {
    /// The value the parameter takes at `time` given what is scheduled.
    fn value_at(&self, time: f64) -> f64;

    /// Drop every scheduled event at or after `time`.
    fn cancel_scheduled_values(&mut self, time: f64) -> Result<(), ParamError>;

    /// Drop every event after `time` and freeze the parameter at the value it
    /// has there. A ramp still in progress at `time` is shortened to end at
    /// `time` instead of being removed, so the curve up to `time` is kept.
    fn cancel_and_hold_at_time(&mut self, time: f64) -> Result<(), ParamError>;

    /// Jump to `value` at `time`.
    fn set_value_at_time(&mut self, value: f64, time: f64) -> Result<(), ParamError>;

    /// Ramp linearly from the previous event to `value`, arriving at `end_time`.
    fn linear_ramp_to_value_at_time(&mut self, value: f64, end_time: f64)
    -> Result<(), ParamError>;

    /// Ramp exponentially from the previous event to `value`, arriving at
    /// `end_time`. `value` must be non-zero.
    fn exponential_ramp_to_value_at_time(
        &mut self,
        value: f64,
        end_time: f64,
    ) -> Result<(), ParamError>;
}

/// Kind of a scheduled change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    SetValue,
    LinearRamp,
    ExponentialRamp,
}

/// A single scheduled change. For ramps, `time` is the ramp's end time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationEvent {
    pub kind: EventKind,
    pub time: f64,
    pub value: f64,
}

/// Time-sorted list of automation events over a default value.
#[derive(Debug, Clone)]
pub struct ParamTimeline {
    default_value: f64,
    events: Vec<AutomationEvent>,
}

impl ParamTimeline {
    pub fn new(default_value: f64) -> Self {
        ParamTimeline {
            default_value,
            events: Vec::new(),
        }
    }

    /// Scheduled events in time order.
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Sample the curve at `sample_rate`, starting from `start` seconds.
    pub fn render(&self, start: f64, sample_rate: f64, frames: usize) -> Vec<f64> {
        (0..frames)
            .map(|i| self.value_at(start + i as f64 / sample_rate))
            .collect()
    }

    fn insert(&mut self, kind: EventKind, value: f64, time: f64) -> Result<(), ParamError> {
        check_time(time)?;
        if !value.is_finite() {
            return Err(ParamError::NonFiniteValue { value, time });
        }
        // Equal-time events keep insertion order.
        let idx = self.events.partition_point(|e| e.time <= time);
        self.events.insert(idx, AutomationEvent { kind, time, value });
        Ok(())
    }
}

impl Default for ParamTimeline {
    fn default() -> Self {
        ParamTimeline::new(0.0)
    }
}

impl AutomationParam for ParamTimeline {
    fn value_at(&self, time: f64) -> f64 {
        let mut prev_time = 0.0;
        let mut prev_value = self.default_value;

        for event in &self.events {
            if event.time <= time {
                prev_time = event.time;
                prev_value = event.value;
                continue;
            }
            let t = ((time - prev_time) / (event.time - prev_time)).clamp(0.0, 1.0);
            return match event.kind {
                EventKind::SetValue => prev_value,
                EventKind::LinearRamp => prev_value + (event.value - prev_value) * t,
                EventKind::ExponentialRamp => {
                    // Zero or sign-crossing endpoints hold until the ramp ends
                    if prev_value == 0.0 || prev_value.signum() != event.value.signum() {
                        prev_value
                    } else {
                        prev_value * (event.value / prev_value).powf(t)
                    }
                }
            };
        }

        prev_value
    }

    fn cancel_scheduled_values(&mut self, time: f64) -> Result<(), ParamError> {
        check_time(time)?;
        self.events.retain(|e| e.time < time);
        Ok(())
    }

    fn cancel_and_hold_at_time(&mut self, time: f64) -> Result<(), ParamError> {
        check_time(time)?;
        let held = self.value_at(time);
        let spanning = self.events.iter().find(|e| e.time > time).map(|e| e.kind);
        self.events.retain(|e| e.time <= time);

        let kind = match spanning {
            Some(EventKind::LinearRamp) => EventKind::LinearRamp,
            Some(EventKind::ExponentialRamp) if held != 0.0 => EventKind::ExponentialRamp,
            _ => EventKind::SetValue,
        };
        self.insert(kind, held, time)
    }

    fn set_value_at_time(&mut self, value: f64, time: f64) -> Result<(), ParamError> {
        self.insert(EventKind::SetValue, value, time)
    }

    fn linear_ramp_to_value_at_time(
        &mut self,
        value: f64,
        end_time: f64,
    ) -> Result<(), ParamError> {
        self.insert(EventKind::LinearRamp, value, end_time)
    }

    fn exponential_ramp_to_value_at_time(
        &mut self,
        value: f64,
        end_time: f64,
    ) -> Result<(), ParamError> {
        if value == 0.0 {
            return Err(ParamError::ZeroExponentialTarget { time: end_time });
        }
        self.insert(EventKind::ExponentialRamp, value, end_time)
    }
}

fn check_time(time: f64) -> Result<(), ParamError> {
    if !time.is_finite() || time < 0.0 {
        return Err(ParamError::InvalidTime { time });
    }
    Ok(())
}
