//! Multi-stage envelope generator (MSEG).
//!
//! An envelope is an ordered list of stages plus a single release stage.
//! Rather than producing samples itself it schedules ramps on an
//! [`AutomationParam`], so the same envelope can modulate gain, pitch or
//! any other parameter range.

use crate::descriptor::EnvelopeDescriptor;
use crate::error::{ConfigError, ParamError};
use crate::scale::unsigned_norm_to_param;

use super::automation::AutomationParam;

/// Smallest magnitude an exponential ramp is allowed to reach.
pub const EXPONENTIAL_FLOOR: f64 = 1e-4;

/// Ramp shape of a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Curve {
    #[default]
    Linear,
    Exponential,
}

impl Curve {
    /// Parse a curve name. Anything other than `"linear"` is exponential;
    /// a missing name is linear.
    pub fn parse(name: Option<&str>) -> Curve {
        match name {
            None | Some("") | Some("linear") => Curve::Linear,
            Some(_) => Curve::Exponential,
        }
    }
}

/// One envelope segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    /// Seconds to reach `value` from the previous stage.
    pub duration: f64,
    /// Normalized target in `[0, 1]`.
    pub value: f64,
    pub curve: Curve,
}

impl Stage {
    pub fn new(duration: f64, value: f64) -> Self {
        Stage {
            duration,
            value,
            curve: Curve::Linear,
        }
    }

    pub fn exponential(duration: f64, value: f64) -> Self {
        Stage {
            duration,
            value,
            curve: Curve::Exponential,
        }
    }
}

/// The release segment. Its target is always the range minimum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Release {
    pub duration: f64,
    pub curve: Curve,
}

/// Output range the normalized stage values are mapped onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ParamRange {
    fn default() -> Self {
        ParamRange { min: 0.0, max: 1.0 }
    }
}

impl ParamRange {
    pub fn new(min: f64, max: f64) -> Self {
        ParamRange { min, max }
    }
}

/// Multi-stage envelope generator.
#[derive(Debug, Clone, Default)]
pub struct Mseg {
    stages: Vec<Stage>,
    release: Release,
    stage_length: f64,
}

impl Mseg {
    pub fn new() -> Self {
        Mseg::default()
    }

    /// Build an envelope from its serialized form.
    pub fn from_descriptor(desc: &EnvelopeDescriptor) -> Result<Self, ConfigError> {
        let mut mseg = Mseg::new();
        for stage in &desc.stages {
            check_duration(stage.duration)?;
            if !stage.value.is_finite() {
                return Err(ConfigError::NonFinite { field: "value" });
            }
            mseg.add_stage(Stage {
                duration: stage.duration,
                value: stage.value,
                curve: Curve::parse(stage.curve.as_deref()),
            });
        }
        if let Some(release) = &desc.release {
            check_duration(release.duration)?;
            mseg.add_release(Release {
                duration: release.duration,
                curve: Curve::parse(release.curve.as_deref()),
            });
        }
        Ok(mseg)
    }

    /// Append a stage to the end of the envelope.
    pub fn add_stage(&mut self, stage: Stage) {
        self.stage_length += stage.duration;
        self.stages.push(stage);
    }

    /// Replace the release stage.
    pub fn add_release(&mut self, release: Release) {
        self.release = release;
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Release duration in seconds. Callers with a fixed note length add this
    /// to know when the voice actually falls silent.
    pub fn duration_of_release(&self) -> f64 {
        self.release.duration
    }

    /// Combined duration of all stages, release excluded.
    pub fn stage_length(&self) -> f64 {
        self.stage_length
    }

    /// Schedule every stage on `param` starting at `when`.
    ///
    /// Use for continuously running sources; pair with [`Mseg::note_off`].
    pub fn note_on<P: AutomationParam + ?Sized>(
        &self,
        param: &mut P,
        when: f64,
        range: ParamRange,
    ) -> Result<(), ParamError> {
        hold_at(param, when)?;

        let mut elapsed = 0.0;
        for stage in &self.stages {
            elapsed += stage.duration;
            let value = unsigned_norm_to_param(stage.value, range.min, range.max);
            ramp(param, stage.curve, value, when + elapsed)?;
        }
        Ok(())
    }

    /// Schedule the release on `param` starting at `when`.
    pub fn note_off<P: AutomationParam + ?Sized>(
        &self,
        param: &mut P,
        when: f64,
        range: ParamRange,
    ) -> Result<(), ParamError> {
        hold_at(param, when)?;
        if self.release.duration > 0.0 {
            self.apply_release(param, when, range)?;
        }
        Ok(())
    }

    /// Schedule stages and release for a note of known `duration`.
    ///
    /// The release starts at `when + duration`; the source should be kept
    /// alive until `when + duration + duration_of_release()`.
    pub fn note_on_and_off<P: AutomationParam + ?Sized>(
        &self,
        param: &mut P,
        when: f64,
        duration: f64,
        range: ParamRange,
    ) -> Result<(), ParamError> {
        self.note_on(param, when, range)?;
        if self.release.duration > 0.0 {
            // Stages still pending at note-off are dropped, as with note_off
            let release_at = when + duration;
            hold_at(param, release_at)?;
            self.apply_release(param, release_at, range)?;
        }
        Ok(())
    }

    fn apply_release<P: AutomationParam + ?Sized>(
        &self,
        param: &mut P,
        when: f64,
        range: ParamRange,
    ) -> Result<(), ParamError> {
        ramp(param, self.release.curve, range.min, when + self.release.duration)
    }
}

/// Cancel pending automation and pin the value the parameter has at `when`,
/// keeping any ramp already under way up to that point.
fn hold_at<P: AutomationParam + ?Sized>(param: &mut P, when: f64) -> Result<(), ParamError> {
    param.cancel_and_hold_at_time(when)
}

fn ramp<P: AutomationParam + ?Sized>(
    param: &mut P,
    curve: Curve,
    value: f64,
    end_time: f64,
) -> Result<(), ParamError> {
    match curve {
        Curve::Linear => param.linear_ramp_to_value_at_time(value, end_time),
        Curve::Exponential => {
            param.exponential_ramp_to_value_at_time(away_from_zero(value), end_time)
        }
    }
}

fn away_from_zero(value: f64) -> f64 {
    if value.abs() >= EXPONENTIAL_FLOOR {
        value
    } else if value < 0.0 {
        -EXPONENTIAL_FLOOR
    } else {
        EXPONENTIAL_FLOOR
    }
}

fn check_duration(duration: f64) -> Result<(), ConfigError> {
    if !duration.is_finite() {
        return Err(ConfigError::NonFinite { field: "duration" });
    }
    if duration < 0.0 {
        return Err(ConfigError::NegativeDuration(duration));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ReleaseDescriptor, StageDescriptor};
    use crate::dsp::automation::{EventKind, ParamTimeline};

    fn attack_decay() -> Mseg {
        let mut env = Mseg::new();
        env.add_stage(Stage::new(0.0, 0.0));
        env.add_stage(Stage::new(0.25, 1.0));
        env.add_stage(Stage::exponential(0.5, 0.0));
        env.add_release(Release {
            duration: 1.0,
            curve: Curve::Linear,
        });
        env
    }

    #[test]
    fn curve_names() {
        assert_eq!(Curve::parse(None), Curve::Linear);
        assert_eq!(Curve::parse(Some("linear")), Curve::Linear);
        assert_eq!(Curve::parse(Some("exp")), Curve::Exponential);
        assert_eq!(Curve::parse(Some("exponential")), Curve::Exponential);
    }

    #[test]
    fn stage_length_accumulates() {
        let env = attack_decay();
        assert!((env.stage_length() - 0.75).abs() < 1e-12);
        assert_eq!(env.duration_of_release(), 1.0);
        assert_eq!(env.stages().len(), 3);
    }

    #[test]
    fn new_envelope_has_no_release() {
        let env = Mseg::new();
        assert_eq!(env.duration_of_release(), 0.0);
        assert_eq!(env.stage_length(), 0.0);
    }

    #[test]
    fn note_on_schedules_stage_ramps() {
        let env = attack_decay();
        let mut p = ParamTimeline::new(0.0);
        env.note_on(&mut p, 1.0, ParamRange::default()).unwrap();

        let events = p.events();
        // pin + one ramp per stage
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].kind, EventKind::SetValue);
        assert_eq!(events[1].time, 1.0);
        assert_eq!(events[2].time, 1.25);
        assert_eq!(events[3].time, 1.75);
        assert_eq!(events[3].kind, EventKind::ExponentialRamp);
        assert_eq!(events[3].value, EXPONENTIAL_FLOOR);

        // Attack midpoint
        assert!((p.value_at(1.125) - 0.5).abs() < 1e-9);
        assert!((p.value_at(1.25) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn note_on_maps_into_range() {
        let mut env = Mseg::new();
        env.add_stage(Stage::new(0.1, 0.5));
        env.add_stage(Stage::new(0.1, 1.0));
        let mut p = ParamTimeline::new(400.0);
        env.note_on(&mut p, 0.0, ParamRange::new(400.0, 800.0)).unwrap();
        assert!((p.value_at(0.1) - 600.0).abs() < 1e-9);
        assert!((p.value_at(0.2) - 800.0).abs() < 1e-9);
    }

    #[test]
    fn note_off_ramps_to_range_min() {
        let env = attack_decay();
        let mut p = ParamTimeline::new(0.0);
        env.note_on(&mut p, 0.0, ParamRange::default()).unwrap();
        // Release from the middle of the attack
        env.note_off(&mut p, 0.125, ParamRange::default()).unwrap();

        assert!((p.value_at(0.125) - 0.5).abs() < 1e-9);
        assert!((p.value_at(0.625) - 0.25).abs() < 1e-9);
        assert!(p.value_at(1.125).abs() < 1e-9);
        // Stages after the release point were cancelled
        assert!(p.events().iter().all(|e| e.time <= 1.125));
    }

    #[test]
    fn note_off_without_release_only_holds() {
        let mut env = Mseg::new();
        env.add_stage(Stage::new(1.0, 1.0));
        let mut p = ParamTimeline::new(0.0);
        env.note_on(&mut p, 0.0, ParamRange::default()).unwrap();
        env.note_off(&mut p, 0.5, ParamRange::default()).unwrap();
        assert!((p.value_at(10.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn note_on_and_off_releases_to_range_min() {
        let mut env = Mseg::new();
        env.add_stage(Stage::new(0.0, 1.0));
        env.add_release(Release {
            duration: 0.25,
            curve: Curve::Linear,
        });
        let mut p = ParamTimeline::new(400.0);
        let range = ParamRange::new(400.0, 800.0);
        env.note_on_and_off(&mut p, 0.0, 0.1, range).unwrap();

        assert!((p.value_at(0.05) - 800.0).abs() < 1e-9);
        let last = p.events().last().unwrap();
        assert!((last.time - 0.35).abs() < 1e-12);
        assert_eq!(last.value, 400.0);
    }

    #[test]
    fn exponential_release_avoids_zero() {
        let mut env = Mseg::new();
        env.add_stage(Stage::new(0.0, 1.0));
        env.add_release(Release {
            duration: 0.5,
            curve: Curve::Exponential,
        });
        let mut p = ParamTimeline::new(0.0);
        env.note_on_and_off(&mut p, 0.0, 0.5, ParamRange::default()).unwrap();
        let end = p.value_at(1.0);
        assert!((end - EXPONENTIAL_FLOOR).abs() < 1e-12, "Release should end at floor, got {end}");
        let mid = p.value_at(0.75);
        assert!(mid > 0.0 && mid < 0.5, "Exponential release should fall fast, got {mid}");
    }

    #[test]
    fn retrigger_starts_from_current_value() {
        let mut env = Mseg::new();
        env.add_stage(Stage::new(0.25, 1.0));
        let mut p = ParamTimeline::new(0.0);
        env.note_on(&mut p, 0.0, ParamRange::default()).unwrap();
        env.note_on(&mut p, 0.2, ParamRange::default()).unwrap();
        assert!((p.value_at(0.2) - 0.8).abs() < 1e-9);
        assert!((p.value_at(0.325) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn short_note_cuts_pending_stages() {
        let mut env = Mseg::new();
        env.add_stage(Stage::new(1.0, 1.0));
        env.add_release(Release {
            duration: 0.5,
            curve: Curve::Linear,
        });
        let mut p = ParamTimeline::new(0.0);
        env.note_on_and_off(&mut p, 0.0, 0.5, ParamRange::default()).unwrap();
        assert!((p.value_at(0.25) - 0.25).abs() < 1e-9, "Attack keeps rising until release");
        assert!((p.value_at(0.5) - 0.5).abs() < 1e-9);
        assert!((p.value_at(0.75) - 0.25).abs() < 1e-9);
        assert!(p.value_at(2.0).abs() < 1e-9);
    }

    #[test]
    fn note_length_equal_to_stages_keeps_decay() {
        let mut env = Mseg::new();
        env.add_stage(Stage::new(0.1, 1.0));
        env.add_stage(Stage::new(0.1, 0.5));
        env.add_release(Release {
            duration: 0.1,
            curve: Curve::Linear,
        });
        let mut p = ParamTimeline::new(0.0);
        env.note_on_and_off(&mut p, 0.0, 0.2, ParamRange::default()).unwrap();

        let decay = p.value_at(0.15);
        assert!((decay - 0.75).abs() < 1e-9, "Decay midpoint should be 0.75, got {decay}");
        assert!((p.value_at(0.2) - 0.5).abs() < 1e-9);
        assert!((p.value_at(0.25) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn note_off_mid_attack_keeps_earlier_curve() {
        let mut env = Mseg::new();
        env.add_stage(Stage::new(1.0, 1.0));
        env.add_release(Release {
            duration: 0.5,
            curve: Curve::Linear,
        });
        let mut p = ParamTimeline::new(0.0);
        env.note_on(&mut p, 0.0, ParamRange::default()).unwrap();
        env.note_off(&mut p, 0.5, ParamRange::default()).unwrap();

        assert!((p.value_at(0.25) - 0.25).abs() < 1e-9, "Attack before note-off is kept");
        assert!((p.value_at(0.5) - 0.5).abs() < 1e-9);
        assert!((p.value_at(0.75) - 0.25).abs() < 1e-9);
        assert!(p.value_at(1.5).abs() < 1e-9);
    }

    #[test]
    fn from_descriptor_builds_envelope() {
        let desc = EnvelopeDescriptor {
            stages: vec![
                StageDescriptor {
                    duration: 0.1,
                    value: 1.0,
                    curve: None,
                },
                StageDescriptor {
                    duration: 0.2,
                    value: 0.3,
                    curve: Some("exp".to_string()),
                },
            ],
            release: Some(ReleaseDescriptor {
                duration: 0.4,
                curve: Some("linear".to_string()),
            }),
        };
        let env = Mseg::from_descriptor(&desc).unwrap();
        assert_eq!(env.stages()[1].curve, Curve::Exponential);
        assert!((env.stage_length() - 0.3).abs() < 1e-12);
        assert_eq!(env.duration_of_release(), 0.4);
    }

    #[test]
    fn from_descriptor_rejects_negative_duration() {
        let desc = EnvelopeDescriptor {
            stages: vec![StageDescriptor {
                duration: -1.0,
                value: 1.0,
                curve: None,
            }],
            release: None,
        };
        assert!(matches!(
            Mseg::from_descriptor(&desc),
            Err(ConfigError::NegativeDuration(_))
        ));
    }
}
