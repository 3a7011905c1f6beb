//! Rotary control: headless model of a knob widget.
//!
//! The host forwards pointer and gesture deltas; the model turns them into a
//! position along the knob's sweep, derives the normalized and parameter
//! values, and reports the rotation to render.
//!
//! Angles are measured clockwise from 12 o'clock. The default sweep runs
//! from 225° (about 7:30) clockwise through 0° to 135° (about 4:30).

use std::fmt;

use crate::descriptor::RotaryConfig;
use crate::error::ConfigError;

/// Degrees rotated per unit of vertical pan velocity.
pub const PAN_DEGREES_PER_VELOCITY: f64 = 25.0;

/// Snapshot delivered to the change callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotaryChange {
    /// Value in `[param_min, param_max]`.
    pub param_value: f64,
    /// Value in `[0, 1]`.
    pub norm_value: f64,
    /// Rotation to render, in `[0, 360)`.
    pub degrees: f64,
}

type ChangeCallback = Box<dyn FnMut(&RotaryChange)>;

/// A rotary knob.
pub struct Rotary {
    config: RotaryConfig,
    /// Degrees between the minimum and maximum positions.
    sweep: f64,
    /// Degrees travelled from the minimum position, in `[0, sweep]`.
    position: f64,
    norm_value: f64,
    param_value: f64,
    capturing: bool,
    last_y: f64,
    pinch_origin: Option<f64>,
    on_change: Option<ChangeCallback>,
}

impl fmt::Debug for Rotary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rotary")
            .field("config", &self.config)
            .field("position", &self.position)
            .field("norm_value", &self.norm_value)
            .field("param_value", &self.param_value)
            .field("capturing", &self.capturing)
            .finish_non_exhaustive()
    }
}

impl Rotary {
    /// Create a knob resting at its minimum position.
    pub fn new(config: RotaryConfig) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("param_min", config.param_min),
            ("param_max", config.param_max),
            ("deg_min", config.deg_min),
            ("deg_max", config.deg_max),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }
        if config.param_min == config.param_max {
            return Err(ConfigError::EmptyRange(config.param_min));
        }
        for (field, value) in [("deg_min", config.deg_min), ("deg_max", config.deg_max)] {
            if !(0.0..360.0).contains(&value) {
                return Err(ConfigError::DegreesOutOfRange { field, value });
            }
        }
        let sweep = (config.deg_max - config.deg_min).rem_euclid(360.0);
        if sweep == 0.0 {
            return Err(ConfigError::ZeroSweep);
        }

        Ok(Rotary {
            param_value: config.param_min,
            config,
            sweep,
            position: 0.0,
            norm_value: 0.0,
            capturing: false,
            last_y: 0.0,
            pinch_origin: None,
            on_change: None,
        })
    }

    /// Register the callback fired whenever the value is recomputed.
    pub fn on_change<F>(&mut self, callback: F)
    where
        F: FnMut(&RotaryChange) + 'static,
    {
        self.on_change = Some(Box::new(callback));
    }

    pub fn config(&self) -> &RotaryConfig {
        &self.config
    }

    pub fn norm_value(&self) -> f64 {
        self.norm_value
    }

    pub fn param_value(&self) -> f64 {
        self.param_value
    }

    /// Current rotation in `[0, 360)`.
    pub fn rotation_degrees(&self) -> f64 {
        (self.config.deg_min + self.position).rem_euclid(360.0)
    }

    /// CSS transform for the knob image.
    pub fn css_transform(&self) -> String {
        format!("rotate({}deg)", self.rotation_degrees())
    }

    /// Parameter rounded to an integer and normalized value to two places.
    pub fn display_values(&self) -> (String, String) {
        (
            format!("{:.0}", self.param_value),
            format!("{:.2}", self.norm_value),
        )
    }

    /// Move the knob to a normalized position, clamped to `[0, 1]`.
    pub fn set_norm_value(&mut self, value: f64) -> RotaryChange {
        let norm = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        self.position = norm * self.sweep;
        self.update(norm)
    }

    /// Move the knob to a parameter value.
    pub fn set_param_value(&mut self, value: f64) -> RotaryChange {
        let norm = self
            .config
            .taper
            .to_norm(value, self.config.param_min, self.config.param_max);
        self.set_norm_value(norm)
    }

    /// Turn the knob by `delta` degrees (positive is clockwise). Movement
    /// stops at either end of the sweep.
    pub fn rotate(&mut self, delta: f64) -> RotaryChange {
        if delta.is_finite() {
            self.position = (self.position + delta).clamp(0.0, self.sweep);
        }
        self.update(self.position / self.sweep)
    }

    // ── Pointer input ───────────────────────────────────────

    pub fn pointer_down(&mut self, y: f64) {
        self.capturing = true;
        self.last_y = y;
    }

    /// Dragging upwards turns the knob clockwise, one degree per pixel.
    pub fn pointer_move(&mut self, y: f64) -> Option<RotaryChange> {
        if !self.capturing {
            return None;
        }
        let delta = self.last_y - y;
        self.last_y = y;
        Some(self.rotate(delta))
    }

    pub fn pointer_up(&mut self) {
        self.capturing = false;
    }

    pub fn pointer_leave(&mut self) {
        self.capturing = false;
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    // ── Gestures ────────────────────────────────────────────

    /// Begin a two-finger rotate gesture at `rotation` degrees.
    pub fn pinch_start(&mut self, rotation: f64) {
        if self.config.pinch {
            self.pinch_origin = Some(rotation);
        }
    }

    /// Continue a rotate gesture; the knob follows the change in rotation.
    pub fn pinch_rotate(&mut self, rotation: f64) -> Option<RotaryChange> {
        if !self.config.pinch {
            return None;
        }
        let origin = self.pinch_origin.replace(rotation)?;
        Some(self.rotate(rotation - origin))
    }

    pub fn pinch_end(&mut self) {
        self.pinch_origin = None;
    }

    /// Vertical pan; upward velocity is negative and turns clockwise.
    pub fn pan_vertical(&mut self, velocity: f64) -> Option<RotaryChange> {
        if !self.config.pan {
            return None;
        }
        Some(self.rotate(-PAN_DEGREES_PER_VELOCITY * velocity))
    }

    fn update(&mut self, norm: f64) -> RotaryChange {
        self.norm_value = norm;
        self.param_value =
            self.config
                .taper
                .to_param(norm, self.config.param_min, self.config.param_max);

        let change = RotaryChange {
            param_value: self.param_value,
            norm_value: self.norm_value,
            degrees: self.rotation_degrees(),
        };
        if let Some(callback) = self.on_change.as_mut() {
            callback(&change);
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::Taper;
    use std::cell::RefCell;
    use std::rc::Rc;

    const EPS: f64 = 1e-9;

    fn pitch_knob() -> Rotary {
        Rotary::new(RotaryConfig::new(300.0, 20000.0)).unwrap()
    }

    #[test]
    fn starts_at_minimum() {
        let knob = pitch_knob();
        assert_eq!(knob.norm_value(), 0.0);
        assert_eq!(knob.param_value(), 300.0);
        assert_eq!(knob.rotation_degrees(), 225.0);
        assert_eq!(knob.css_transform(), "rotate(225deg)");
    }

    #[test]
    fn rotate_moves_through_zero() {
        let mut knob = pitch_knob();
        let change = knob.rotate(135.0);
        assert!((change.norm_value - 0.5).abs() < EPS);
        assert!((change.degrees - 0.0).abs() < EPS);
        assert!((change.param_value - 10150.0).abs() < 1e-6);

        let change = knob.rotate(67.5);
        assert!((change.norm_value - 0.75).abs() < EPS);
        assert!((change.degrees - 67.5).abs() < EPS);
    }

    #[test]
    fn rotation_clamps_at_both_ends() {
        let mut knob = pitch_knob();
        let change = knob.rotate(-90.0);
        assert_eq!(change.norm_value, 0.0);
        assert_eq!(change.degrees, 225.0);

        let change = knob.rotate(10_000.0);
        assert_eq!(change.norm_value, 1.0);
        assert_eq!(change.degrees, 135.0);
        assert_eq!(change.param_value, 20000.0);
    }

    #[test]
    fn set_norm_value_round_trips() {
        let mut knob = pitch_knob();
        knob.set_norm_value(0.5);
        assert_eq!(knob.norm_value(), 0.5);
        assert_eq!(knob.css_transform(), "rotate(0deg)");

        knob.set_norm_value(1.5);
        assert_eq!(knob.norm_value(), 1.0);
    }

    #[test]
    fn set_param_value_maps_to_norm() {
        let mut knob = pitch_knob();
        knob.set_param_value(10150.0);
        assert!((knob.norm_value() - 0.5).abs() < EPS);
        assert!((knob.param_value() - 10150.0).abs() < 1e-6);
    }

    #[test]
    fn callback_receives_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut knob = pitch_knob();
        knob.on_change(move |c| sink.borrow_mut().push(c.norm_value));

        knob.rotate(27.0);
        knob.set_norm_value(1.0);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!((seen[0] - 0.1).abs() < EPS);
        assert_eq!(seen[1], 1.0);
    }

    #[test]
    fn pointer_drag_rotates_while_captured() {
        let mut knob = pitch_knob();
        assert!(knob.pointer_move(50.0).is_none());

        knob.pointer_down(100.0);
        let change = knob.pointer_move(73.0).unwrap();
        assert!((change.norm_value - 0.1).abs() < EPS);
        // Dragging back down returns towards the minimum
        let change = knob.pointer_move(86.5).unwrap();
        assert!((change.norm_value - 0.05).abs() < EPS);

        knob.pointer_leave();
        assert!(!knob.is_capturing());
        assert!(knob.pointer_move(0.0).is_none());
    }

    #[test]
    fn pinch_follows_rotation_delta() {
        let mut knob = pitch_knob();
        assert!(knob.pinch_rotate(10.0).is_none(), "No gesture started");
        knob.pinch_start(5.0);
        knob.pinch_rotate(32.0);
        knob.pinch_rotate(59.0);
        assert!((knob.norm_value() - 0.2).abs() < EPS);
    }

    #[test]
    fn disabled_gestures_are_ignored() {
        let mut cfg = RotaryConfig::new(0.0, 1.0);
        cfg.pinch = false;
        cfg.pan = false;
        let mut knob = Rotary::new(cfg).unwrap();
        knob.pinch_start(0.0);
        assert!(knob.pinch_rotate(90.0).is_none());
        assert!(knob.pan_vertical(-2.0).is_none());
        assert_eq!(knob.norm_value(), 0.0);
    }

    #[test]
    fn pan_scales_velocity() {
        let mut knob = pitch_knob();
        let change = knob.pan_vertical(-1.08).unwrap();
        assert!((change.norm_value - 0.1).abs() < EPS);
    }

    #[test]
    fn display_values_round() {
        let mut knob = pitch_knob();
        knob.set_norm_value(0.123);
        let (param, norm) = knob.display_values();
        assert_eq!(param, "2723");
        assert_eq!(norm, "0.12");
    }

    #[test]
    fn log_taper_centres_geometrically() {
        let mut cfg = RotaryConfig::new(20.0, 20000.0);
        cfg.taper = Taper::Logarithmic;
        let mut knob = Rotary::new(cfg).unwrap();
        knob.set_norm_value(0.5);
        let expected = (20.0_f64 * 20000.0).sqrt();
        assert!((knob.param_value() - expected).abs() < 1e-6);
    }

    #[test]
    fn custom_sweep_without_wrap() {
        let mut cfg = RotaryConfig::new(0.0, 1.0);
        cfg.deg_min = 30.0;
        cfg.deg_max = 330.0;
        let mut knob = Rotary::new(cfg).unwrap();
        let change = knob.rotate(150.0);
        assert!((change.norm_value - 0.5).abs() < EPS);
        assert_eq!(change.degrees, 180.0);
    }

    #[test]
    fn rejects_bad_config() {
        assert!(matches!(
            Rotary::new(RotaryConfig::new(1.0, 1.0)),
            Err(ConfigError::EmptyRange(_))
        ));

        let mut cfg = RotaryConfig::new(0.0, 1.0);
        cfg.deg_max = cfg.deg_min;
        assert!(matches!(Rotary::new(cfg), Err(ConfigError::ZeroSweep)));

        let mut cfg = RotaryConfig::new(0.0, 1.0);
        cfg.deg_min = 400.0;
        assert!(matches!(
            Rotary::new(cfg),
            Err(ConfigError::DegreesOutOfRange { .. })
        ));
    }
}
