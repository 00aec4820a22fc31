//! Per-field configuration updates.
//!
//! A patch carries the fields an operator wants to change. Each present
//! field is checked against its admissible range on its own; a field that
//! fails is dropped and the previous value kept, while the valid fields are
//! committed together as one whole-structure replacement.

use serde::{Deserialize, Serialize};
use tracing::warn;
use tr_alarms::{AlarmConfig, ResetMode};
use tr_controls::{ChannelConfig, ControlLaw};
use tr_core::{ChannelId, Range, SensorId};

/// PID gains.
pub const GAIN_RANGE: Range = Range::new(0.0, 1000.0);
/// Setpoint and alarm thresholds, in degrees Celsius.
pub const TEMPERATURE_RANGE: Range = Range::new(-100.0, 200.0);
/// Hysteresis half-band, in kelvin.
pub const HYSTERESIS_RANGE: Range = Range::new(0.0, 50.0);
/// Each output limit.
pub const OUTPUT_LIMIT_RANGE: Range = Range::new(0.0, 1000.0);

/// Controller fields to change. `None` leaves a field untouched.
///
/// Enumerated fields are carried in their wire encoding so they are checked
/// with the same drop-and-log rule as numeric ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerPatch {
    /// Law code: 0 Pid, 1 Hysteresis, 2 Manual.
    pub law: Option<i64>,
    pub kp: Option<f64>,
    pub ki: Option<f64>,
    pub kd: Option<f64>,
    pub setpoint: Option<f64>,
    /// Sensor index, negative for none.
    pub sensor: Option<i64>,
    pub enabled: Option<bool>,
    pub manual_output: Option<f64>,
    pub hysteresis: Option<f64>,
    pub output_min: Option<f64>,
    pub output_max: Option<f64>,
}

/// Alarm fields to change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlarmPatch {
    pub warning_low: Option<f64>,
    pub warning_high: Option<f64>,
    pub alarm_low: Option<f64>,
    pub alarm_high: Option<f64>,
    /// Reset mode code: 0 AutoReset, 1 ManualAck.
    pub reset_mode: Option<i64>,
    pub enabled: Option<bool>,
}

/// Which fields of a patch were committed and which were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub applied: Vec<&'static str>,
    pub rejected: Vec<&'static str>,
}

impl PatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    fn accept(&mut self, field: &'static str) {
        self.applied.push(field);
    }

    fn reject(&mut self, channel: ChannelId, field: &'static str, reason: &dyn std::fmt::Display) {
        warn!(channel = %channel, field, %reason, "configuration field rejected");
        self.rejected.push(field);
    }
}

fn ranged(
    channel: ChannelId,
    out: &mut PatchOutcome,
    field: &'static str,
    value: Option<f64>,
    range: Range,
    target: &mut f64,
) {
    let Some(v) = value else { return };
    match range.check(v, field) {
        Ok(v) => {
            *target = v;
            out.accept(field);
        }
        Err(e) => out.reject(channel, field, &e),
    }
}

impl ControllerPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the valid fields of this patch to a copy of `current`.
    pub fn apply(&self, channel: ChannelId, current: &ChannelConfig) -> (ChannelConfig, PatchOutcome) {
        let mut next = current.clone();
        let mut out = PatchOutcome::default();

        if let Some(code) = self.law {
            match ControlLaw::from_code(code) {
                Some(law) => {
                    next.law = law;
                    out.accept("law");
                }
                None => out.reject(channel, "law", &format!("unknown law code {code}")),
            }
        }

        ranged(channel, &mut out, "kp", self.kp, GAIN_RANGE, &mut next.gains.kp);
        ranged(channel, &mut out, "ki", self.ki, GAIN_RANGE, &mut next.gains.ki);
        ranged(channel, &mut out, "kd", self.kd, GAIN_RANGE, &mut next.gains.kd);
        ranged(
            channel,
            &mut out,
            "setpoint",
            self.setpoint,
            TEMPERATURE_RANGE,
            &mut next.setpoint,
        );
        ranged(
            channel,
            &mut out,
            "hysteresis",
            self.hysteresis,
            HYSTERESIS_RANGE,
            &mut next.hysteresis,
        );

        if let Some(index) = self.sensor {
            match SensorId::from_wire(index) {
                Ok(sensor) => {
                    next.sensor = sensor;
                    out.accept("sensor");
                }
                Err(e) => out.reject(channel, "sensor", &e),
            }
        }

        if let Some(enabled) = self.enabled {
            next.enabled = enabled;
            out.accept("enabled");
        }

        // Limits first, so manual output is checked against the new maximum.
        let mut min = next.output_min;
        let mut max = next.output_max;
        let mut limits = Vec::new();
        ranged(channel, &mut out, "output_min", self.output_min, OUTPUT_LIMIT_RANGE, &mut min);
        ranged(channel, &mut out, "output_max", self.output_max, OUTPUT_LIMIT_RANGE, &mut max);
        if self.output_min.is_some() {
            limits.push("output_min");
        }
        if self.output_max.is_some() {
            limits.push("output_max");
        }
        if min < max {
            next.output_min = min;
            next.output_max = max;
        } else {
            for field in limits {
                if let Some(pos) = out.applied.iter().position(|f| *f == field) {
                    out.applied.remove(pos);
                    out.reject(channel, field, &"output_min must be below output_max");
                }
            }
        }

        ranged(
            channel,
            &mut out,
            "manual_output",
            self.manual_output,
            Range::new(0.0, next.output_max),
            &mut next.manual_output,
        );

        (next, out)
    }
}

impl AlarmPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the valid fields of this patch to a copy of `current`.
    ///
    /// Band ordering is checked after the individual ranges; a band whose
    /// low bound would not stay below its high bound keeps its old bounds.
    pub fn apply(&self, channel: ChannelId, current: &AlarmConfig) -> (AlarmConfig, PatchOutcome) {
        let mut next = current.clone();
        let mut out = PatchOutcome::default();

        band(
            channel,
            &mut out,
            ("warning_low", self.warning_low, &mut next.warning_low),
            ("warning_high", self.warning_high, &mut next.warning_high),
        );
        band(
            channel,
            &mut out,
            ("alarm_low", self.alarm_low, &mut next.alarm_low),
            ("alarm_high", self.alarm_high, &mut next.alarm_high),
        );

        if let Some(code) = self.reset_mode {
            match ResetMode::from_code(code) {
                Some(mode) => {
                    next.reset_mode = mode;
                    out.accept("reset_mode");
                }
                None => out.reject(channel, "reset_mode", &format!("unknown reset mode {code}")),
            }
        }

        if let Some(enabled) = self.enabled {
            next.enabled = enabled;
            out.accept("alarm_enabled");
        }

        (next, out)
    }
}

fn band(
    channel: ChannelId,
    out: &mut PatchOutcome,
    low: (&'static str, Option<f64>, &mut f64),
    high: (&'static str, Option<f64>, &mut f64),
) {
    let (low_name, low_value, low_target) = low;
    let (high_name, high_value, high_target) = high;

    let mut lo = *low_target;
    let mut hi = *high_target;
    let mut scratch = PatchOutcome::default();
    ranged(channel, &mut scratch, low_name, low_value, TEMPERATURE_RANGE, &mut lo);
    ranged(channel, &mut scratch, high_name, high_value, TEMPERATURE_RANGE, &mut hi);
    out.rejected.append(&mut scratch.rejected);

    if lo < hi {
        *low_target = lo;
        *high_target = hi;
        out.applied.append(&mut scratch.applied);
    } else {
        for field in scratch.applied {
            out.reject(channel, field, &format!("{low_name} must be below {high_name}"));
        }
    }
}
