//! Station validation logic.
//!
//! A startup file is checked as a whole and rejected on the first error.
//! Runtime updates use the same admissible ranges but drop bad fields one at
//! a time instead.

use std::collections::HashSet;

use tr_core::{NUM_CHANNELS, NUM_SENSORS, Range};
use tr_engine::{GAIN_RANGE, HYSTERESIS_RANGE, OUTPUT_LIMIT_RANGE, TEMPERATURE_RANGE};

use crate::schema::{AlarmDef, ChannelDef, SensorDef, StationDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate index: {index} in {context}")]
    DuplicateIndex { index: usize, context: &'static str },

    #[error("Index out of range: {index} in {context} (len={len})")]
    IndexOutOfRange {
        index: usize,
        context: &'static str,
        len: usize,
    },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_station(station: &StationDef) -> Result<(), ValidationError> {
    if station.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: station.version,
        });
    }
    if station.tick_period_ms == 0 {
        return Err(invalid("tick_period_ms", 0, "must be positive"));
    }

    let tune = &station.autotune;
    if !(tune.step.is_finite() && tune.step > 0.0) {
        return Err(invalid("autotune.step", tune.step, "must be positive"));
    }
    if !(tune.session_s.is_finite() && tune.session_s >= 0.001) {
        return Err(invalid(
            "autotune.session_s",
            tune.session_s,
            "must be at least one millisecond",
        ));
    }
    if !(tune.min_amplitude.is_finite() && tune.min_amplitude > 0.0) {
        return Err(invalid(
            "autotune.min_amplitude",
            tune.min_amplitude,
            "must be positive",
        ));
    }

    let mut seen = HashSet::new();
    for channel in &station.channels {
        check_index(channel.index, NUM_CHANNELS, "channels", &mut seen)?;
        validate_channel(channel)?;
    }

    let mut seen = HashSet::new();
    for sensor in &station.sensors {
        check_index(sensor.index, NUM_SENSORS, "sensors", &mut seen)?;
        validate_sensor(sensor)?;
    }

    Ok(())
}

fn check_index(
    index: usize,
    len: usize,
    context: &'static str,
    seen: &mut HashSet<usize>,
) -> Result<(), ValidationError> {
    if index >= len {
        return Err(ValidationError::IndexOutOfRange {
            index,
            context,
            len,
        });
    }
    if !seen.insert(index) {
        return Err(ValidationError::DuplicateIndex { index, context });
    }
    Ok(())
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn ranged(prefix: &str, field: &str, value: f64, range: Range) -> Result<(), ValidationError> {
    if range.contains(value) {
        Ok(())
    } else {
        Err(invalid(
            format!("{prefix}.{field}"),
            value,
            &format!("must be within [{}, {}]", range.min, range.max),
        ))
    }
}

fn validate_channel(channel: &ChannelDef) -> Result<(), ValidationError> {
    let prefix = format!("channels[{}]", channel.index);
    ranged(&prefix, "kp", channel.kp, GAIN_RANGE)?;
    ranged(&prefix, "ki", channel.ki, GAIN_RANGE)?;
    ranged(&prefix, "kd", channel.kd, GAIN_RANGE)?;
    ranged(&prefix, "setpoint", channel.setpoint, TEMPERATURE_RANGE)?;
    ranged(&prefix, "hysteresis", channel.hysteresis, HYSTERESIS_RANGE)?;
    ranged(&prefix, "output_min", channel.output_min, OUTPUT_LIMIT_RANGE)?;
    ranged(&prefix, "output_max", channel.output_max, OUTPUT_LIMIT_RANGE)?;
    if channel.output_min >= channel.output_max {
        return Err(invalid(
            format!("{prefix}.output_min"),
            channel.output_min,
            "must be below output_max",
        ));
    }
    ranged(
        &prefix,
        "manual_output",
        channel.manual_output,
        Range::new(0.0, channel.output_max),
    )?;
    if let Some(sensor) = channel.sensor {
        if sensor >= NUM_SENSORS {
            return Err(ValidationError::IndexOutOfRange {
                index: sensor,
                context: "channel sensor",
                len: NUM_SENSORS,
            });
        }
    }
    validate_alarm(&prefix, &channel.alarm)
}

fn validate_alarm(prefix: &str, alarm: &AlarmDef) -> Result<(), ValidationError> {
    let prefix = format!("{prefix}.alarm");
    for (field, value) in [
        ("warning_low", alarm.warning_low),
        ("warning_high", alarm.warning_high),
        ("alarm_low", alarm.alarm_low),
        ("alarm_high", alarm.alarm_high),
    ] {
        if let Some(v) = value {
            ranged(&prefix, field, v, TEMPERATURE_RANGE)?;
        }
    }
    let config = crate::apply::alarm_config(alarm);
    if config.warning_low >= config.warning_high {
        return Err(invalid(
            format!("{prefix}.warning_low"),
            config.warning_low,
            "must be below warning_high",
        ));
    }
    if config.alarm_low >= config.alarm_high {
        return Err(invalid(
            format!("{prefix}.alarm_low"),
            config.alarm_low,
            "must be below alarm_high",
        ));
    }
    Ok(())
}

fn validate_sensor(sensor: &SensorDef) -> Result<(), ValidationError> {
    let prefix = format!("sensors[{}]", sensor.index);
    if !sensor.simulated_value.is_finite() {
        return Err(invalid(
            format!("{prefix}.simulated_value"),
            sensor.simulated_value,
            "must be finite",
        ));
    }
    if !sensor.offset.is_finite() {
        return Err(invalid(format!("{prefix}.offset"), sensor.offset, "must be finite"));
    }
    if !sensor.scale.is_finite() || sensor.scale == 0.0 {
        return Err(invalid(
            format!("{prefix}.scale"),
            sensor.scale,
            "must be finite and non-zero",
        ));
    }
    Ok(())
}
