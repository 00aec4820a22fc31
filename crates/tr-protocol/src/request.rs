//! Request decoding.
//!
//! Required fields (`command`, `regulator_id`, `sensorIndex`, `state`) must
//! be present and valid or the whole request is refused. Optional fields of
//! the wrong type are ignored as if absent; their admissible ranges are
//! checked later, field by field, by the engine.

use serde_json::{Map, Value};
use tr_controls::ControllerState;
use tr_core::{ChannelId, SensorId};
use tr_engine::{AlarmPatch, ControllerPatch};

use crate::error::{ProtocolError, ProtocolResult};

/// Configuration changes addressed to one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTarget {
    pub channel: ChannelId,
    pub controller: ControllerPatch,
    pub alarm: AlarmPatch,
}

/// A decoded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    GetStatus,
    /// Applied in order.
    SetConfig(Vec<ConfigTarget>),
    AckAlarm {
        channel: ChannelId,
    },
    SetSimulation {
        sensor: SensorId,
        simulated: Option<bool>,
        value: Option<f64>,
    },
    ToggleEnable {
        channel: ChannelId,
        enabled: Option<bool>,
    },
    StartAutotune {
        channel: ChannelId,
        step: Option<f64>,
    },
    CancelAutotune {
        channel: ChannelId,
    },
    SetState {
        channel: ChannelId,
        state: ControllerState,
    },
}

type Object = Map<String, Value>;

impl Request {
    /// Decode one command line.
    pub fn parse(line: &str) -> ProtocolResult<Self> {
        let value: Value = serde_json::from_str(line).map_err(|_| ProtocolError::InvalidJson)?;
        let command = command_name(&value)?;
        Self::from_value(command, &value)
    }

    /// Decode the body of a request whose command name is already known.
    pub fn from_value(command: &str, value: &Value) -> ProtocolResult<Self> {
        let empty = Object::new();
        let obj = value.as_object().unwrap_or(&empty);
        match command {
            "getStatus" => Ok(Self::GetStatus),
            "setConfig" => set_config(obj).map(Self::SetConfig),
            "ackAlarm" => Ok(Self::AckAlarm {
                channel: channel(obj)?,
            }),
            "setSimulation" => Ok(Self::SetSimulation {
                sensor: sensor(obj)?,
                simulated: bool_field(obj, "simulated"),
                value: f64_field(obj, "value"),
            }),
            "toggleEnable" => Ok(Self::ToggleEnable {
                channel: channel(obj)?,
                enabled: bool_field(obj, "enabled"),
            }),
            "startAutotune" => Ok(Self::StartAutotune {
                channel: channel(obj)?,
                step: f64_field(obj, "outputStep"),
            }),
            "cancelAutotune" => Ok(Self::CancelAutotune {
                channel: channel(obj)?,
            }),
            "setState" => {
                let channel = channel(obj)?;
                let code = obj
                    .get("state")
                    .ok_or(ProtocolError::MissingField { field: "state" })?;
                let state = as_i64(code)
                    .and_then(ControllerState::from_code)
                    .ok_or(ProtocolError::InvalidField { field: "state" })?;
                Ok(Self::SetState { channel, state })
            }
            other => Err(ProtocolError::UnknownCommand {
                command: other.to_string(),
            }),
        }
    }

    /// Wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetStatus => "getStatus",
            Self::SetConfig(_) => "setConfig",
            Self::AckAlarm { .. } => "ackAlarm",
            Self::SetSimulation { .. } => "setSimulation",
            Self::ToggleEnable { .. } => "toggleEnable",
            Self::StartAutotune { .. } => "startAutotune",
            Self::CancelAutotune { .. } => "cancelAutotune",
            Self::SetState { .. } => "setState",
        }
    }
}

/// The non-empty `command` string of a request.
pub fn command_name(value: &Value) -> ProtocolResult<&str> {
    value
        .get("command")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .ok_or(ProtocolError::MissingCommand)
}

/// Integers, and floats with no fractional part.
fn as_i64(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn i64_field(obj: &Object, key: &str) -> Option<i64> {
    obj.get(key).and_then(as_i64)
}

fn f64_field(obj: &Object, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

/// Booleans, and the integers 0 and 1.
fn bool_field(obj: &Object, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(b) => Some(*b),
        v => match as_i64(v)? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
    }
}

fn channel(obj: &Object) -> ProtocolResult<ChannelId> {
    let raw = obj
        .get("regulator_id")
        .ok_or(ProtocolError::MissingField {
            field: "regulator_id",
        })?;
    as_i64(raw)
        .and_then(|i| ChannelId::new(i).ok())
        .ok_or(ProtocolError::InvalidField {
            field: "regulator_id",
        })
}

fn sensor(obj: &Object) -> ProtocolResult<SensorId> {
    let raw = obj
        .get("sensorIndex")
        .ok_or(ProtocolError::MissingField {
            field: "sensorIndex",
        })?;
    as_i64(raw)
        .and_then(|i| SensorId::new(i).ok())
        .ok_or(ProtocolError::InvalidField {
            field: "sensorIndex",
        })
}

fn controller_patch(obj: &Object, enabled_key: &str) -> ControllerPatch {
    ControllerPatch {
        law: i64_field(obj, "type"),
        kp: f64_field(obj, "kp"),
        ki: f64_field(obj, "ki"),
        kd: f64_field(obj, "kd"),
        setpoint: f64_field(obj, "setpoint"),
        sensor: i64_field(obj, "sensorIndex"),
        enabled: bool_field(obj, enabled_key),
        manual_output: f64_field(obj, "manualOutput"),
        hysteresis: f64_field(obj, "hysteresis"),
        output_min: f64_field(obj, "outputMin"),
        output_max: f64_field(obj, "outputMax"),
    }
}

fn alarm_patch(obj: &Object, enabled_key: &str) -> AlarmPatch {
    AlarmPatch {
        warning_low: f64_field(obj, "warningLow"),
        warning_high: f64_field(obj, "warningHigh"),
        alarm_low: f64_field(obj, "alarmLow"),
        alarm_high: f64_field(obj, "alarmHigh"),
        reset_mode: i64_field(obj, "resetMode"),
        enabled: bool_field(obj, enabled_key),
    }
}

/// Elements of an array form, each addressed by its own `regulator_id` or
/// else by position.
fn addressed(obj: &Object, key: &str) -> ProtocolResult<Vec<(ChannelId, Object)>> {
    let Some(items) = obj.get(key).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let Some(item) = item.as_object() else {
            continue;
        };
        let channel = if item.contains_key("regulator_id") {
            channel(item)?
        } else {
            ChannelId::new(position as i64).map_err(|_| ProtocolError::InvalidField {
                field: "regulator_id",
            })?
        };
        out.push((channel, item.clone()));
    }
    Ok(out)
}

/// Single-channel form (top-level `regulator_id`, with `alarmEnabled` for the
/// alarm switch) and array form (`pids`, `alarms`) may be combined.
fn set_config(obj: &Object) -> ProtocolResult<Vec<ConfigTarget>> {
    let single = obj.contains_key("regulator_id");
    if !single && !obj.contains_key("pids") && !obj.contains_key("alarms") {
        return Err(ProtocolError::MissingField {
            field: "regulator_id",
        });
    }

    let mut targets = Vec::new();
    if single {
        targets.push(ConfigTarget {
            channel: channel(obj)?,
            controller: controller_patch(obj, "enabled"),
            alarm: alarm_patch(obj, "alarmEnabled"),
        });
    }
    for (channel, item) in addressed(obj, "pids")? {
        targets.push(ConfigTarget {
            channel,
            controller: controller_patch(&item, "enabled"),
            alarm: AlarmPatch::default(),
        });
    }
    for (channel, item) in addressed(obj, "alarms")? {
        targets.push(ConfigTarget {
            channel,
            controller: ControllerPatch::default(),
            alarm: alarm_patch(&item, "enabled"),
        });
    }
    Ok(targets)
}
