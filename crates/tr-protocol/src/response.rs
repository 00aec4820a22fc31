//! Response encoding.

use serde::Serialize;
use tr_core::SensorId;
use tr_engine::EngineSnapshot;

use crate::error::ProtocolError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorWire {
    #[serde(rename = "sensor_id")]
    pub sensor_id: i64,
    /// `null` when the sensor has no valid value.
    pub temperature: Option<f64>,
    pub health: u8,
    pub error_code: u8,
    pub last_update: u64,
    pub simulated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatWire {
    #[serde(rename = "regulator_id")]
    pub regulator_id: i64,
    pub current_temp: Option<f64>,
    pub output: f64,
    pub setpoint: f64,
    pub enabled: bool,
    #[serde(rename = "type")]
    pub law: u8,
    pub output_active: bool,
    pub sensor_index: i64,
    pub state: u8,
    pub duty: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmWire {
    #[serde(rename = "regulator_id")]
    pub regulator_id: i64,
    pub level: u8,
    pub error_code: u8,
    pub acknowledged: bool,
    pub timestamp: u64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PidConfigWire {
    #[serde(rename = "type")]
    pub law: u8,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    pub sensor_index: i64,
    pub enabled: bool,
    pub manual_output: f64,
    pub hysteresis: f64,
    pub output_min: f64,
    pub output_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmConfigWire {
    pub warning_low: f64,
    pub warning_high: f64,
    pub alarm_low: f64,
    pub alarm_high: f64,
    pub reset_mode: u8,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigWire {
    pub pids: Vec<PidConfigWire>,
    pub alarms: Vec<AlarmConfigWire>,
}

/// Full status snapshot in wire form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusWire {
    pub sensors: Vec<SensorWire>,
    pub thermostats: Vec<ThermostatWire>,
    pub alarms: Vec<AlarmWire>,
    pub config: ConfigWire,
}

impl StatusWire {
    pub fn from_snapshot(snapshot: &EngineSnapshot) -> Self {
        let sensors = snapshot
            .sensors
            .iter()
            .map(|r| SensorWire {
                sensor_id: r.sensor.into(),
                temperature: r.sample.value,
                health: r.sample.health.code(),
                error_code: r.sample.fault.code(),
                last_update: r.sample.timestamp_ms,
                simulated: r.sample.simulated,
            })
            .collect();

        let thermostats = snapshot
            .channels
            .iter()
            .map(|c| ThermostatWire {
                regulator_id: c.id.into(),
                current_temp: c.status.input,
                output: c.status.output,
                setpoint: c.status.setpoint,
                enabled: c.status.enabled,
                law: c.status.law.code(),
                output_active: c.status.output_active,
                sensor_index: SensorId::to_wire(c.status.sensor),
                state: c.status.state.code(),
                duty: c.command.duty,
            })
            .collect();

        let alarms = snapshot
            .channels
            .iter()
            .map(|c| AlarmWire {
                regulator_id: c.id.into(),
                level: c.alarm.level.code(),
                error_code: c.alarm.fault.code(),
                acknowledged: c.alarm.acknowledged,
                timestamp: c.alarm.timestamp_ms,
                active: c.alarm.active,
            })
            .collect();

        let pids = snapshot
            .channels
            .iter()
            .map(|c| {
                let cfg = &c.controller;
                PidConfigWire {
                    law: cfg.law.code(),
                    kp: cfg.gains.kp,
                    ki: cfg.gains.ki,
                    kd: cfg.gains.kd,
                    setpoint: cfg.setpoint,
                    sensor_index: SensorId::to_wire(cfg.sensor),
                    enabled: cfg.enabled,
                    manual_output: cfg.manual_output,
                    hysteresis: cfg.hysteresis,
                    output_min: cfg.output_min,
                    output_max: cfg.output_max,
                }
            })
            .collect();

        let alarm_configs = snapshot
            .channels
            .iter()
            .map(|c| {
                let cfg = &c.alarm_config;
                AlarmConfigWire {
                    warning_low: cfg.warning_low,
                    warning_high: cfg.warning_high,
                    alarm_low: cfg.alarm_low,
                    alarm_high: cfg.alarm_high,
                    reset_mode: cfg.reset_mode.code(),
                    enabled: cfg.enabled,
                }
            })
            .collect();

        Self {
            sensors,
            thermostats,
            alarms,
            config: ConfigWire {
                pids,
                alarms: alarm_configs,
            },
        }
    }
}

/// One response line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u8>,
    #[serde(rename = "regulator_id", skip_serializing_if = "Option::is_none")]
    pub regulator_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Configuration fields dropped by range validation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<&'static str>,
    #[serde(flatten)]
    pub snapshot: Option<StatusWire>,
}

impl Response {
    pub fn ok(command: &str, timestamp: u64, status: &'static str, snapshot: StatusWire) -> Self {
        Self {
            command: Some(command.to_string()),
            timestamp: Some(timestamp),
            status: Some(status),
            error: None,
            error_code: None,
            regulator_id: None,
            enabled: None,
            rejected: Vec::new(),
            snapshot: Some(snapshot),
        }
    }

    /// Error response without a snapshot. `command` and `timestamp` are
    /// echoed only once the command name was decoded.
    pub fn error(command: Option<&str>, timestamp: Option<u64>, error: &ProtocolError) -> Self {
        Self {
            command: command.map(str::to_string),
            timestamp,
            status: None,
            error: Some(error.to_string()),
            error_code: Some(error.fault().code()),
            regulator_id: None,
            enabled: None,
            rejected: Vec::new(),
            snapshot: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Serialize as one JSON line, without the terminator.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            String::from(r#"{"error":"Response encoding failed","errorCode":1}"#)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn error_line_has_no_snapshot() {
        let resp = Response::error(None, None, &ProtocolError::CommandTooLong);
        let v: Value = serde_json::from_str(&resp.to_json()).unwrap();
        assert_eq!(v["error"], "Command too long");
        assert_eq!(v["errorCode"], 1);
        assert!(v.get("command").is_none());
        assert!(v.get("sensors").is_none());
        assert!(v.get("status").is_none());
    }

    #[test]
    fn echoes_command_on_late_errors() {
        let err = ProtocolError::InvalidField {
            field: "regulator_id",
        };
        let resp = Response::error(Some("ackAlarm"), Some(1234), &err);
        let v: Value = serde_json::from_str(&resp.to_json()).unwrap();
        assert_eq!(v["command"], "ackAlarm");
        assert_eq!(v["timestamp"], 1234);
        assert_eq!(v["error"], "Invalid regulator_id");
    }
}
