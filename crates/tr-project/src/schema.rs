//! Startup configuration schema.

use serde::{Deserialize, Serialize};

/// A regulator station: tick period, auto-tune defaults, channels, sensors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationDef {
    pub version: u32,
    pub name: String,
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    #[serde(default)]
    pub autotune: AutotuneDef,
    #[serde(default)]
    pub channels: Vec<ChannelDef>,
    #[serde(default)]
    pub sensors: Vec<SensorDef>,
}

fn default_tick_period_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutotuneDef {
    pub step: f64,
    pub session_s: f64,
    pub min_amplitude: f64,
}

impl Default for AutotuneDef {
    fn default() -> Self {
        Self {
            step: 255.0,
            session_s: 1800.0,
            min_amplitude: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LawDef {
    #[default]
    Pid,
    Hysteresis,
    Manual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResetModeDef {
    #[default]
    AutoReset,
    ManualAck,
}

/// One channel. Omitted fields take the fail-safe defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelDef {
    pub index: usize,
    pub law: LawDef,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    pub output_min: f64,
    pub output_max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor: Option<usize>,
    pub enabled: bool,
    pub manual_output: f64,
    pub hysteresis: f64,
    /// Initial state of the external enable input.
    pub external_enable: bool,
    pub alarm: AlarmDef,
}

impl Default for ChannelDef {
    fn default() -> Self {
        Self {
            index: 0,
            law: LawDef::Pid,
            kp: 2.0,
            ki: 5.0,
            kd: 1.0,
            setpoint: 20.0,
            output_min: 0.0,
            output_max: 255.0,
            sensor: None,
            enabled: false,
            manual_output: 0.0,
            hysteresis: 0.5,
            external_enable: false,
            alarm: AlarmDef::default(),
        }
    }
}

/// Alarm thresholds. An omitted threshold keeps its permissive default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlarmDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_high: Option<f64>,
    pub reset_mode: ResetModeDef,
    pub enabled: bool,
}

impl Default for AlarmDef {
    fn default() -> Self {
        Self {
            warning_low: None,
            warning_high: None,
            alarm_low: None,
            alarm_high: None,
            reset_mode: ResetModeDef::AutoReset,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorDef {
    pub index: usize,
    pub enabled: bool,
    pub simulated: bool,
    pub simulated_value: f64,
    pub offset: f64,
    pub scale: f64,
}

impl Default for SensorDef {
    fn default() -> Self {
        Self {
            index: 0,
            enabled: true,
            simulated: false,
            simulated_value: 20.0,
            offset: 0.0,
            scale: 1.0,
        }
    }
}
