//! Point-in-time status of the whole engine.

use serde::Serialize;
use tr_alarms::{AlarmConfig, AlarmState, Indicators};
use tr_controls::{ActuatorCommand, ChannelConfig, ChannelStatus};
use tr_core::{ChannelId, SensorId};
use tr_io::Sample;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub sensor: SensorId,
    pub sample: Sample,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSnapshot {
    pub id: ChannelId,
    pub status: ChannelStatus,
    /// Last command sent to the actuator.
    pub command: ActuatorCommand,
    pub external_enable: bool,
    pub alarm: AlarmState,
    pub indicators: Indicators,
    pub controller: ChannelConfig,
    pub alarm_config: AlarmConfig,
}

/// Sensors in index order, then channels in index order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub sensors: Vec<SensorReading>,
    pub channels: Vec<ChannelSnapshot>,
}

impl EngineSnapshot {
    pub fn channel(&self, id: ChannelId) -> Option<&ChannelSnapshot> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn sensor(&self, id: SensorId) -> Option<&SensorReading> {
        self.sensors.iter().find(|s| s.sensor == id)
    }
}
