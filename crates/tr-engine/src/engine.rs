//! Per-tick orchestration and operator actions.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tr_alarms::{AlarmConfig, AlarmEvaluator};
use tr_controls::{
    AutotuneConfig, ChannelConfig, ControllerState, RegulationChannel, SampleConfig,
};
use tr_core::{ChannelId, FaultCode, NUM_CHANNELS, SensorId, TickStats, TickTimer};
use tr_io::{EnableInput, OutputSink, SensorHealth, SensorPort};

use crate::error::{EngineError, EngineResult};
use crate::patch::{AlarmPatch, ControllerPatch, PatchOutcome};
use crate::snapshot::{ChannelSnapshot, EngineSnapshot, SensorReading};

/// Initial configuration of one channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSetup {
    pub controller: ChannelConfig,
    pub alarm: AlarmConfig,
}

/// Everything the engine needs at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub sample: SampleConfig,
    /// Defaults for sessions started without an explicit step.
    pub autotune: AutotuneConfig,
    pub channels: [ChannelSetup; NUM_CHANNELS],
}

/// The controller and alarm evaluator of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSlot {
    pub channel: RegulationChannel,
    pub alarm: AlarmEvaluator,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub outputs: [f64; NUM_CHANNELS],
    pub gates: [bool; NUM_CHANNELS],
    pub elapsed: Duration,
    pub overrun: bool,
}

/// Fixed set of regulation channels driven by one periodic tick.
pub struct RegulationEngine<S, E> {
    sensors: S,
    enables: E,
    slots: [ChannelSlot; NUM_CHANNELS],
    sample: SampleConfig,
    autotune: AutotuneConfig,
    stats: TickStats,
    last_tick_ms: Option<u64>,
}

impl<S: SensorPort, E: EnableInput> RegulationEngine<S, E> {
    pub fn new(config: EngineConfig, sensors: S, enables: E) -> EngineResult<Self> {
        config.autotune.validate()?;
        let slots = ChannelId::all()
            .zip(config.channels)
            .map(|(id, setup)| -> EngineResult<ChannelSlot> {
                Ok(ChannelSlot {
                    channel: RegulationChannel::new(id, setup.controller, config.sample)?,
                    alarm: AlarmEvaluator::new(id, setup.alarm)?,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;
        let slots: [ChannelSlot; NUM_CHANNELS] =
            slots.try_into().map_err(|_| EngineError::InvalidArg {
                what: "channel count mismatch",
            })?;

        Ok(Self {
            sensors,
            enables,
            slots,
            sample: config.sample,
            autotune: config.autotune,
            stats: TickStats::default(),
            last_tick_ms: None,
        })
    }

    /// Resolve a raw channel index from the command interface.
    pub fn channel_id(index: i64) -> EngineResult<ChannelId> {
        ChannelId::new(index).map_err(|_| EngineError::InvalidChannel { index })
    }

    pub fn sensor_id(index: i64) -> EngineResult<SensorId> {
        SensorId::new(index).map_err(|_| EngineError::InvalidSensor { index })
    }

    pub fn slot(&self, id: ChannelId) -> &ChannelSlot {
        &self.slots[id.index()]
    }

    pub fn slots(&self) -> &[ChannelSlot; NUM_CHANNELS] {
        &self.slots
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn enables(&self) -> &E {
        &self.enables
    }

    pub fn sample_config(&self) -> SampleConfig {
        self.sample
    }

    pub fn autotune_defaults(&self) -> AutotuneConfig {
        self.autotune
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    pub fn last_tick_ms(&self) -> Option<u64> {
        self.last_tick_ms
    }

    /// Run one control cycle over every channel.
    pub fn tick(&mut self, now_ms: u64, sink: &mut impl OutputSink) -> TickReport {
        let timer = TickTimer::start(Duration::from_millis(self.sample.period_ms));
        let mut outputs = [0.0; NUM_CHANNELS];
        let mut gates = [false; NUM_CHANNELS];

        self.sensors.refresh(now_ms);

        for slot in &mut self.slots {
            let id = slot.channel.id();
            let config = slot.channel.config();

            let input = match config.sensor {
                Some(sensor) => {
                    let sample = self.sensors.read(sensor);
                    if sample.health == SensorHealth::Failed {
                        slot.alarm.set_technical_alarm(sample.fault, now_ms);
                        None
                    } else {
                        slot.alarm.clear_technical_alarm();
                        if let Some(value) = sample.value {
                            slot.alarm.update_process_alarm(value, now_ms);
                        }
                        sample.value
                    }
                }
                None if config.enabled => {
                    slot.alarm.set_technical_alarm(FaultCode::Configuration, now_ms);
                    None
                }
                None => {
                    slot.alarm.clear_technical_alarm();
                    None
                }
            };

            let alarm_open = slot.alarm.is_output_enabled();
            if !alarm_open && slot.channel.state() == ControllerState::Tuning {
                warn!(channel = %id, level = ?slot.alarm.level(), "alarm closed the output gate, aborting autotune");
                slot.channel.cancel_autotune();
            }

            let gate = alarm_open && self.enables.is_enabled(id);
            let output = slot.channel.update(input, gate, now_ms);

            sink.actuate(id, slot.channel.actuator_command());
            sink.indicate(id, slot.alarm.indicators());

            outputs[id.index()] = output;
            gates[id.index()] = gate;
        }

        let (elapsed, overrun) = timer.stop();
        self.stats.record(elapsed, overrun);
        if overrun {
            warn!(
                elapsed_us = elapsed.as_micros() as u64,
                period_ms = self.sample.period_ms,
                "tick overran its period"
            );
        }
        debug!(now_ms, ?outputs, ?gates, "tick");
        self.last_tick_ms = Some(now_ms);

        TickReport {
            outputs,
            gates,
            elapsed,
            overrun,
        }
    }

    /// Apply the valid fields of `patch` to a channel's controller config.
    pub fn patch_controller(
        &mut self,
        id: ChannelId,
        patch: &ControllerPatch,
    ) -> EngineResult<PatchOutcome> {
        let slot = &mut self.slots[id.index()];
        let (next, outcome) = patch.apply(id, slot.channel.config());
        if !outcome.applied.is_empty() {
            slot.channel.set_config(next)?;
            info!(channel = %id, fields = ?outcome.applied, "controller configuration updated");
        }
        Ok(outcome)
    }

    /// Apply the valid fields of `patch` to a channel's alarm config.
    pub fn patch_alarm(&mut self, id: ChannelId, patch: &AlarmPatch) -> EngineResult<PatchOutcome> {
        let slot = &mut self.slots[id.index()];
        let (next, outcome) = patch.apply(id, slot.alarm.config());
        if !outcome.applied.is_empty() {
            slot.alarm.set_config(next)?;
            info!(channel = %id, fields = ?outcome.applied, "alarm configuration updated");
        }
        Ok(outcome)
    }

    pub fn acknowledge(&mut self, id: ChannelId) {
        info!(channel = %id, "alarm acknowledged");
        self.slots[id.index()].alarm.acknowledge();
    }

    /// Start auto-tune on a channel, with the default session and an
    /// optional relay step override.
    pub fn start_autotune(
        &mut self,
        id: ChannelId,
        step: Option<f64>,
        now_ms: u64,
    ) -> EngineResult<()> {
        let mut config = self.autotune;
        if let Some(step) = step {
            config.step = step;
        }
        config.validate()?;
        self.slots[id.index()].channel.start_autotune(config, now_ms)?;
        Ok(())
    }

    /// Returns whether a session was running.
    pub fn cancel_autotune(&mut self, id: ChannelId) -> bool {
        self.slots[id.index()].channel.cancel_autotune()
    }

    pub fn set_state(&mut self, id: ChannelId, state: ControllerState) -> EngineResult<()> {
        self.slots[id.index()].channel.set_state(state)?;
        Ok(())
    }

    /// Flip the external enable of a channel, or set it when `explicit` is
    /// given. Returns the new value.
    pub fn toggle_enable(&mut self, id: ChannelId, explicit: Option<bool>) -> bool {
        let enabled = self.enables.toggle(id, explicit);
        info!(channel = %id, enabled, "external enable changed");
        enabled
    }

    /// Change a sensor's simulation flag and/or value.
    pub fn set_simulation(&mut self, sensor: SensorId, simulated: Option<bool>, value: Option<f64>) {
        if let Some(simulated) = simulated {
            self.sensors.set_simulated(sensor, simulated);
        }
        if let Some(value) = value {
            self.sensors.set_simulated_value(sensor, value);
        }
    }

    /// Status of every sensor and channel.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            sensors: SensorId::all()
                .map(|sensor| SensorReading {
                    sensor,
                    sample: self.sensors.read(sensor),
                })
                .collect(),
            channels: self
                .slots
                .iter()
                .map(|slot| {
                    let id = slot.channel.id();
                    ChannelSnapshot {
                        id,
                        status: slot.channel.status(),
                        command: slot.channel.actuator_command(),
                        external_enable: self.enables.is_enabled(id),
                        alarm: slot.alarm.state().clone(),
                        indicators: slot.alarm.indicators(),
                        controller: slot.channel.config().clone(),
                        alarm_config: slot.alarm.config().clone(),
                    }
                })
                .collect(),
        }
    }
}
