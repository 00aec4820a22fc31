//! Turning a validated station into a running engine.

use tr_alarms::{AlarmConfig, ResetMode};
use tr_controls::{
    AutotuneConfig, ChannelConfig, ControlLaw, PidGains, SampleConfig,
};
use tr_core::{ChannelId, NUM_CHANNELS, SensorId};
use tr_engine::{ChannelSetup, EngineConfig, RegulationEngine};
use tr_io::{EnableLatch, SensorBank, SensorDriver, SensorSettings};

use crate::ProjectResult;
use crate::schema::{AlarmDef, ChannelDef, LawDef, ResetModeDef, StationDef};
use crate::validate::validate_station;

impl From<LawDef> for ControlLaw {
    fn from(law: LawDef) -> Self {
        match law {
            LawDef::Pid => ControlLaw::Pid,
            LawDef::Hysteresis => ControlLaw::Hysteresis,
            LawDef::Manual => ControlLaw::Manual,
        }
    }
}

impl From<ResetModeDef> for ResetMode {
    fn from(mode: ResetModeDef) -> Self {
        match mode {
            ResetModeDef::AutoReset => ResetMode::AutoReset,
            ResetModeDef::ManualAck => ResetMode::ManualAck,
        }
    }
}

pub(crate) fn alarm_config(def: &AlarmDef) -> AlarmConfig {
    let base = AlarmConfig::default();
    AlarmConfig {
        warning_low: def.warning_low.unwrap_or(base.warning_low),
        warning_high: def.warning_high.unwrap_or(base.warning_high),
        alarm_low: def.alarm_low.unwrap_or(base.alarm_low),
        alarm_high: def.alarm_high.unwrap_or(base.alarm_high),
        reset_mode: def.reset_mode.into(),
        enabled: def.enabled,
    }
}

fn channel_config(def: &ChannelDef) -> ProjectResult<ChannelConfig> {
    let sensor = def
        .sensor
        .map(|s| SensorId::new(s as i64))
        .transpose()
        .map_err(tr_engine::EngineError::from)?;
    Ok(ChannelConfig {
        law: def.law.into(),
        gains: PidGains {
            kp: def.kp,
            ki: def.ki,
            kd: def.kd,
        },
        setpoint: def.setpoint,
        output_min: def.output_min,
        output_max: def.output_max,
        sensor,
        enabled: def.enabled,
        manual_output: def.manual_output,
        hysteresis: def.hysteresis,
    })
}

impl StationDef {
    /// Engine configuration for this station. Channels not listed keep the
    /// fail-safe defaults.
    pub fn engine_config(&self) -> ProjectResult<EngineConfig> {
        validate_station(self)?;
        let mut channels: [ChannelSetup; NUM_CHANNELS] = Default::default();
        for def in &self.channels {
            channels[def.index] = ChannelSetup {
                controller: channel_config(def)?,
                alarm: alarm_config(&def.alarm),
            };
        }
        Ok(EngineConfig {
            sample: SampleConfig::new(self.tick_period_ms).map_err(tr_engine::EngineError::from)?,
            autotune: AutotuneConfig {
                step: self.autotune.step,
                session_ms: (self.autotune.session_s * 1000.0).round() as u64,
                min_amplitude: self.autotune.min_amplitude,
            },
            channels,
        })
    }

    /// Initial external enable flags.
    pub fn enable_latch(&self) -> EnableLatch {
        let mut enabled = [false; NUM_CHANNELS];
        for def in &self.channels {
            if def.index < NUM_CHANNELS {
                enabled[def.index] = def.external_enable;
            }
        }
        EnableLatch::new(enabled)
    }

    /// Apply per-sensor settings to a bank.
    pub fn configure_sensors<D: SensorDriver>(&self, bank: &mut SensorBank<D>) -> ProjectResult<()> {
        for def in &self.sensors {
            let id = SensorId::new(def.index as i64).map_err(tr_engine::EngineError::from)?;
            let settings = SensorSettings {
                enabled: def.enabled,
                simulated: def.simulated,
                simulated_value: def.simulated_value,
                offset: def.offset,
                scale: def.scale,
            };
            bank.set_settings(id, settings)
                .map_err(tr_engine::EngineError::from)?;
        }
        Ok(())
    }

    /// Build the engine for this station over `driver`.
    pub fn build_engine<D: SensorDriver>(
        &self,
        driver: D,
    ) -> ProjectResult<RegulationEngine<SensorBank<D>, EnableLatch>> {
        let config = self.engine_config()?;
        let mut bank = SensorBank::new(driver);
        self.configure_sensors(&mut bank)?;
        Ok(RegulationEngine::new(config, bank, self.enable_latch())?)
    }

    /// Channel ids listed in this station, in file order.
    pub fn listed_channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels
            .iter()
            .filter_map(|c| ChannelId::new(c.index as i64).ok())
    }
}
