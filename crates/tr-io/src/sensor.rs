//! Temperature acquisition contract and the calibrated sensor bank.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tr_core::{FaultCode, NUM_SENSORS, SensorId};

use crate::error::{IoError, IoResult};

/// Age after which a sensor without fresh data is reported as timed out.
pub const SENSOR_TIMEOUT_MS: u64 = 5000;

/// Health of one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SensorHealth {
    #[default]
    Ok,
    Failed,
}

impl SensorHealth {
    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Failed => 1,
        }
    }
}

/// One reading as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Calibrated temperature, `None` when invalid.
    pub value: Option<f64>,
    pub health: SensorHealth,
    pub fault: FaultCode,
    /// Time of the last successful acquisition.
    pub timestamp_ms: u64,
    pub simulated: bool,
}

impl Sample {
    pub fn ok(value: f64, timestamp_ms: u64) -> Self {
        Self {
            value: Some(value),
            health: SensorHealth::Ok,
            fault: FaultCode::None,
            timestamp_ms,
            simulated: false,
        }
    }

    pub fn failed(fault: FaultCode, timestamp_ms: u64) -> Self {
        Self {
            value: None,
            health: SensorHealth::Failed,
            fault,
            timestamp_ms,
            simulated: false,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.health == SensorHealth::Ok
    }
}

/// Consumed sensor contract.
pub trait SensorPort {
    /// Acquire every sensor once. Called at the start of each tick.
    fn refresh(&mut self, now_ms: u64);

    /// Latest sample of `sensor`.
    fn read(&self, sensor: SensorId) -> Sample;

    /// Route `sensor` to its simulated value instead of the hardware.
    fn set_simulated(&mut self, sensor: SensorId, enabled: bool);

    fn set_simulated_value(&mut self, sensor: SensorId, value: f64);
}

/// Outcome of one hardware acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acquisition {
    /// Fresh raw value.
    Value(f64),
    /// No new conversion available yet; keep the previous value.
    Pending,
    /// The device did not answer.
    Disconnected,
}

/// Physical acquisition for one bank of sensors.
pub trait SensorDriver {
    fn acquire(&mut self, sensor: SensorId) -> Acquisition;
}

/// A driver with nothing attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDriver;

impl SensorDriver for NullDriver {
    fn acquire(&mut self, _sensor: SensorId) -> Acquisition {
        Acquisition::Disconnected
    }
}

/// Per-sensor settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSettings {
    pub enabled: bool,
    pub simulated: bool,
    pub simulated_value: f64,
    /// Calibrated value = raw * scale + offset.
    pub offset: f64,
    pub scale: f64,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            simulated: false,
            simulated_value: 20.0,
            offset: 0.0,
            scale: 1.0,
        }
    }
}

impl SensorSettings {
    pub fn validate(&self) -> IoResult<()> {
        if !self.simulated_value.is_finite() {
            return Err(IoError::InvalidSettings {
                what: "simulated value must be finite",
            });
        }
        if !self.offset.is_finite() || !self.scale.is_finite() || self.scale == 0.0 {
            return Err(IoError::InvalidSettings {
                what: "calibration must be finite with a non-zero scale",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    settings: SensorSettings,
    sample: Sample,
}

/// Sensors behind one driver, with calibration, simulation override and
/// stale-data detection.
#[derive(Debug, Clone)]
pub struct SensorBank<D> {
    driver: D,
    slots: [Slot; NUM_SENSORS],
    timeout_ms: u64,
}

impl<D: SensorDriver> SensorBank<D> {
    pub fn new(driver: D) -> Self {
        let slot = Slot {
            settings: SensorSettings::default(),
            sample: Sample::failed(FaultCode::SensorTimeout, 0),
        };
        Self {
            driver,
            slots: [slot; NUM_SENSORS],
            timeout_ms: SENSOR_TIMEOUT_MS,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn settings(&self, sensor: SensorId) -> SensorSettings {
        self.slots[sensor.index()].settings
    }

    pub fn set_settings(&mut self, sensor: SensorId, settings: SensorSettings) -> IoResult<()> {
        settings.validate()?;
        self.slots[sensor.index()].settings = settings;
        Ok(())
    }

    fn acquire_one(&mut self, sensor: SensorId, now_ms: u64) {
        let slot = &mut self.slots[sensor.index()];
        let settings = slot.settings;
        if !settings.enabled {
            slot.sample = Sample::failed(FaultCode::Configuration, slot.sample.timestamp_ms);
            return;
        }
        if settings.simulated {
            slot.sample = Sample {
                simulated: true,
                ..Sample::ok(settings.simulated_value, now_ms)
            };
            return;
        }

        let previous = slot.sample;
        let sample = match self.driver.acquire(sensor) {
            Acquisition::Value(raw) if raw.is_finite() => {
                Sample::ok(raw * settings.scale + settings.offset, now_ms)
            }
            Acquisition::Value(_) | Acquisition::Disconnected => {
                Sample::failed(FaultCode::SensorDisconnected, previous.timestamp_ms)
            }
            Acquisition::Pending => {
                if previous.is_ok()
                    && !previous.simulated
                    && now_ms.saturating_sub(previous.timestamp_ms) <= self.timeout_ms
                {
                    previous
                } else {
                    Sample::failed(FaultCode::SensorTimeout, previous.timestamp_ms)
                }
            }
        };

        if previous.is_ok() && !sample.is_ok() {
            warn!(sensor = %sensor, fault = %sample.fault, "sensor failed");
        }
        self.slots[sensor.index()].sample = sample;
    }
}

impl<D: SensorDriver> SensorPort for SensorBank<D> {
    fn refresh(&mut self, now_ms: u64) {
        for sensor in SensorId::all() {
            self.acquire_one(sensor, now_ms);
        }
    }

    /// Simulated sensors answer with their configured value directly, so a
    /// value set between ticks is visible immediately.
    fn read(&self, sensor: SensorId) -> Sample {
        let slot = &self.slots[sensor.index()];
        if slot.settings.enabled && slot.settings.simulated {
            Sample {
                simulated: true,
                ..Sample::ok(slot.settings.simulated_value, slot.sample.timestamp_ms)
            }
        } else {
            slot.sample
        }
    }

    fn set_simulated(&mut self, sensor: SensorId, enabled: bool) {
        debug!(sensor = %sensor, enabled, "sensor simulation");
        self.slots[sensor.index()].settings.simulated = enabled;
    }

    fn set_simulated_value(&mut self, sensor: SensorId, value: f64) {
        if value.is_finite() {
            self.slots[sensor.index()].settings.simulated_value = value;
        } else {
            warn!(sensor = %sensor, value, "ignoring non-finite simulated value");
        }
    }
}
