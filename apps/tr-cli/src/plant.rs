//! First-order thermal plant used to exercise the regulator without hardware.
//!
//! Each channel heats one lumped thermal mass:
//!
//! ```text
//! C dT/dt = u * P_max - G (T - T_ambient)
//! ```
//!
//! with `u` the normalized actuator command. Sensor `i` reads zone `i`;
//! sensors without a zone report disconnected.

use tr_core::units::{
    HeatCapacity, Power, Temperature, Time, celsius, joules_per_kelvin, to_celsius, watts,
};
use tr_core::{NUM_CHANNELS, SensorId};
use tr_io::{Acquisition, SensorDriver};
use uom::si::heat_capacity::joule_per_kelvin;
use uom::si::power::watt;
use uom::si::time::second;

use crate::error::{CliError, CliResult};

#[derive(Clone, Debug)]
pub struct PlantParams {
    pub capacity: HeatCapacity,
    /// Heat loss to ambient, in W/K.
    pub loss_w_per_k: f64,
    pub max_power: Power,
    pub ambient: Temperature,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            capacity: joules_per_kelvin(1500.0),
            loss_w_per_k: 3.0,
            max_power: watts(400.0),
            ambient: celsius(20.0),
        }
    }
}

/// One thermal zone per channel.
#[derive(Clone, Debug)]
pub struct Plant {
    params: PlantParams,
    zones: [Temperature; NUM_CHANNELS],
}

impl Plant {
    pub fn new(params: PlantParams) -> CliResult<Self> {
        if !(params.capacity.get::<joule_per_kelvin>() > 0.0) {
            return Err(CliError::InvalidArg {
                what: "plant heat capacity must be positive".into(),
            });
        }
        if !(params.loss_w_per_k >= 0.0) || !(params.max_power.get::<watt>() >= 0.0) {
            return Err(CliError::InvalidArg {
                what: "plant loss and power must be non-negative".into(),
            });
        }
        let zones = [params.ambient; NUM_CHANNELS];
        Ok(Self { params, zones })
    }

    pub fn temperature(&self, zone: usize) -> f64 {
        to_celsius(self.zones[zone])
    }

    /// Advance every zone by `dt` (forward Euler) under normalized commands.
    pub fn step(&mut self, commands: [f64; NUM_CHANNELS], dt: Time) {
        let ambient = to_celsius(self.params.ambient);
        let capacity = self.params.capacity.get::<joule_per_kelvin>();
        let dt = dt.get::<second>();
        for (zone, u) in self.zones.iter_mut().zip(commands) {
            let t = to_celsius(*zone);
            let heating = self.params.max_power * u.clamp(0.0, 1.0);
            let loss = watts(self.params.loss_w_per_k * (t - ambient));
            let net = (heating - loss).get::<watt>();
            *zone = celsius(t + net / capacity * dt);
        }
    }
}

impl SensorDriver for Plant {
    fn acquire(&mut self, sensor: SensorId) -> Acquisition {
        match self.zones.get(sensor.index()) {
            Some(t) => Acquisition::Value(to_celsius(*t)),
            None => Acquisition::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tr_core::units::s;

    #[test]
    fn heats_toward_steady_state() {
        let mut plant = Plant::new(PlantParams::default()).unwrap();
        for _ in 0..20_000 {
            plant.step([1.0, 0.0, 0.5], s(1.0));
        }
        // Steady state: ambient + P/G.
        assert!((plant.temperature(0) - (20.0 + 400.0 / 3.0)).abs() < 0.5);
        assert!((plant.temperature(1) - 20.0).abs() < 1e-9);
        assert!((plant.temperature(2) - (20.0 + 200.0 / 3.0)).abs() < 0.5);
    }

    #[test]
    fn unmapped_sensors_are_disconnected() {
        let mut plant = Plant::new(PlantParams::default()).unwrap();
        assert_eq!(
            plant.acquire(SensorId::new(0).unwrap()),
            Acquisition::Value(20.0)
        );
        assert_eq!(
            plant.acquire(SensorId::new(4).unwrap()),
            Acquisition::Disconnected
        );
    }

    #[test]
    fn rejects_bad_params() {
        let params = PlantParams {
            capacity: joules_per_kelvin(0.0),
            ..PlantParams::default()
        };
        assert!(Plant::new(params).is_err());
    }
}
