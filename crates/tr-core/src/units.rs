// tr-core/src/units.rs

use uom::si::f64::{
    HeatCapacity as UomHeatCapacity, Power as UomPower,
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type HeatCapacity = UomHeatCapacity;
pub type Power = UomPower;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;

#[inline]
pub fn celsius(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn to_celsius(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    t.get::<degree_celsius>()
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn joules_per_kelvin(v: f64) -> HeatCapacity {
    use uom::si::heat_capacity::joule_per_kelvin;
    HeatCapacity::new::<joule_per_kelvin>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn ms(v: u64) -> Time {
    use uom::si::time::millisecond;
    Time::new::<millisecond>(v as f64)
}
