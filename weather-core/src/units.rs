//! Measurement units the report can be shown in.
//!
//! Readings always arrive in °C and m/s; conversion happens only at display time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Kelvin => "kelvin",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "°K",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[
            TemperatureUnit::Celsius,
            TemperatureUnit::Fahrenheit,
            TemperatureUnit::Kelvin,
        ]
    }

    /// Convert whole degrees Celsius; Kelvin is approximated as C + 273.
    pub fn convert(&self, celsius: i32) -> i32 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => (f64::from(celsius) * 9.0 / 5.0 + 32.0).round() as i32,
            TemperatureUnit::Kelvin => celsius + 273,
        }
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "c" | "°c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" | "°f" => Ok(TemperatureUnit::Fahrenheit),
            "kelvin" | "k" | "°k" => Ok(TemperatureUnit::Kelvin),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit, kelvin."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedUnit {
    #[default]
    MetersPerSecond,
    KilometersPerHour,
    MilesPerHour,
}

impl SpeedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::KilometersPerHour => "km/h",
            SpeedUnit::MilesPerHour => "mph",
        }
    }

    pub const fn all() -> &'static [SpeedUnit] {
        &[
            SpeedUnit::MetersPerSecond,
            SpeedUnit::KilometersPerHour,
            SpeedUnit::MilesPerHour,
        ]
    }

    /// Convert from meters per second, rounded to one decimal for km/h and mph.
    pub fn convert(&self, mps: f64) -> f64 {
        match self {
            SpeedUnit::MetersPerSecond => mps,
            SpeedUnit::KilometersPerHour => round1(mps * 3.6),
            SpeedUnit::MilesPerHour => round1(mps * 2.237),
        }
    }
}

impl TryFrom<&str> for SpeedUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "m/s" | "mps" => Ok(SpeedUnit::MetersPerSecond),
            "km/h" | "kph" => Ok(SpeedUnit::KilometersPerHour),
            "mph" => Ok(SpeedUnit::MilesPerHour),
            _ => Err(anyhow::anyhow!(
                "Unknown speed unit '{value}'. Supported units: m/s, km/h, mph."
            )),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_conversions() {
        assert_eq!(TemperatureUnit::Celsius.convert(20), 20);
        assert_eq!(TemperatureUnit::Kelvin.convert(20), 293);
        assert_eq!(TemperatureUnit::Fahrenheit.convert(20), 68);
        assert_eq!(TemperatureUnit::Fahrenheit.convert(-3), 27);
    }

    #[test]
    fn speed_conversions() {
        assert_eq!(SpeedUnit::MetersPerSecond.convert(2.5), 2.5);
        assert_eq!(SpeedUnit::KilometersPerHour.convert(2.5), 9.0);
        assert_eq!(SpeedUnit::MilesPerHour.convert(2.5), 5.6);
    }

    #[test]
    fn unit_names_roundtrip() {
        for unit in TemperatureUnit::all() {
            assert_eq!(TemperatureUnit::try_from(unit.as_str()).unwrap(), *unit);
        }
        for unit in SpeedUnit::all() {
            assert_eq!(SpeedUnit::try_from(unit.as_str()).unwrap(), *unit);
        }
    }

    #[test]
    fn unknown_units_error() {
        assert!(TemperatureUnit::try_from("rankine").is_err());
        assert!(SpeedUnit::try_from("knots").is_err());
    }
}
