use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// GPS position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Return a copy with both components rounded to `ndigits` decimal digits.
    ///
    /// Precision above [`MAX_COORDINATE_PRECISION`] leaves the components unchanged.
    pub fn rounded(&self, ndigits: u32) -> Self {
        Self {
            latitude: round_to(self.latitude, ndigits),
            longitude: round_to(self.longitude, ndigits),
        }
    }
}

/// Beyond this many decimal digits an `f64` coordinate has nothing left to round.
pub const MAX_COORDINATE_PRECISION: u32 = 15;

fn round_to(value: f64, ndigits: u32) -> f64 {
    if ndigits > MAX_COORDINATE_PRECISION {
        return value;
    }
    let factor = 10f64.powi(ndigits as i32);
    (value * factor).round() / factor
}

/// Weather categories reported by OpenWeather condition codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Mist,
    Smoke,
    Haze,
    Dust,
    Fog,
    Sand,
    Ash,
    Squall,
    Tornado,
    Clear,
    Clouds,
}

impl Condition {
    pub fn label(&self, language: Language) -> &'static str {
        match language {
            Language::English => match self {
                Condition::Thunderstorm => "Thunderstorm",
                Condition::Drizzle => "Drizzle",
                Condition::Rain => "Rain",
                Condition::Snow => "Snow",
                Condition::Mist => "Mist",
                Condition::Smoke => "Smoke",
                Condition::Haze => "Haze",
                Condition::Dust => "Dust",
                Condition::Fog => "Fog",
                Condition::Sand => "Sand",
                Condition::Ash => "Ash",
                Condition::Squall => "Squall",
                Condition::Tornado => "Tornado",
                Condition::Clear => "Clear",
                Condition::Clouds => "Clouds",
            },
            Language::Russian => match self {
                Condition::Thunderstorm => "Гроза",
                Condition::Drizzle => "Изморось",
                Condition::Rain => "Дождь",
                Condition::Snow => "Снег",
                Condition::Mist => "Мгла",
                Condition::Smoke => "Дым",
                Condition::Haze => "Дымка",
                Condition::Dust => "Пыль",
                Condition::Fog => "Туман",
                Condition::Sand => "Песок",
                Condition::Ash => "Пепел",
                Condition::Squall => "Шквал",
                Condition::Tornado => "Торнадо",
                Condition::Clear => "Ясно",
                Condition::Clouds => "Облачно",
            },
        }
    }
}

/// Languages the provider is asked to describe the weather in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Russian => "ru",
        }
    }

    pub const fn all() -> &'static [Language] {
        &[Language::English, Language::Russian]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Language {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "en" => Ok(Language::English),
            "ru" => Ok(Language::Russian),
            _ => Err(anyhow::anyhow!(
                "Unknown language '{value}'. Supported languages: en, ru."
            )),
        }
    }
}

/// Current weather at one place, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Whole degrees Celsius.
    pub temperature: i32,
    pub condition: Condition,
    pub description: String,
    /// Meters per second.
    pub wind_speed: f64,
    pub sunrise: DateTime<Local>,
    pub sunset: DateTime<Local>,
    pub city: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounded_keeps_requested_digits() {
        let coords = Coordinates::new(55.755_826, 37.617_3);

        assert_eq!(coords.rounded(2), Coordinates::new(55.76, 37.62));
        assert_eq!(coords.rounded(0), Coordinates::new(56.0, 38.0));
    }

    #[test]
    fn rounded_returns_new_value() {
        let coords = Coordinates::new(1.23456, -1.23456);
        let rounded = coords.rounded(3);

        assert_eq!(coords, Coordinates::new(1.23456, -1.23456));
        assert_eq!(rounded, Coordinates::new(1.235, -1.235));
    }

    #[test]
    fn excessive_precision_keeps_value_finite() {
        let coords = Coordinates::new(55.75, 37.6);

        assert_eq!(coords.rounded(400), coords);
        assert_eq!(coords.rounded(MAX_COORDINATE_PRECISION + 1), coords);
    }

    #[test]
    fn language_code_roundtrip() {
        for lang in Language::all() {
            let parsed = Language::try_from(lang.code()).expect("roundtrip should succeed");
            assert_eq!(*lang, parsed);
        }
    }

    #[test]
    fn unknown_language_error() {
        let err = Language::try_from("xx").unwrap_err();
        assert!(err.to_string().contains("Unknown language"));
    }

    proptest! {
        #[test]
        fn rounding_is_idempotent(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
            ndigits in 0u32..=8
        ) {
            let once = Coordinates::new(lat, lon).rounded(ndigits);
            let twice = once.rounded(ndigits);
            prop_assert_eq!(once, twice);
        }
    }
}
