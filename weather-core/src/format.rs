use crate::{
    model::{Coordinates, Language, WeatherReading},
    units::{SpeedUnit, TemperatureUnit},
};

/// How a reading should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayOptions {
    pub language: Language,
    pub temperature_unit: TemperatureUnit,
    pub speed_unit: SpeedUnit,
}

struct Labels {
    wind: &'static str,
    sunrise: &'static str,
    sunset: &'static str,
}

fn labels(language: Language) -> Labels {
    match language {
        Language::English => Labels {
            wind: "Wind",
            sunrise: "Sunrise",
            sunset: "Sunset",
        },
        Language::Russian => Labels {
            wind: "Ветер",
            sunrise: "Восход",
            sunset: "Закат",
        },
    }
}

/// Render a reading as the multi-line report printed by `weather show`.
pub fn format_weather(reading: &WeatherReading, options: &DisplayOptions) -> String {
    let labels = labels(options.language);

    format!(
        "{city}, {temperature}{temperature_unit}, {condition}\n\n\
         {description}\n\
         {wind}: {speed}{speed_unit}\n\
         {sunrise}: {sunrise_time}\n\
         {sunset}: {sunset_time}",
        city = capitalize(&reading.city),
        temperature = options.temperature_unit.convert(reading.temperature),
        temperature_unit = options.temperature_unit.symbol(),
        condition = reading.condition.label(options.language),
        description = reading.description,
        wind = labels.wind,
        speed = options.speed_unit.convert(reading.wind_speed),
        speed_unit = options.speed_unit.as_str(),
        sunrise = labels.sunrise,
        sunrise_time = reading.sunrise.format("%H:%M"),
        sunset = labels.sunset,
        sunset_time = reading.sunset.format("%H:%M"),
    )
}

pub fn format_coordinates(coordinates: &Coordinates) -> String {
    format!("{}, {}", coordinates.latitude, coordinates.longitude)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
