use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::debug;

use crate::{
    command::CommandSpec,
    error::{ApiProblem, MissingField, WeatherError},
    model::{Condition, Coordinates, Language, WeatherReading},
    payload::extract_object,
};

const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Condition code prefixes, most specific first so `800` wins over `80`.
const CONDITION_PREFIXES: &[(&str, Condition)] = &[
    ("701", Condition::Mist),
    ("711", Condition::Smoke),
    ("721", Condition::Haze),
    ("731", Condition::Dust),
    ("741", Condition::Fog),
    ("751", Condition::Sand),
    ("761", Condition::Dust),
    ("762", Condition::Ash),
    ("771", Condition::Squall),
    ("781", Condition::Tornado),
    ("800", Condition::Clear),
    ("80", Condition::Clouds),
    ("2", Condition::Thunderstorm),
    ("3", Condition::Drizzle),
    ("5", Condition::Rain),
    ("6", Condition::Snow),
];

// Every field is optional so that each absent one is reported on its own.

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwConditionId {
    Code(u64),
    Text(String),
}

impl OwConditionId {
    fn to_code(&self) -> String {
        match self {
            OwConditionId::Code(code) => code.to_string(),
            OwConditionId::Text(text) => text.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: Option<OwConditionId>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    main: Option<OwMain>,
    weather: Option<Vec<OwWeather>>,
    wind: Option<OwWind>,
    sys: Option<OwSys>,
}

impl OwCurrentResponse {
    fn first_weather(&self) -> Option<&OwWeather> {
        self.weather.as_ref()?.first()
    }
}

/// Current-weather request URL with units fixed to metric.
pub(crate) fn request_url(coordinates: Coordinates, api_key: &str, language: Language) -> String {
    format!(
        "{CURRENT_WEATHER_URL}?lat={}&lon={}&appid={api_key}&lang={}&units=metric",
        coordinates.latitude,
        coordinates.longitude,
        language.code(),
    )
}

pub(crate) fn fetch_command(url: String) -> CommandSpec {
    CommandSpec::new("curl", vec!["--silent".into(), url])
}

/// Map a provider condition code such as `"803"` to its category.
pub fn condition_from_id(id: &str) -> Option<Condition> {
    CONDITION_PREFIXES
        .iter()
        .find(|(prefix, _)| id.starts_with(prefix))
        .map(|(_, condition)| *condition)
}

/// Parse an OpenWeather current-weather response.
///
/// Each field is looked up on its own and reports its own [`MissingField`]; nothing is
/// defaulted. A field of the wrong type makes the whole payload malformed.
pub fn parse_weather(text: &str) -> Result<WeatherReading, WeatherError> {
    let response: OwCurrentResponse = extract_object(text).map_err(|reason| {
        debug!(reason = %reason, "Unparseable weather output");
        WeatherError::CantGetWeather {
            reason,
            output: text.to_owned(),
        }
    })?;

    Ok(WeatherReading {
        temperature: parse_temperature(&response, text)?,
        condition: parse_condition(&response, text)?,
        description: parse_description(&response, text)?,
        wind_speed: parse_wind_speed(&response, text)?,
        sunrise: parse_sun_time(
            response.sys.as_ref().and_then(|sys| sys.sunrise),
            MissingField::Sunrise,
            text,
        )?,
        sunset: parse_sun_time(
            response.sys.as_ref().and_then(|sys| sys.sunset),
            MissingField::Sunset,
            text,
        )?,
        city: parse_city(&response, text)?,
    })
}

fn parse_temperature(response: &OwCurrentResponse, payload: &str) -> Result<i32, WeatherError> {
    response
        .main
        .as_ref()
        .and_then(|main| main.temp)
        .map(|temp| temp.round() as i32)
        .ok_or_else(|| WeatherError::missing(MissingField::Temperature, payload))
}

fn parse_condition(response: &OwCurrentResponse, payload: &str) -> Result<Condition, WeatherError> {
    let id = response
        .first_weather()
        .and_then(|entry| entry.id.as_ref())
        .map(OwConditionId::to_code)
        .ok_or_else(|| WeatherError::missing(MissingField::ConditionId, payload))?;

    condition_from_id(&id).ok_or_else(|| WeatherError::ApiServiceError {
        problem: ApiProblem::UnknownCondition(id),
        payload: payload.to_owned(),
    })
}

fn parse_description(response: &OwCurrentResponse, payload: &str) -> Result<String, WeatherError> {
    response
        .first_weather()
        .and_then(|entry| entry.description.clone())
        .ok_or_else(|| WeatherError::missing(MissingField::Description, payload))
}

fn parse_wind_speed(response: &OwCurrentResponse, payload: &str) -> Result<f64, WeatherError> {
    response
        .wind
        .as_ref()
        .and_then(|wind| wind.speed)
        .ok_or_else(|| WeatherError::missing(MissingField::WindSpeed, payload))
}

fn parse_sun_time(
    timestamp: Option<i64>,
    event: MissingField,
    payload: &str,
) -> Result<DateTime<Local>, WeatherError> {
    timestamp
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|utc| utc.with_timezone(&Local))
        .ok_or_else(|| WeatherError::missing(event, payload))
}

fn parse_city(response: &OwCurrentResponse, payload: &str) -> Result<String, WeatherError> {
    response
        .name
        .clone()
        .ok_or_else(|| WeatherError::missing(MissingField::City, payload))
}
