use crate::{
    command::{self, CommandSpec, DEFAULT_TIMEOUT, ProcessRunner, SystemRunner},
    error::WeatherError,
    model::{Coordinates, Language, WeatherReading},
};
use std::{convert::TryFrom, sync::Arc, time::Duration};
use tracing::info;

pub mod locator;
pub mod openweather;

pub use locator::parse_coordinates;
pub use openweather::{condition_from_id, parse_weather};

/// curl exits with 6 when it cannot resolve the host.
pub const CURL_NO_CONNECTIVITY_EXIT_CODE: i32 = 6;

/// Where the current position comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocatorId {
    /// Platform location services via the `whereami` tool.
    #[default]
    Whereami,
    /// IP geolocation from ipinfo.io, fetched with curl.
    IpInfo,
}

impl LocatorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorId::Whereami => "whereami",
            LocatorId::IpInfo => "ipinfo",
        }
    }

    pub const fn all() -> &'static [LocatorId] {
        &[LocatorId::Whereami, LocatorId::IpInfo]
    }

    fn fetches_over_network(&self) -> bool {
        matches!(self, LocatorId::IpInfo)
    }
}

impl std::fmt::Display for LocatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LocatorId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "whereami" => Ok(LocatorId::Whereami),
            "ipinfo" => Ok(LocatorId::IpInfo),
            _ => Err(anyhow::anyhow!(
                "Unknown locator '{value}'. Supported locators: whereami, ipinfo."
            )),
        }
    }
}

/// Everything the acquisition calls need, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionSettings {
    pub api_key: Option<String>,
    pub language: Language,
    pub locator: LocatorId,
    /// Digits to round coordinates to; `None` keeps them as reported.
    pub coordinate_precision: Option<u32>,
    pub timeout: Duration,
    /// Exit code of curl that means "no network".
    pub no_connectivity_exit_code: Option<i32>,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            language: Language::default(),
            locator: LocatorId::default(),
            coordinate_precision: Some(2),
            timeout: DEFAULT_TIMEOUT,
            no_connectivity_exit_code: Some(CURL_NO_CONNECTIVITY_EXIT_CODE),
        }
    }
}

/// Single-shot location and weather lookups: build command, run it, parse its output.
#[derive(Debug, Clone)]
pub struct WeatherService {
    runner: Arc<dyn ProcessRunner>,
    settings: AcquisitionSettings,
}

impl WeatherService {
    pub fn new(runner: Arc<dyn ProcessRunner>, settings: AcquisitionSettings) -> Self {
        Self { runner, settings }
    }

    /// Service backed by real child processes.
    pub fn system(settings: AcquisitionSettings) -> Self {
        Self::new(Arc::new(SystemRunner), settings)
    }

    pub fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }

    pub async fn get_coordinates(&self) -> Result<Coordinates, WeatherError> {
        let locator = self.settings.locator;
        let spec = self.prepare(locator::locate_command(locator), locator.fetches_over_network());

        let output = command::execute(self.runner.as_ref(), &spec).await?;
        let coordinates = parse_coordinates(&output.stdout, self.settings.coordinate_precision)?;

        info!(%locator, latitude = coordinates.latitude, longitude = coordinates.longitude, "Got coordinates");
        Ok(coordinates)
    }

    pub async fn get_weather(&self, coordinates: Coordinates) -> Result<WeatherReading, WeatherError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(WeatherError::NoCredential {
                provider: "OpenWeather",
            })?;

        let url = openweather::request_url(coordinates, api_key, self.settings.language);
        let spec = self.prepare(openweather::fetch_command(url), true);

        let output = command::execute(self.runner.as_ref(), &spec).await?;
        let reading = parse_weather(&output.stdout)?;

        info!(city = %reading.city, temperature = reading.temperature, "Got weather");
        Ok(reading)
    }

    fn prepare(&self, spec: CommandSpec, over_network: bool) -> CommandSpec {
        let sentinel = if over_network {
            self.settings.no_connectivity_exit_code
        } else {
            None
        };

        spec.with_timeout(self.settings.timeout)
            .with_no_connectivity_exit_code(sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        command::{RawOutput, testing::ScriptedRunner},
        model::Condition,
    };

    const WEATHER: &str = r#"{"weather":[{"id":803,"description":"Broken Clouds"}],"main":{"temp":12.6},"wind":{"speed":4.1},"sys":{"sunrise":1656115279,"sunset":1656178205},"name":"Kazan"}"#;

    fn service(runner: &Arc<ScriptedRunner>, settings: AcquisitionSettings) -> WeatherService {
        WeatherService::new(runner.clone(), settings)
    }

    fn with_key() -> AcquisitionSettings {
        AcquisitionSettings {
            api_key: Some("KEY".into()),
            ..AcquisitionSettings::default()
        }
    }

    #[test]
    fn locator_id_as_str_roundtrip() {
        for id in LocatorId::all() {
            let parsed = LocatorId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_locator_error() {
        let err = LocatorId::try_from("gps9000").unwrap_err();
        assert!(err.to_string().contains("Unknown locator"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_spawning() {
        let runner = Arc::new(ScriptedRunner::new());

        for api_key in [None, Some("  ".to_string())] {
            let settings = AcquisitionSettings {
                api_key,
                ..AcquisitionSettings::default()
            };
            let err = service(&runner, settings)
                .get_weather(Coordinates::new(50.0, 50.0))
                .await
                .unwrap_err();

            assert!(matches!(err, WeatherError::NoCredential { .. }));
        }
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn get_weather_runs_curl_with_substituted_url() {
        let runner = Arc::new(ScriptedRunner::new().with_stdout(WEATHER));
        let settings = AcquisitionSettings {
            language: Language::Russian,
            timeout: Duration::from_secs(3),
            ..with_key()
        };

        let reading = service(&runner, settings)
            .get_weather(Coordinates::new(55.79, 49.12))
            .await
            .unwrap();

        assert_eq!(reading.temperature, 13);
        assert_eq!(reading.condition, Condition::Clouds);
        assert_eq!(reading.description, "broken clouds");
        assert_eq!(reading.city, "kazan");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].executable, "curl");
        assert_eq!(calls[0].timeout, Duration::from_secs(3));
        assert_eq!(calls[0].no_connectivity_exit_code, Some(6));
        let url = calls[0].arguments.last().unwrap();
        assert!(url.contains("lat=55.79&lon=49.12"));
        assert!(url.contains("appid=KEY"));
        assert!(url.contains("lang=ru"));
    }

    #[tokio::test]
    async fn get_weather_propagates_errors_verbatim() {
        let runner = Arc::new(ScriptedRunner::new().push(Ok(RawOutput {
            exit_code: Some(6),
            stdout: Vec::new(),
            stderr: b"curl: (6) Could not resolve host".to_vec(),
        })));

        let err = service(&runner, with_key())
            .get_weather(Coordinates::new(1.0, 2.0))
            .await
            .unwrap_err();

        match err {
            WeatherError::NoConnectivity { command, .. } => {
                assert!(command.starts_with("curl --silent https://api.openweathermap.org"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_weather_reports_missing_fields() {
        let runner = Arc::new(ScriptedRunner::new().with_stdout(r#"{"name": "kazan"}"#));

        let err = service(&runner, with_key())
            .get_weather(Coordinates::new(1.0, 2.0))
            .await
            .unwrap_err();

        assert!(err.missing_field().is_some());
    }

    #[tokio::test]
    async fn get_coordinates_rounds_by_default() {
        let runner = Arc::new(
            ScriptedRunner::new().with_stdout(r#"{"latitude": 55.755826, "longitude": 37.6173}"#),
        );

        let coords = service(&runner, AcquisitionSettings::default())
            .get_coordinates()
            .await
            .unwrap();

        assert_eq!(coords, Coordinates::new(55.76, 37.62));
        let calls = runner.calls();
        assert_eq!(calls[0].command_line(), "whereami -f json");
        assert_eq!(calls[0].no_connectivity_exit_code, None);
    }

    #[tokio::test]
    async fn get_coordinates_without_rounding_via_ipinfo() {
        let runner = Arc::new(ScriptedRunner::new().with_stdout(r#"{"loc": "55.7522,37.6156"}"#));
        let settings = AcquisitionSettings {
            locator: LocatorId::IpInfo,
            coordinate_precision: None,
            ..AcquisitionSettings::default()
        };

        let coords = service(&runner, settings).get_coordinates().await.unwrap();

        assert_eq!(coords, Coordinates::new(55.7522, 37.6156));
        assert_eq!(runner.calls()[0].no_connectivity_exit_code, Some(6));
    }

    #[tokio::test]
    async fn get_coordinates_propagates_timeout() {
        let runner = Arc::new(ScriptedRunner::new().push(Err(WeatherError::CommandTimedOut {
            command: "whereami -f json".into(),
            timeout: DEFAULT_TIMEOUT,
        })));

        let err = service(&runner, AcquisitionSettings::default())
            .get_coordinates()
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::CommandTimedOut { .. }));
    }
}
