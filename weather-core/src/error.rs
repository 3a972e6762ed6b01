use std::{fmt, io, string::FromUtf8Error, time::Duration};

use thiserror::Error;

/// Field of a provider response that parsing could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Temperature,
    ConditionId,
    Description,
    WindSpeed,
    Sunrise,
    Sunset,
    City,
}

impl MissingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingField::Temperature => "temperature",
            MissingField::ConditionId => "condition identifier",
            MissingField::Description => "description",
            MissingField::WindSpeed => "wind speed",
            MissingField::Sunrise => "sunrise time",
            MissingField::Sunset => "sunset time",
            MissingField::City => "city name",
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What exactly was wrong with a decoded provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiProblem {
    Missing(MissingField),
    UnknownCondition(String),
}

impl fmt::Display for ApiProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiProblem::Missing(field) => write!(f, "There is no {field} in expected place"),
            ApiProblem::UnknownCondition(id) => write!(f, "Unknown condition identifier {id}"),
        }
    }
}

/// Every way location or weather acquisition can fail.
///
/// Variants are raised where the failure is detected and carry the command line or the raw
/// payload involved, so callers can print them as-is.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("There's no command '{executable}' in your system")]
    CommandNotFound {
        executable: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' runs more than {timeout:?}")]
    CommandTimedOut { command: String, timeout: Duration },

    #[error(
        "There is no internet connection. Command '{command}' has ended with exit code {exit_code} and stderr:\n{stderr}"
    )]
    NoConnectivity {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Command '{command}' has ended with exit code {} and stderr:\n{stderr}", display_code(.exit_code))]
    CommandExecutionFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Can't decode output of command '{command}'")]
    OutputUndecodable {
        command: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error("Can't get GPS coordinates: {reason}. Output:\n'{output}'")]
    CantGetGpsCoordinates { reason: String, output: String },

    #[error("Can't get weather: {reason}. Output:\n'{output}'")]
    CantGetWeather { reason: String, output: String },

    #[error("{problem} of weather provider response:\n{payload}")]
    ApiServiceError { problem: ApiProblem, payload: String },

    #[error(
        "No API key configured for {provider}.\n\
         Hint: set OPEN_WEATHER_API_KEY or run `weather configure`."
    )]
    NoCredential { provider: &'static str },
}

impl WeatherError {
    pub(crate) fn missing(field: MissingField, payload: &str) -> Self {
        WeatherError::ApiServiceError {
            problem: ApiProblem::Missing(field),
            payload: payload.to_owned(),
        }
    }

    /// Field named by an `ApiServiceError`, if this is one about a missing field.
    pub fn missing_field(&self) -> Option<MissingField> {
        match self {
            WeatherError::ApiServiceError {
                problem: ApiProblem::Missing(field),
                ..
            } => Some(*field),
            _ => None,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<killed by signal>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_service_error_names_field_and_echoes_payload() {
        let err = WeatherError::missing(MissingField::WindSpeed, r#"{"wind":{}}"#);

        let msg = err.to_string();
        assert!(msg.contains("There is no wind speed"));
        assert!(msg.contains(r#"{"wind":{}}"#));
        assert_eq!(err.missing_field(), Some(MissingField::WindSpeed));
    }

    #[test]
    fn unknown_condition_is_not_a_missing_field() {
        let err = WeatherError::ApiServiceError {
            problem: ApiProblem::UnknownCondition("900".into()),
            payload: "{}".into(),
        };

        assert!(err.to_string().contains("Unknown condition identifier 900"));
        assert_eq!(err.missing_field(), None);
    }

    #[test]
    fn execution_failure_without_exit_code_mentions_signal() {
        let err = WeatherError::CommandExecutionFailed {
            command: "curl".into(),
            exit_code: None,
            stderr: String::new(),
        };

        assert!(err.to_string().contains("killed by signal"));
    }
}
