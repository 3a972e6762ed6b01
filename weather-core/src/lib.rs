//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Running external commands under a timeout, with failure classification
//! - Parsing locator and OpenWeather output into typed records
//! - The acquisition facade tying the two together
//! - Configuration, units and report formatting
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
mod payload;
pub mod provider;
pub mod units;

pub use command::{CommandSpec, ProcessExecutionResult, ProcessRunner, SystemRunner};
pub use config::Config;
pub use error::{ApiProblem, MissingField, WeatherError};
pub use format::{DisplayOptions, format_coordinates, format_weather};
pub use model::{Condition, Coordinates, Language, WeatherReading};
pub use provider::{AcquisitionSettings, LocatorId, WeatherService, parse_coordinates, parse_weather};
