use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use weather_core::{
    Config, Language, LocatorId, WeatherService, format_coordinates, format_weather,
    units::{SpeedUnit, TemperatureUnit},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather at your location")]
pub struct Cli {
    /// Log acquisition steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather at your location (the default).
    Show {
        /// Print the reading as JSON instead of the text report.
        #[arg(long)]
        json: bool,
    },

    /// Print your current GPS coordinates.
    Coords,

    /// Interactively set the API key, language, locator and units.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command.unwrap_or(Command::Show { json: false }) {
            Command::Show { json } => {
                let service = WeatherService::system(config.acquisition_settings()?);
                let coordinates = service.get_coordinates().await?;
                let reading = service.get_weather(coordinates).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&reading)?);
                } else {
                    println!("{}", format_weather(&reading, &config.display_options()));
                }
            }
            Command::Coords => {
                let service = WeatherService::system(config.acquisition_settings()?);
                let coordinates = service.get_coordinates().await?;
                println!("{}", format_coordinates(&coordinates));
            }
            Command::Configure => configure(config)?,
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key (leave empty to keep current):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.api_key = Some(api_key.trim().to_string());
    }

    let language = Select::new("Language:", Language::all().to_vec())
        .prompt()
        .context("Failed to read language")?;
    config.language = language.code().to_string();

    let locator = Select::new("Location source:", LocatorId::all().to_vec())
        .prompt()
        .context("Failed to read location source")?;
    config.locator = locator.as_str().to_string();

    let temperature_unit = Select::new(
        "Temperature unit:",
        TemperatureUnit::all().iter().map(|unit| unit.as_str()).collect(),
    )
    .prompt()
    .context("Failed to read temperature unit")?;
    config.temperature_unit = temperature_unit.to_string();

    let speed_unit = Select::new(
        "Wind speed unit:",
        SpeedUnit::all().iter().map(|unit| unit.as_str()).collect(),
    )
    .prompt()
    .context("Failed to read wind speed unit")?;
    config.speed_unit = speed_unit.to_string();

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}
