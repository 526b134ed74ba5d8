use agro_core::{
    Config, Coordinates, Form, HandlerRegistry, HttpPredictionApi, WeatherReading, suggest,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Text};
use std::{collections::HashMap, process::ExitCode, sync::Arc};
use tracing::{debug, warn};

use crate::terminal::TerminalPage;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "agro", version, about = "Crop yield, suitability and weather advisory CLI")]
pub struct Cli {
    /// Log request details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Prediction service URL; overrides the config file and AGRO_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

// Form values stay strings here; the form handlers do the parsing.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict crop yield in kg/ha.
    Predict {
        /// Rainfall, mm.
        #[arg(long, allow_hyphen_values = true)]
        rainfall: String,
        /// Temperature, °C.
        #[arg(long, allow_hyphen_values = true)]
        temperature: String,
        #[arg(long, allow_hyphen_values = true)]
        soil_ph: String,
        /// Fertilizer use, kg/ha.
        #[arg(long, allow_hyphen_values = true)]
        fertilizer: String,
    },

    /// Check whether conditions suit a crop.
    Suitability {
        /// Crop name, e.g. "wheat", "rice" or "corn".
        #[arg(long)]
        crop: String,
        #[arg(long, allow_hyphen_values = true)]
        rainfall: String,
        #[arg(long, allow_hyphen_values = true)]
        temperature: String,
        #[arg(long, allow_hyphen_values = true)]
        soil_ph: String,
    },

    /// Find regions and crops matching the given climate.
    Regions {
        #[arg(long, allow_hyphen_values = true)]
        temperature: String,
        #[arg(long, allow_hyphen_values = true)]
        soil_ph: String,
        #[arg(long, allow_hyphen_values = true)]
        rainfall: String,
    },

    /// Show weather for a position or city and suggest a crop.
    ///
    /// Without flags the configured location is used.
    Weather {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,
    },

    /// Suggest a crop from temperature and humidity without calling the service.
    Suggest {
        #[arg(long, allow_hyphen_values = true)]
        temperature: f64,
        #[arg(long, allow_hyphen_values = true)]
        humidity: f64,
    },

    /// Interactively set the service URL and default location.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let succeeded = self.execute(Config::load).await?;
        Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }

    /// Run the command, reading config through `load_config` only when the
    /// command needs it. Returns `false` when a form failed or alerted.
    async fn execute<L>(self, load_config: L) -> anyhow::Result<bool>
    where
        L: Fn() -> anyhow::Result<Config>,
    {
        let (form, fields, position) = match self.command {
            Command::Configure => {
                configure(starting_config(load_config()))?;
                return Ok(true);
            }
            Command::Suggest { temperature, humidity } => {
                let crop = suggest(WeatherReading::new(temperature, humidity));
                println!("Suggested Crop: {crop}");
                return Ok(true);
            }
            Command::Predict { rainfall, temperature, soil_ph, fertilizer } => (
                Form::Predict,
                fields([
                    ("rainfall", rainfall),
                    ("temperature", temperature),
                    ("soil_ph", soil_ph),
                    ("fertilizer", fertilizer),
                ]),
                None,
            ),
            Command::Suitability { crop, rainfall, temperature, soil_ph } => (
                Form::Suitability,
                fields([
                    ("crop", crop),
                    ("rainfall_suitability", rainfall),
                    ("temperature_suitability", temperature),
                    ("soil_ph_suitability", soil_ph),
                ]),
                None,
            ),
            Command::Regions { temperature, soil_ph, rainfall } => (
                Form::Regions,
                fields([
                    ("temperature_region", temperature),
                    ("soil_ph_region", soil_ph),
                    ("rainfall_region", rainfall),
                ]),
                None,
            ),
            Command::Weather { city: Some(city), .. } => {
                (Form::CityWeather, fields([("city", city)]), None)
            }
            Command::Weather { lat, lon, city: None } => {
                let position = match (lat, lon) {
                    (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
                    _ => load_config()?.location,
                };
                (Form::LocationWeather, HashMap::new(), position)
            }
        };

        let base_url = match self.api_url {
            Some(url) => url,
            None => load_config()?.api_base_url(),
        };

        let page = Arc::new(TerminalPage::new(fields, position));
        let api = Arc::new(HttpPredictionApi::new(base_url));
        debug!(base_url = api.base_url(), %form, "submitting form");

        HandlerRegistry::with_default_handlers(page.clone(), api).submit(form).await?;

        Ok(!page.had_failure())
    }
}

/// `configure` is how a broken config file gets fixed, so it starts over
/// from defaults when the file can't be read.
fn starting_config(loaded: anyhow::Result<Config>) -> Config {
    loaded.unwrap_or_else(|err| {
        warn!("ignoring unreadable config: {err:#}");
        Config::default()
    })
}

fn fields<const N: usize>(pairs: [(&str, String); N]) -> HashMap<String, String> {
    pairs.into_iter().map(|(name, value)| (name.to_string(), value)).collect()
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let current = config.api_base_url();
    let url = Text::new("Prediction service URL:")
        .with_default(&current)
        .prompt()
        .context("Failed to read service URL")?;
    config.set_api_base_url(url.trim());

    let set_location = Confirm::new("Set a default location for `agro weather`?")
        .with_default(config.location.is_some())
        .prompt()
        .context("Failed to read answer")?;

    if set_location {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number, e.g. 30.9")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number, e.g. 75.85")
            .prompt()
            .context("Failed to read longitude")?;
        config.set_location(latitude, longitude);
    } else {
        config.location = None;
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_keeps_raw_values() {
        let cli = Cli::parse_from([
            "agro", "predict", "--rainfall", "450", "--temperature", "-3.5", "--soil-ph", "6.5",
            "--fertilizer", "abc",
        ]);

        match cli.command {
            Command::Predict { temperature, fertilizer, .. } => {
                assert_eq!(temperature, "-3.5");
                assert_eq!(fertilizer, "abc");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn weather_city_conflicts_with_coordinates() {
        let res = Cli::try_parse_from(["agro", "weather", "--city", "Pune", "--lat", "1", "--lon", "2"]);
        assert!(res.is_err());
    }

    #[test]
    fn weather_lat_requires_lon() {
        let res = Cli::try_parse_from(["agro", "weather", "--lat", "18.5"]);
        assert!(res.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["agro", "suggest", "--temperature", "22", "--humidity", "65", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn suggest_accepts_negative_values() {
        let cli = Cli::try_parse_from(["agro", "suggest", "--temperature", "5", "--humidity", "-10"])
            .expect("negative humidity should parse");

        match cli.command {
            Command::Suggest { temperature, humidity } => {
                assert_eq!(temperature, 5.0);
                assert_eq!(humidity, -10.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn broken_config() -> anyhow::Result<Config> {
        Err(anyhow!("Failed to parse config file: invalid array"))
    }

    #[tokio::test]
    async fn suggest_ignores_broken_config() {
        let cli = Cli::parse_from(["agro", "suggest", "--temperature", "22", "--humidity", "65"]);
        let succeeded = cli.execute(broken_config).await.expect("suggest never reads config");
        assert!(succeeded);
    }

    #[tokio::test]
    async fn form_with_api_url_does_not_read_config() {
        // The invalid field stops the form before any request is sent.
        let cli = Cli::parse_from([
            "agro", "--api-url", "http://127.0.0.1:1", "regions", "--temperature", "warm",
            "--soil-ph", "6", "--rainfall", "500",
        ]);
        let succeeded = cli.execute(broken_config).await.expect("config is not needed");
        assert!(!succeeded);
    }

    #[tokio::test]
    async fn form_without_api_url_reports_broken_config() {
        let cli = Cli::parse_from([
            "agro", "regions", "--temperature", "20", "--soil-ph", "6", "--rainfall", "500",
        ]);
        let err = cli.execute(broken_config).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn configure_starts_from_defaults_when_config_is_broken() {
        assert_eq!(starting_config(broken_config()), Config::default());

        let mut saved = Config::default();
        saved.set_api_base_url("http://crops.example");
        assert_eq!(starting_config(Ok(saved.clone())), saved);
    }

    #[test]
    fn fields_builds_map() {
        let map = fields([("crop", "rice".to_string()), ("rainfall_suitability", "900".to_string())]);
        assert_eq!(map.get("crop").map(String::as_str), Some("rice"));
        assert_eq!(map.len(), 2);
    }
}
