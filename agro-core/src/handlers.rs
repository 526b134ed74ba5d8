use anyhow::anyhow;
use async_trait::async_trait;
use std::{collections::HashMap, fmt::Debug, sync::Arc};
use tracing::{debug, error, warn};

use crate::{
    advisor,
    client::PredictionApi,
    error::{InvalidField, RequestFailed},
    model::{PredictRequest, RegionEntry, RegionsRequest, SuitabilityRequest, WeatherQuery, WeatherResponse},
    page::{Notice, Page, ResultArea},
};

pub const PREDICT_FAILED: &str = "Error predicting yield. Please try again.";
pub const SUITABILITY_FAILED: &str = "Error checking suitability. Please try again.";
pub const REGIONS_FAILED: &str = "Error finding regions. Please try again.";
pub const LOCATION_WEATHER_FAILED: &str =
    "Error fetching location-based weather. Please try again.";
pub const CITY_WEATHER_FAILED: &str = "Error fetching weather for that city. Please try again.";
pub const GEOLOCATION_UNAVAILABLE: &str = "Geolocation is not supported on this device.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    Predict,
    Suitability,
    Regions,
    LocationWeather,
    CityWeather,
}

impl Form {
    pub fn as_str(&self) -> &'static str {
        match self {
            Form::Predict => "predict",
            Form::Suitability => "suitability",
            Form::Regions => "regions",
            Form::LocationWeather => "location-weather",
            Form::CityWeather => "city-weather",
        }
    }
}

impl std::fmt::Display for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait FormHandler: Send + Sync + Debug {
    fn form(&self) -> Form;

    async fn handle(&self, page: &dyn Page, api: &dyn PredictionApi);
}

/// Handlers registered against one page and one API client.
#[derive(Debug)]
pub struct HandlerRegistry {
    page: Arc<dyn Page>,
    api: Arc<dyn PredictionApi>,
    handlers: HashMap<Form, Box<dyn FormHandler>>,
}

impl HandlerRegistry {
    pub fn new(page: Arc<dyn Page>, api: Arc<dyn PredictionApi>) -> Self {
        Self { page, api, handlers: HashMap::new() }
    }

    /// Registry with a handler for every [`Form`].
    pub fn with_default_handlers(page: Arc<dyn Page>, api: Arc<dyn PredictionApi>) -> Self {
        let mut registry = Self::new(page, api);
        registry.register(Box::new(PredictHandler));
        registry.register(Box::new(SuitabilityHandler));
        registry.register(Box::new(RegionsHandler));
        registry.register(Box::new(LocationWeatherHandler));
        registry.register(Box::new(CityWeatherHandler));
        registry
    }

    /// Register a handler, replacing any previous one for the same form.
    pub fn register(&mut self, handler: Box<dyn FormHandler>) {
        self.handlers.insert(handler.form(), handler);
    }

    pub fn is_registered(&self, form: Form) -> bool {
        self.handlers.contains_key(&form)
    }

    /// Run the handler for a submitted form.
    ///
    /// Request failures are reported on the page; only a missing handler is
    /// an error here.
    pub async fn submit(&self, form: Form) -> anyhow::Result<()> {
        let handler = self
            .handlers
            .get(&form)
            .ok_or_else(|| anyhow!("No handler registered for form '{form}'"))?;

        debug!(%form, "form submitted");
        handler.handle(self.page.as_ref(), self.api.as_ref()).await;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PredictHandler;

#[derive(Debug, Clone, Copy, Default)]
pub struct SuitabilityHandler;

#[derive(Debug, Clone, Copy, Default)]
pub struct RegionsHandler;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocationWeatherHandler;

#[derive(Debug, Clone, Copy, Default)]
pub struct CityWeatherHandler;

#[async_trait]
impl FormHandler for PredictHandler {
    fn form(&self) -> Form {
        Form::Predict
    }

    async fn handle(&self, page: &dyn Page, api: &dyn PredictionApi) {
        let area = ResultArea::Yield;
        let request = match read_predict(page) {
            Ok(r) => r,
            Err(e) => return reject(page, area, PREDICT_FAILED, &e),
        };

        match api.predict(&request).await {
            Ok(res) => page.show(
                area,
                Notice::Success(vec![format!("Predicted Crop Yield: {} kg/ha", res.predicted_yield)]),
            ),
            Err(e) => fail(page, area, PREDICT_FAILED, &e),
        }
    }
}

#[async_trait]
impl FormHandler for SuitabilityHandler {
    fn form(&self) -> Form {
        Form::Suitability
    }

    async fn handle(&self, page: &dyn Page, api: &dyn PredictionApi) {
        let area = ResultArea::Suitability;
        let request = match read_suitability(page) {
            Ok(r) => r,
            Err(e) => return reject(page, area, SUITABILITY_FAILED, &e),
        };

        match api.suitability(&request).await {
            Ok(res) => page.show(area, Notice::Success(vec![res.message])),
            Err(e) => fail(page, area, SUITABILITY_FAILED, &e),
        }
    }
}

#[async_trait]
impl FormHandler for RegionsHandler {
    fn form(&self) -> Form {
        Form::Regions
    }

    async fn handle(&self, page: &dyn Page, api: &dyn PredictionApi) {
        let area = ResultArea::Regions;
        let request = match read_regions(page) {
            Ok(r) => r,
            Err(e) => return reject(page, area, REGIONS_FAILED, &e),
        };

        match api.regions(&request).await {
            Ok(entries) => page.show(area, Notice::Success(region_lines(&entries))),
            Err(e) => fail(page, area, REGIONS_FAILED, &e),
        }
    }
}

#[async_trait]
impl FormHandler for LocationWeatherHandler {
    fn form(&self) -> Form {
        Form::LocationWeather
    }

    async fn handle(&self, page: &dyn Page, api: &dyn PredictionApi) {
        let Some(position) = page.current_position().await else {
            page.alert(GEOLOCATION_UNAVAILABLE);
            return;
        };

        let area = ResultArea::GeoWeather;
        match api.weather(&WeatherQuery::Coordinates(position)).await {
            Ok(res) => show_weather(page, "Your Location Weather:".to_string(), &res),
            Err(e) => fail(page, area, LOCATION_WEATHER_FAILED, &e),
        }
    }
}

#[async_trait]
impl FormHandler for CityWeatherHandler {
    fn form(&self) -> Form {
        Form::CityWeather
    }

    async fn handle(&self, page: &dyn Page, api: &dyn PredictionApi) {
        let area = ResultArea::GeoWeather;
        let city = match text(page, "city") {
            Ok(c) => c,
            Err(e) => return reject(page, area, CITY_WEATHER_FAILED, &e),
        };

        match api.weather(&WeatherQuery::City(city.clone())).await {
            Ok(res) => {
                let name = res.city.clone().unwrap_or(city);
                show_weather(page, format!("Weather for {name}:"), &res);
            }
            Err(e) => fail(page, area, CITY_WEATHER_FAILED, &e),
        }
    }
}

fn read_predict(page: &dyn Page) -> Result<PredictRequest, InvalidField> {
    Ok(PredictRequest {
        rainfall: number(page, "rainfall")?,
        temperature: number(page, "temperature")?,
        soil_ph: number(page, "soil_ph")?,
        fertilizer: number(page, "fertilizer")?,
    })
}

fn read_suitability(page: &dyn Page) -> Result<SuitabilityRequest, InvalidField> {
    Ok(SuitabilityRequest {
        crop: text(page, "crop")?.to_lowercase(),
        rainfall: number(page, "rainfall_suitability")?,
        temperature: number(page, "temperature_suitability")?,
        soil_ph: number(page, "soil_ph_suitability")?,
    })
}

fn read_regions(page: &dyn Page) -> Result<RegionsRequest, InvalidField> {
    Ok(RegionsRequest {
        temperature: number(page, "temperature_region")?,
        soil_ph: number(page, "soil_ph_region")?,
        rainfall: number(page, "rainfall_region")?,
    })
}

fn text(page: &dyn Page, name: &str) -> Result<String, InvalidField> {
    let value = page.field(name).ok_or_else(|| InvalidField::Missing(name.to_string()))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InvalidField::Empty(name.to_string()));
    }
    Ok(trimmed.to_string())
}

fn number(page: &dyn Page, name: &str) -> Result<f64, InvalidField> {
    let value = text(page, name)?;
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(InvalidField::NotANumber { name: name.to_string(), value })
}

fn region_lines(entries: &[RegionEntry]) -> Vec<String> {
    let mut lines = vec!["Suggested Regions:".to_string()];
    lines.extend(entries.iter().map(|entry| match entry {
        RegionEntry::Match { region, crops } => format!("Region: {region}, Crops: {crops}"),
        RegionEntry::Message { message } => message.clone(),
    }));
    lines
}

fn show_weather(page: &dyn Page, heading: String, res: &WeatherResponse) {
    let area = ResultArea::GeoWeather;
    page.show(
        area,
        Notice::Success(vec![
            heading,
            format!("Temperature: {} °C", res.temperature),
            format!("Humidity: {}%", res.humidity),
            format!("Weather: {}", res.description),
        ]),
    );

    let suggestion = advisor::suggest(res.reading());
    page.append(area, vec![format!("Suggested Crop for Your Region: {suggestion}")]);
}

fn reject(page: &dyn Page, area: ResultArea, message: &'static str, err: &InvalidField) {
    warn!(%area, "rejected form input: {err}");
    page.show(area, Notice::Failure(message));
}

fn fail(page: &dyn Page, area: ResultArea, message: &'static str, err: &RequestFailed) {
    error!(%area, endpoint = %err.endpoint, "{err}: {:#}", err.detail);
    page.show(area, Notice::Failure(message));
}
