use serde::{Deserialize, Serialize};

use crate::advisor::WeatherReading;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictRequest {
    pub rainfall: f64,
    pub temperature: f64,
    pub soil_ph: f64,
    pub fertilizer: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictResponse {
    pub predicted_yield: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuitabilityRequest {
    /// Lowercase crop name, e.g. "wheat".
    pub crop: String,
    pub rainfall: f64,
    pub temperature: f64,
    pub soil_ph: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuitabilityResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionsRequest {
    pub temperature: f64,
    pub soil_ph: f64,
    pub rainfall: f64,
}

/// One element of the `/regions` response array.
///
/// The service answers with either matching regions or a single entry
/// carrying a message such as "No suitable regions found".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RegionEntry {
    Match { region: String, crops: String },
    Message { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    Coordinates(Coordinates),
    City(String),
}

impl WeatherQuery {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            WeatherQuery::Coordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
            WeatherQuery::City(city) => vec![("city", city.clone())],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherResponse {
    pub temperature: f64,
    pub humidity: f64,
    pub description: String,
    #[serde(default)]
    pub city: Option<String>,
}

impl WeatherResponse {
    pub fn reading(&self) -> WeatherReading {
        WeatherReading::new(self.temperature, self.humidity)
    }
}

/// Body the service returns alongside a non-success status.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServiceErrorBody {
    pub error: String,
}
