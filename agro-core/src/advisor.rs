use serde::{Deserialize, Serialize};
use std::{fmt, ops::RangeInclusive};

/// Temperature and humidity observed at a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
}

impl WeatherReading {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self { temperature, humidity }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropSuggestion {
    Wheat,
    Rice,
    Corn,
    Unknown,
}

impl CropSuggestion {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropSuggestion::Wheat => "wheat",
            CropSuggestion::Rice => "rice",
            CropSuggestion::Corn => "corn",
            CropSuggestion::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CropSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Rule {
    temperature: RangeInclusive<f64>,
    humidity: RangeInclusive<f64>,
    crop: CropSuggestion,
}

// Evaluated top to bottom. The ranges overlap; earlier rules win.
const RULES: [Rule; 3] = [
    Rule { temperature: 15.0..=25.0, humidity: 40.0..=70.0, crop: CropSuggestion::Wheat },
    Rule { temperature: 20.0..=30.0, humidity: 60.0..=80.0, crop: CropSuggestion::Rice },
    Rule { temperature: 18.0..=27.0, humidity: 50.0..=70.0, crop: CropSuggestion::Corn },
];

/// Suggest a crop for the given weather.
pub fn suggest(reading: WeatherReading) -> CropSuggestion {
    RULES
        .iter()
        .find(|rule| {
            rule.temperature.contains(&reading.temperature)
                && rule.humidity.contains(&reading.humidity)
        })
        .map(|rule| rule.crop)
        .unwrap_or(CropSuggestion::Unknown)
}
