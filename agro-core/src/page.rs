//! The page the forms live on.
//!
//! Handlers never touch a concrete UI; they read input fields and write
//! result areas through [`Page`]. The CLI provides a terminal page, tests
//! provide a recording one.

use async_trait::async_trait;
use std::fmt::{self, Debug};

use crate::model::Coordinates;

/// A place on the page where one form's outcome is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultArea {
    Yield,
    Suitability,
    Regions,
    GeoWeather,
}

impl ResultArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultArea::Yield => "yield",
            ResultArea::Suitability => "suitability",
            ResultArea::Regions => "regions",
            ResultArea::GeoWeather => "geo_weather",
        }
    }
}

impl fmt::Display for ResultArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What gets written into a result area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Formatted response, one entry per line.
    Success(Vec<String>),
    /// Fixed per-form error text, shown in red.
    Failure(&'static str),
}

#[async_trait]
pub trait Page: Send + Sync + Debug {
    /// Current raw value of an input field, `None` if the field is absent.
    fn field(&self, name: &str) -> Option<String>;

    /// Replace the contents of a result area.
    fn show(&self, area: ResultArea, notice: Notice);

    /// Add lines after whatever the area currently holds.
    fn append(&self, area: ResultArea, lines: Vec<String>);

    fn alert(&self, message: &str);

    /// Position of the device, `None` when it cannot be determined.
    async fn current_position(&self) -> Option<Coordinates>;
}
