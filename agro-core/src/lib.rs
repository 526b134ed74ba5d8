//! Core library for the `agro` crop advisory client.
//!
//! This crate defines:
//! - The local weather-driven crop suggestion rule
//! - A client for the remote prediction service
//! - Form handlers that relay page input to the service and render replies
//! - Configuration handling
//!
//! It is used by `agro-cli`, but any [`Page`] implementation can drive the handlers.

pub mod advisor;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod page;

pub use advisor::{CropSuggestion, WeatherReading, suggest};
pub use client::{Endpoint, HttpPredictionApi, PredictionApi};
pub use config::Config;
pub use error::{ApiResult, InvalidField, RequestFailed};
pub use handlers::{Form, FormHandler, HandlerRegistry};
pub use model::{Coordinates, WeatherQuery};
pub use page::{Notice, Page, ResultArea};
