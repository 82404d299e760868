//! Core library for the `weather-lookup` client.
//!
//! This crate defines:
//! - Configuration of the weather service endpoint
//! - The lookup client (`GET /weather/{id}`)
//! - The form controller and its submission state machine
//! - The typed response schema, normalizer and text renderer
//!
//! It is used by `weather-lookup`, but can also be reused by other front ends.

pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod model;
pub mod normalize;

pub use client::{HttpWeatherClient, WeatherLookup};
pub use config::Config;
pub use error::{FormError, LookupError};
pub use form::{FormController, FormField, FormState, SubmissionResult, SubmissionState};
pub use model::WeatherRecord;
pub use normalize::{WeatherView, parse_payload, render, render_payload};
