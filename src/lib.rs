//! EcoGarden Library
//!
//! Monthly gardening advice, user accounts, and a cached weather lookup
//! backed by the OpenWeather API.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod lookup;
pub mod response;

pub use lookup::{LookupError, WeatherService};
