//! Core data models for EcoGarden
//!
//! This module contains the types shared across the application: the weather
//! summary returned to callers, gardening advice tied to months, and user
//! accounts.

pub mod advice;
pub mod users;
pub mod weather;

pub use advice::{Advice, AdviceCatalog, AdviceError, AdviceUpdate, Month, NewAdvice};
pub use users::{NewUser, Role, User, UserDirectory, UserError, UserUpdate};
pub use weather::{WeatherClient, WeatherError, WeatherSource};

use serde::{Deserialize, Serialize};

/// Weather summary for a city, as cached and returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherInfo {
    /// City name as requested
    pub city: String,
    /// Provider description of the current conditions, e.g. "clear sky"
    pub weather: String,
}
