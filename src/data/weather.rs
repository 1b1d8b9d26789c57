//! OpenWeather API client
//!
//! This module fetches current conditions for a city from the OpenWeather
//! `data/2.5/weather` endpoint and extracts the description of the first
//! reported condition.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

/// Base URL for the OpenWeather API
pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Path of the current weather endpoint
const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

/// Default timeout for a single provider request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed or timed out
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The provider answered with something other than 200
    #[error("Weather provider returned status {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),
}

impl WeatherError {
    /// Whether the provider could not be reached or refused the request,
    /// as opposed to answering with an unusable body
    pub fn is_unavailable(&self) -> bool {
        matches!(self, WeatherError::RequestFailed(_) | WeatherError::Status(_))
    }
}

/// Something that can describe the current weather in a city
pub trait WeatherSource: Send + Sync {
    /// Fetches a short description (e.g. "clear sky") of the weather in `city`
    fn fetch_description(
        &self,
        city: &str,
    ) -> impl Future<Output = Result<String, WeatherError>> + Send;
}

/// Client for fetching weather data from the OpenWeather API
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    lang: Option<String>,
}

impl WeatherClient {
    /// Create a new WeatherClient with the given API key and request timeout
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_key))
    }

    /// Create a new WeatherClient with a custom HTTP client
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            api_key: api_key.into(),
            lang: None,
        }
    }

    /// Builds a client from the API key, endpoint, language and timeout in `config`
    pub fn from_config(config: &Config, api_key: &str) -> Result<Self, WeatherError> {
        Ok(Self::new(api_key, config.http_timeout)?
            .with_base_url(config.base_url.clone())
            .with_lang(config.lang.clone()))
    }

    /// Point the client at another server (a proxy or a test double)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Ask the provider for descriptions in `lang` (e.g. "fr")
    pub fn with_lang(mut self, lang: Option<String>) -> Self {
        self.lang = lang;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            CURRENT_WEATHER_PATH
        )
    }
}

impl WeatherSource for WeatherClient {
    async fn fetch_description(&self, city: &str) -> Result<String, WeatherError> {
        let mut query = vec![("q", city), ("appid", self.api_key.as_str())];
        if let Some(lang) = self.lang.as_deref() {
            query.push(("lang", lang));
        }

        tracing::debug!("Fetching current weather for {}", city);

        let response = self
            .client
            .get(self.endpoint())
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let api_response: CurrentWeatherResponse = serde_json::from_str(&text)?;

        parse_description(api_response)
    }
}

/// Extract the first condition's description from a provider response
fn parse_description(response: CurrentWeatherResponse) -> Result<String, WeatherError> {
    let condition = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::MissingField("weather".to_string()))?;

    condition
        .description
        .ok_or_else(|| WeatherError::MissingField("weather[0].description".to_string()))
}

/// OpenWeather current weather response, reduced to what we read
#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    #[serde(default)]
    weather: Vec<Condition>,
}

/// One entry of the `weather` list
#[derive(Debug, Deserialize)]
struct Condition {
    description: Option<String>,
}
