//! Cached weather lookup
//!
//! `WeatherService` answers "what is the weather in this city?" using the
//! cache-aside pattern: probe the cache, and only on a miss ask the weather
//! provider, then store the result for ten minutes under the `weatherCache`
//! tag. Failures are never cached, and nothing is retried.
//!
//! The cache is only written once a fetch has fully succeeded, so dropping a
//! lookup future mid-request leaves the cache as it was.

use thiserror::Error;

use crate::cache::{CacheError, CacheStore};
use crate::data::{User, WeatherError, WeatherInfo, WeatherSource};

/// Tag carried by every weather cache entry
pub const WEATHER_CACHE_TAG: &str = "weatherCache";

/// How long a weather entry stays fresh
pub const WEATHER_CACHE_TTL_SECS: u64 = 600;

/// Errors that end a weather lookup
#[derive(Debug, Error)]
pub enum LookupError {
    /// The provider could not be reached, timed out, or answered non-200
    #[error("Weather data not found: {0}")]
    RemoteUnavailable(#[source] WeatherError),

    /// The provider answered 200 with an unusable body
    #[error("Weather data not found: {0}")]
    MalformedResponse(#[source] WeatherError),

    /// "My town" lookup without a signed-in user
    #[error("User not authenticated")]
    Unauthenticated,

    #[error("City name must not be empty")]
    InvalidCity,
}

impl From<WeatherError> for LookupError {
    fn from(err: WeatherError) -> Self {
        if err.is_unavailable() {
            LookupError::RemoteUnavailable(err)
        } else {
            LookupError::MalformedResponse(err)
        }
    }
}

/// Cache key for a city: `weather_` followed by the lowercased name with
/// anything but letters and digits replaced by `_`
pub fn cache_key(city: &str) -> String {
    let normalized: String = city
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("weather_{}", normalized)
}

/// Evicts every cached weather entry and returns how many were removed
pub fn invalidate_weather_cache<C: CacheStore>(cache: &C) -> Result<usize, CacheError> {
    let removed = cache.invalidate_tag(WEATHER_CACHE_TAG)?;
    tracing::info!("Invalidated {} weather cache entries", removed);
    Ok(removed)
}

/// Weather lookups backed by a provider and a shared cache
#[derive(Debug, Clone)]
pub struct WeatherService<S, C> {
    source: S,
    cache: C,
    ttl_secs: u64,
}

impl<S: WeatherSource, C: CacheStore> WeatherService<S, C> {
    pub fn new(source: S, cache: C) -> Self {
        Self {
            source,
            cache,
            ttl_secs: WEATHER_CACHE_TTL_SECS,
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns the live cached entry for `key`, if any
    pub fn try_get(&self, key: &str) -> Option<WeatherInfo> {
        self.cache.get(key)
    }

    /// Fetches the weather for `city` and stores it under `key`
    ///
    /// Nothing is stored when the fetch fails. A failed cache write is logged
    /// and the fetched value is still returned.
    pub async fn compute_and_store(
        &self,
        key: &str,
        city: &str,
        ttl_secs: u64,
        tags: &[&str],
    ) -> Result<WeatherInfo, LookupError> {
        let description = self.source.fetch_description(city).await.map_err(|e| {
            tracing::debug!("Weather fetch for {} failed: {}", city, e);
            LookupError::from(e)
        })?;

        let info = WeatherInfo {
            city: city.to_string(),
            weather: description,
        };

        match self.cache.set(key, &info, ttl_secs, tags) {
            Ok(()) => tracing::info!("Cached weather for {} under {}", city, key),
            Err(e) => tracing::warn!("Failed to cache weather for {}: {}", city, e),
        }
        Ok(info)
    }

    /// Current weather for `city`, served from cache while fresh
    pub async fn get_weather_for_city(&self, city: &str) -> Result<WeatherInfo, LookupError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(LookupError::InvalidCity);
        }

        let key = cache_key(city);
        if let Some(info) = self.try_get(&key) {
            tracing::debug!("Weather cache hit for {}", key);
            return Ok(info);
        }

        tracing::debug!("Weather cache miss for {}", key);
        self.compute_and_store(&key, city, self.ttl_secs, &[WEATHER_CACHE_TAG])
            .await
    }

    /// Current weather in the signed-in user's town
    pub async fn get_weather_for_user(
        &self,
        user: Option<&User>,
    ) -> Result<WeatherInfo, LookupError> {
        let user = user.ok_or(LookupError::Unauthenticated)?;
        self.get_weather_for_city(&user.town).await
    }

    /// Evicts every cached weather entry
    pub fn invalidate_weather_cache(&self) -> Result<usize, CacheError> {
        invalidate_weather_cache(&self.cache)
    }
}
