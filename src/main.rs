//! EcoGarden - gardening advice by month and the weather in your town
//!
//! Prints one JSON payload per line on stdout. Exits non-zero if any lookup
//! failed.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use ecogarden::cache::{CacheError, CacheStore, FileCache, MemoryCache};
use ecogarden::cli::{parse_month_arg, CacheAction, Cli, CliError, Command, WeatherTarget};
use ecogarden::config::{Config, ConfigError};
use ecogarden::data::{AdviceCatalog, UserDirectory, WeatherClient, WeatherError, WeatherSource};
use ecogarden::lookup::invalidate_weather_cache;
use ecogarden::response::{advice_list_response, weather_response, ApiResponse};
use ecogarden::WeatherService;

/// Errors that stop a command before it produces any payload
#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to set up weather client: {0}")]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Sends logs to stderr, filtered by `RUST_LOG` (default: warnings only)
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_response(response: &ApiResponse) {
    println!("{}", response.body);
}

/// The file cache from `--cache-dir`, the environment, or the XDG default
fn open_file_cache(config: &Config) -> Option<FileCache> {
    match &config.cache_dir {
        Some(dir) => Some(FileCache::with_dir(dir.clone())),
        None => FileCache::new(),
    }
}

async fn run_weather<S, C>(service: WeatherService<S, C>, target: WeatherTarget) -> bool
where
    S: WeatherSource,
    C: CacheStore,
{
    match target {
        WeatherTarget::Cities(cities) => {
            let lookups = cities.iter().map(|city| service.get_weather_for_city(city));
            let results = futures::future::join_all(lookups).await;

            let mut all_ok = true;
            for result in &results {
                let response = weather_response(result);
                all_ok &= response.is_success();
                print_response(&response);
            }
            all_ok
        }
        WeatherTarget::User(email) => {
            let directory = UserDirectory::with_defaults();
            let user = directory.find_by_email(&email);
            if user.is_none() {
                tracing::debug!("No user registered as {}", email);
            }

            let response = weather_response(&service.get_weather_for_user(user).await);
            print_response(&response);
            response.is_success()
        }
    }
}

/// Reads the environment, then applies `--cache-dir` and `--lang`
fn load_config(cache_dir: Option<PathBuf>, lang: Option<String>) -> Result<Config, ConfigError> {
    let mut config = Config::from_env()?;
    if cache_dir.is_some() {
        config.cache_dir = cache_dir;
    }
    if lang.is_some() {
        config.lang = lang;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<bool, AppError> {
    match cli.command {
        Command::Weather { cities, user } => {
            let target = WeatherTarget::from_args(&cities, user.as_deref())?;
            let config = load_config(cli.cache_dir, cli.lang)?;
            let client = WeatherClient::from_config(&config, config.api_key()?)?;

            let ok = match open_file_cache(&config) {
                Some(cache) => run_weather(WeatherService::new(client, cache), target).await,
                None => {
                    tracing::warn!("No cache directory available, caching in memory only");
                    run_weather(WeatherService::new(client, MemoryCache::new()), target).await
                }
            };
            Ok(ok)
        }
        Command::Advice { month } => {
            let catalog = AdviceCatalog::with_defaults();
            let advices = match month {
                Some(number) => catalog.by_month(parse_month_arg(number)?),
                None => catalog.for_current_month(),
            };

            let response = advice_list_response(&advices);
            print_response(&response);
            Ok(response.is_success())
        }
        Command::Cache {
            action: CacheAction::Clear,
        } => {
            let config = load_config(cli.cache_dir, cli.lang)?;
            match open_file_cache(&config) {
                Some(cache) => {
                    let removed = invalidate_weather_cache(&cache)?;
                    println!("Cleared {} cached weather entries", removed);
                }
                None => println!("No cache directory available, nothing to clear"),
            }
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
