//! Command-line interface parsing for EcoGarden
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! validated commands for `main` to run.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::data::{AdviceError, Month};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// `weather` was given neither cities nor `--user`
    #[error("Nothing to look up: give one or more cities, or --user <EMAIL>")]
    MissingTarget,

    /// `weather` was given both cities and `--user`
    #[error("Give either cities or --user <EMAIL>, not both")]
    ConflictingTarget,

    #[error(transparent)]
    InvalidMonth(#[from] AdviceError),
}

/// EcoGarden - monthly gardening advice and the weather in your town
#[derive(Parser, Debug)]
#[command(name = "ecogarden")]
#[command(about = "Gardening advice by month and cached weather lookups")]
#[command(version)]
pub struct Cli {
    /// Directory for cached weather (defaults to the XDG cache directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Language for weather descriptions, e.g. "fr"
    #[arg(long, global = true, value_name = "LANG")]
    pub lang: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Current weather for one or more cities, or for a user's town
    ///
    /// Examples:
    ///   ecogarden weather Paris
    ///   ecogarden weather Lyon Nantes
    ///   ecogarden weather --user user@ecogardenapi.com
    Weather {
        /// Cities to look up
        #[arg(value_name = "CITY")]
        cities: Vec<String>,

        /// Look up the town of this user instead
        #[arg(long, value_name = "EMAIL")]
        user: Option<String>,
    },

    /// Gardening advice for a month (defaults to the current month)
    Advice {
        /// Month number, 1 to 12
        #[arg(long, value_name = "MONTH", allow_negative_numbers = true)]
        month: Option<i64>,
    },

    /// Manage the weather cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Remove every cached weather entry
    Clear,
}

/// What a `weather` command should look up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherTarget {
    Cities(Vec<String>),
    /// Email of the user whose town to use
    User(String),
}

impl WeatherTarget {
    /// Validates the arguments of a `weather` command
    ///
    /// # Returns
    /// * `Ok(WeatherTarget)` when exactly one of cities or user was given
    /// * `Err(CliError)` otherwise
    pub fn from_args(cities: &[String], user: Option<&str>) -> Result<Self, CliError> {
        match (cities.is_empty(), user) {
            (true, None) => Err(CliError::MissingTarget),
            (false, Some(_)) => Err(CliError::ConflictingTarget),
            (true, Some(email)) => Ok(WeatherTarget::User(email.to_string())),
            (false, None) => Ok(WeatherTarget::Cities(cities.to_vec())),
        }
    }
}

/// Parses the `--month` argument
pub fn parse_month_arg(number: i64) -> Result<Month, CliError> {
    Ok(Month::new(number)?)
}
