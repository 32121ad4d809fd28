//! Run settings loaded from the environment

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::scraper::{Pacing, PolitenessDelay};
use crate::session::DEFAULT_USER_AGENT;

#[derive(Debug, Clone)]
pub struct Config {
    pub email: Option<String>,
    pub password: Option<String>,
    pub output_dir: PathBuf,
    pub csv_file: String,
    /// Empty disables the JSON sink
    pub json_file: String,
    pub database_url: Option<String>,
    pub max_records_per_category: usize,
    pub min_discount: u32,
    pub enforce_min_discount: bool,
    pub category_limit: usize,
    pub delay: PolitenessDelay,
    pub wait_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub schedule: Option<String>,
}

impl Config {
    /// Load settings, reading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let optional = |var: &str| lookup(var).ok().filter(|v| !v.trim().is_empty());
        let or_default =
            |var: &str, default: &str| lookup(var).unwrap_or_else(|_| default.to_string());
        let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason,
        };

        let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
            or_default(var, default)
                .trim()
                .parse::<u64>()
                .map_err(|e| invalid(var, e.to_string()))
        };
        let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
            or_default(var, default)
                .trim()
                .parse::<usize>()
                .map_err(|e| invalid(var, e.to_string()))
        };
        let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
            match optional(var).map(|v| v.trim().to_ascii_lowercase()) {
                None => Ok(default),
                Some(v) => match v.as_str() {
                    "1" | "true" | "yes" | "on" => Ok(true),
                    "0" | "false" | "no" | "off" => Ok(false),
                    _ => Err(invalid(var, format!("expected a boolean, got `{v}`"))),
                },
            }
        };

        let min_discount = u32::try_from(parse_u64("MIN_DISCOUNT", "50")?)
            .ok()
            .filter(|percent| *percent <= 100)
            .ok_or_else(|| {
                invalid(
                    "MIN_DISCOUNT",
                    "must be a percentage from 0 to 100".to_string(),
                )
            })?;

        let delay = if parse_bool("POLITENESS_DELAY", true)? {
            PolitenessDelay::new(
                Duration::from_millis(parse_u64("PAGE_DELAY_MIN_MS", "1000")?),
                Duration::from_millis(parse_u64("PAGE_DELAY_MAX_MS", "2000")?),
            )
        } else {
            PolitenessDelay::disabled()
        };

        Ok(Self {
            email: optional("STORE_EMAIL"),
            password: optional("STORE_PASSWORD"),
            output_dir: PathBuf::from(or_default("OUTPUT_DIR", "output")),
            csv_file: or_default("CSV_FILE", "output.csv"),
            json_file: or_default("JSON_FILE", "output.json"),
            database_url: optional("DATABASE_URL"),
            max_records_per_category: parse_usize("MAX_RECORDS_PER_CATEGORY", "50")?,
            min_discount,
            enforce_min_discount: parse_bool("ENFORCE_MIN_DISCOUNT", false)?,
            category_limit: parse_usize("CATEGORY_LIMIT", "10")?,
            delay,
            wait_timeout: Duration::from_secs(parse_u64("WAIT_TIMEOUT_SECS", "10")?),
            request_timeout: Duration::from_secs(parse_u64("REQUEST_TIMEOUT_SECS", "30")?),
            user_agent: or_default("USER_AGENT", DEFAULT_USER_AGENT),
            schedule: optional("RUN_SCHEDULE"),
        })
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            delay: self.delay,
            wait_timeout: self.wait_timeout,
        }
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_file)
    }

    pub fn json_path(&self) -> Option<PathBuf> {
        (!self.json_file.trim().is_empty()).then(|| self.output_dir.join(&self.json_file))
    }
}
