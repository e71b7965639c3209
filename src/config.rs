use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Locales
    pub default_locale: String,
    pub baseline_locale: String,

    // Request/persistence keys
    pub override_param: String,
    pub preference_key: String,

    // Language data
    pub lang_codes_path: Option<String>,
    pub languages_dir: Option<String>,
    pub available_languages: Vec<String>,

    // Persistence
    pub database_url: Option<String>,
    pub store_timeout: Duration,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            default_locale: env_or("DEFAULT_LOCALE", "en_US"),
            baseline_locale: env_or("BASELINE_LOCALE", "en_US"),

            override_param: env_or("OVERRIDE_PARAM", "user_lang"),
            preference_key: env_or("PREFERENCE_KEY", "user_language"),

            lang_codes_path: env_opt("LANG_CODES_PATH"),
            languages_dir: env_opt("LANGUAGES_DIR"),
            available_languages: env_opt("AVAILABLE_LANGUAGES")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            database_url: env_opt("DATABASE_URL"),
            store_timeout: Duration::from_millis(
                env_opt("STORE_TIMEOUT_MS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("STORE_TIMEOUT_MS must be a number of milliseconds")?
                    .unwrap_or(2000),
            ),

            port: env_opt("PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(8080),
        })
    }
}

/// Non-blank environment value.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}
