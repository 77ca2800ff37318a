use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on a single evaluator request.
    pub llm_timeout: Duration,
    /// Evaluations below this confidence are flagged for human review.
    pub human_review_confidence: f64,
    /// Number of weeks of check-ins a risk assessment looks back over.
    pub check_in_lookback_weeks: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let human_review_confidence: f64 = optional_env("HUMAN_REVIEW_CONFIDENCE", 0.7)?;
        if !(0.0..=1.0).contains(&human_review_confidence) {
            bail!("HUMAN_REVIEW_CONFIDENCE must be within [0, 1]");
        }
        let check_in_lookback_weeks: u32 = optional_env("CHECK_IN_LOOKBACK_WEEKS", 3)?;
        if check_in_lookback_weeks == 0 {
            bail!("CHECK_IN_LOOKBACK_WEEKS must be at least 1");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_timeout: Duration::from_secs(optional_env("LLM_TIMEOUT_SECS", 60)?),
            human_review_confidence,
            check_in_lookback_weeks,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().with_context(|| {
            format!("Environment variable '{key}' has an invalid value '{raw}'")
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Defaults without touching the process environment.
    pub fn for_tests() -> Self {
        Config {
            database_url: String::new(),
            anthropic_api_key: String::new(),
            port: 0,
            rust_log: "debug".to_string(),
            llm_timeout: Duration::from_secs(5),
            human_review_confidence: 0.7,
            check_in_lookback_weeks: 3,
        }
    }
}
