use std::str::FromStr;

use anyhow::{Context, Result};

use crate::planning::composer::DeckSettings;
use crate::planning::Language;

/// Application configuration loaded from environment variables.
/// Everything has a default; startup fails only on unparseable values.
#[derive(Debug, Clone)]
pub struct Config {
    /// Enables instruction pools and outline generation when set.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Deck settings used for any field a request leaves out.
    pub deck_defaults: DeckSettings,
    /// Fixed seed for every batch without its own; random otherwise.
    pub planner_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let fallback = DeckSettings::default();
        let deck_defaults = DeckSettings {
            language: parse_env::<Language>("PLANNER_LANGUAGE", fallback.language)?,
            num_slides: parse_env("PLANNER_NUM_SLIDES", fallback.num_slides)?,
            num_bullets_min: parse_env("PLANNER_NUM_BULLETS_MIN", fallback.num_bullets_min)?,
            num_bullets_max: parse_env("PLANNER_NUM_BULLETS_MAX", fallback.num_bullets_max)?,
            num_wrong_topics: parse_env("PLANNER_NUM_WRONG_TOPICS", fallback.num_wrong_topics)?,
        };
        deck_defaults
            .validate()
            .context("PLANNER_* variables describe an invalid deck")?;

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            deck_defaults,
            planner_seed: optional_env("PLANNER_SEED")
                .map(|raw| raw.parse::<u64>())
                .transpose()
                .context("PLANNER_SEED must be an unsigned integer")?,
        })
    }
}

/// Unset and blank variables both count as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
