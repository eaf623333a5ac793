use std::str::FromStr;

use anyhow::{Context, Result};

use crate::layout::{GlyphPolicy, PageConfig, PageSize};

/// Application configuration loaded from environment variables.
/// Startup fails if a variable is present but cannot be parsed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means the in-memory store.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub page_size: PageSize,
    pub glyph_policy: GlyphPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            port: 8080,
            rust_log: "info".to_string(),
            page_size: PageSize::A4,
            glyph_policy: GlyphPolicy::Reject,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            port: parse_env("PORT", defaults.port)?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            page_size: parse_env("PAGE_SIZE", defaults.page_size)?,
            glyph_policy: parse_env("GLYPH_POLICY", defaults.glyph_policy)?,
        })
    }

    /// Page geometry and glyph policy handed to the layout engine.
    pub fn page_config(&self) -> PageConfig {
        PageConfig::for_size(self.page_size).with_glyph_policy(self.glyph_policy)
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
