// Application configuration, loaded from environment variables.

use crate::affixes;

pub const DEFAULT_TOKEN_URL: &str = "https://us.battle.net/oauth/token";
pub const DEFAULT_API_BASE: &str = "https://us.api.blizzard.com";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Seasonal affix id appended to every rotation lookup. Changes
    /// once per season, so it's configuration rather than code.
    pub seasonal_affix: u32,
    /// Blizzard API credentials; `None` disables affix/period lookups.
    pub blizzard: Option<BlizzardConfig>,
}

/// Credentials and endpoints for the Blizzard API client.
#[derive(Debug, Clone)]
pub struct BlizzardConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_base: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:keystones.db?mode=rwc`)
    /// - `SEASONAL_AFFIX` - seasonal affix id (default: 120)
    /// - `BLIZZARD_CLIENT_ID` / `BLIZZARD_CLIENT_SECRET` - API credentials
    /// - `BLIZZARD_TOKEN_URL` / `BLIZZARD_API_BASE` - endpoint overrides
    pub fn load() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:keystones.db?mode=rwc".to_string());

        let seasonal_affix = parse_seasonal_affix(std::env::var("SEASONAL_AFFIX").ok());

        let blizzard = match (
            std::env::var("BLIZZARD_CLIENT_ID").ok(),
            std::env::var("BLIZZARD_CLIENT_SECRET").ok(),
        ) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(BlizzardConfig {
                    client_id,
                    client_secret,
                    token_url: std::env::var("BLIZZARD_TOKEN_URL")
                        .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
                    api_base: std::env::var("BLIZZARD_API_BASE")
                        .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
                })
            }
            _ => None,
        };

        Config {
            database_url,
            seasonal_affix,
            blizzard,
        }
    }
}

fn parse_seasonal_affix(raw: Option<String>) -> u32 {
    raw.and_then(|v| v.parse().ok())
        .unwrap_or(affixes::DEFAULT_SEASONAL_AFFIX)
}
