use std::{env, time::Duration};

use crate::{errors::Error, migration::MigrationSettings, Result};

pub const DEFAULT_API_URL: &str = "https://bot-hosting-b.onrender.com";
pub const DEFAULT_DASHBOARD_URL: &str = "https://bothostingf.vercel.app";
pub const DEFAULT_BRAND_NAME: &str = "xotiicsverify";

/// Typed configuration, loaded once at process start and shared behind an `Arc`.
#[derive(Clone, Debug)]
pub struct Config {
    pub discord_bot_token: String,

    // Verification API
    pub api_url: String,
    pub api_timeout: Duration,
    pub dashboard_url: String,

    // Migration throttling
    pub migration_delay: Duration,
    pub progress_every: u32,

    // Presentation
    pub brand_name: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // A missing .env is fine; existing env vars always win.
        let _ = dotenvy::dotenv();

        let discord_bot_token = env_str("DISCORD_BOT_TOKEN").unwrap_or_default();
        if discord_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "DISCORD_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let api_url = normalize_base_url(
            &env_str("API_URL")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        );
        let dashboard_url = env_str("DASHBOARD_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_DASHBOARD_URL.to_string());
        let api_timeout = Duration::from_millis(env_u64("API_TIMEOUT_MS").unwrap_or(10_000));

        let migration_delay =
            Duration::from_millis(env_u64("MIGRATION_DELAY_MS").unwrap_or(500));
        let progress_every = env_u32("PROGRESS_EVERY").unwrap_or(10).max(1);

        let brand_name = env_str("BRAND_NAME")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_BRAND_NAME.to_string());

        Ok(Self {
            discord_bot_token,
            api_url,
            api_timeout,
            dashboard_url,
            migration_delay,
            progress_every,
            brand_name,
        })
    }

    pub fn migration_settings(&self) -> MigrationSettings {
        MigrationSettings {
            delay: self.migration_delay,
            progress_every: self.progress_every,
        }
    }

    /// Footer text shared by every card the bot posts.
    pub fn footer(&self) -> String {
        format!("{} | Secure Verification System", self.brand_name)
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
