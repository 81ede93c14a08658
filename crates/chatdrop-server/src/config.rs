use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_dir: PathBuf,
    pub current_user_id: u64,
    pub seed_samples: bool,
    pub inbox_settle: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: var("CHATDROP_HOST", "0.0.0.0"),
            port: var("CHATDROP_PORT", "5000")
                .parse()
                .context("Invalid CHATDROP_PORT")?,
            data_dir: var("CHATDROP_DATA_DIR", "./data").into(),
            public_dir: var("CHATDROP_PUBLIC_DIR", "./public").into(),
            current_user_id: var("CHATDROP_CURRENT_USER_ID", "5")
                .parse()
                .context("Invalid CHATDROP_CURRENT_USER_ID")?,
            seed_samples: parse_flag(&var("CHATDROP_SEED_SAMPLES", "true"))
                .context("Invalid CHATDROP_SEED_SAMPLES")?,
            inbox_settle: Duration::from_millis(
                var("CHATDROP_INBOX_SETTLE_MS", "2000")
                    .parse()
                    .context("Invalid CHATDROP_INBOX_SETTLE_MS")?,
            ),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}
