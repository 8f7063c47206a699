use std::{fs::File, time::Duration};

use anyhow::{anyhow, Context, Result};
use lms_client::{course::DEFAULT_PAGE_SIZE, Client, Session, DEFAULT_TIMEOUT};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use xdg::BaseDirectories;

/// Overrides [`Config::api_url`]
const API_URL_VAR: &str = "LMS_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the API, eg `https://lms.example.com/api`
    pub api_url: String,
    pub timeout_secs: u64,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = BaseDirectories::with_prefix("lms-tui")?
            .find_config_file("config.json")
            .ok_or_else(|| anyhow!("config does not exist"))?;

        let file = File::open(path).context("error opening config file")?;
        let config = serde_json::from_reader(&file).context("error deserialising config file")?;

        Ok(config)
    }

    /// Load the config file if there is one, then apply environment overrides
    pub fn load_or_default() -> Self {
        let mut config = Self::load().unwrap_or_else(|e| {
            debug!("using default config: {:#}", e);
            Self::default()
        });

        if let Ok(url) = std::env::var(API_URL_VAR) {
            config.api_url = url;
        }
        info!("using API at {}", config.api_url);

        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Make a client talking to the configured API as the given session
    pub fn client(&self, session: Session) -> Result<Client> {
        Client::new(&self.api_url, self.timeout(), session).context("error creating API client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_url": "https://lms.example.com/api"}"#).unwrap();

        assert_eq!(config.api_url, "https://lms.example.com/api");
        assert_eq!(config.page_size, 9);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
