use std::fs::{self, File};

use anyhow::{anyhow, Context, Result};
use lms_client::Session;
use serde::{Deserialize, Serialize};
use xdg::BaseDirectories;

/// Caches the logged-in session between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCache {
    pub session: Session,
}

impl AuthCache {
    pub fn load() -> Result<Self> {
        let path = BaseDirectories::with_prefix("lms-tui")?
            .find_cache_file("session.json")
            .ok_or_else(|| anyhow!("auth cache does not exist"))?;

        let file = File::open(path).context("error opening auth cache")?;
        let cache = serde_json::from_reader(&file).context("error deserialising auth cache")?;

        Ok(cache)
    }

    pub fn save(&self) -> Result<()> {
        let path = BaseDirectories::with_prefix("lms-tui")?.place_cache_file("session.json")?;

        let mut file = File::create(path).context("error opening auth cache")?;

        serde_json::to_writer(&mut file, &self).context("error serialising auth cache")?;

        Ok(())
    }

    /// Forget the cached session, if there is one
    pub fn clear() -> Result<()> {
        if let Some(path) = BaseDirectories::with_prefix("lms-tui")?.find_cache_file("session.json")
        {
            fs::remove_file(path).context("error removing auth cache")?;
        }

        Ok(())
    }
}
