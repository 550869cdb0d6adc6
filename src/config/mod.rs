pub mod paths;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::model::profile::{ImapProfile, SieveProfile};
use crate::model::settings::ScriptSettings;

/// Everything but the passwords, which never touch the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub imap: ImapProfile,
    /// Falls back to the IMAP host and user on the ManageSieve port.
    #[serde(default)]
    pub sieve: Option<SieveProfile>,
    #[serde(default)]
    pub script: ScriptSettings,
}

impl Config {
    /// Read `path`, or the file in the platform config directory.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => paths::default_config_path()
                .ok_or_else(|| Error::Config("No configuration directory available".into()))?,
        };
        debug!(path = %path.display(), "loading configuration");
        let data = fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn sieve_profile(&self) -> SieveProfile {
        self.sieve
            .clone()
            .unwrap_or_else(|| SieveProfile::from_imap(&self.imap))
    }

    fn validate(&self) -> Result<(), Error> {
        if self.imap.host.is_empty() {
            return Err(Error::Config("imap.host is required".into()));
        }
        if self.imap.username.is_empty() {
            return Err(Error::Config("imap.username is required".into()));
        }
        if self.script.name.is_empty() {
            return Err(Error::Config("script.name must not be empty".into()));
        }
        Ok(())
    }
}
