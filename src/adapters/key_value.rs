//! Key=value configuration file adapter.
//!
//! Reads a dotenv-style file (`kp=0.5`, one pair per line, `#` comments)
//! with `dotenvy`'s iterator API, so the process environment is never
//! touched. Interpretation of the pairs lives in
//! [`TrackerConfig::from_pairs`].

use std::io::Read;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::app::ports::ConfigPort;
use crate::config::TrackerConfig;
use crate::error::ConfigError;

pub struct KeyValueConfig {
    path: PathBuf,
}

impl KeyValueConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a configuration from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<TrackerConfig, ConfigError> {
        collect(dotenvy::from_read_iter(reader))
    }
}

impl ConfigPort for KeyValueConfig {
    fn load(&self) -> Result<TrackerConfig, ConfigError> {
        let iter = dotenvy::from_path_iter(&self.path).map_err(|e| {
            error!("Cannot open {}: {}", self.path.display(), e);
            ConfigError::Unreadable
        })?;
        let config = collect(iter)?;
        info!(
            "Loaded {} (kp={} ki={} kd={})",
            self.path.display(),
            config.gains.kp,
            config.gains.ki,
            config.gains.kd
        );
        Ok(config)
    }
}

fn collect<I>(iter: I) -> Result<TrackerConfig, ConfigError>
where
    I: Iterator<Item = dotenvy::Result<(String, String)>>,
{
    let mut pairs = Vec::new();
    for item in iter {
        match item {
            Ok(pair) => pairs.push(pair),
            Err(dotenvy::Error::LineParse(line, pos)) => {
                error!("Config syntax error at {}: {:?}", pos, line);
                return Err(ConfigError::Syntax);
            }
            Err(e) => {
                error!("Config read failed: {}", e);
                return Err(ConfigError::Unreadable);
            }
        }
    }
    TrackerConfig::from_pairs(pairs)
}
