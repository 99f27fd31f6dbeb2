//! INI file configuration adapter.

use crate::domain::error::BreakoutError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Parse a present value as `T`. Blank values count as absent.
    fn get_parsed<T>(&self, section: &str, key: &str) -> Result<Option<T>, BreakoutError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<T>()
            .map(Some)
            .map_err(|e| BreakoutError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("cannot parse '{raw}': {e}"),
            })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, BreakoutError> {
        self.get_parsed(section, key)
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, BreakoutError> {
        self.get_parsed(section, key)
    }
}
