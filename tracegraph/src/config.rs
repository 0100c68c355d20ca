//! The optional YAML configuration of tracegraph. Every field has a default,
//! so an empty file is valid. Values that parse but cannot be used, such as
//! a non-positive rate floor, are rejected here rather than while drawing.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracegraph_series::rate::RateConfig;

use crate::render;

/// Errors produced by [`Config`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error for a serde [`serde_yaml`].
    #[error("Failed to deserialize yaml: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// Error reading config file
    #[error("Failed to read config file {path:?}: {source}")]
    ReadFile {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: Box<io::Error>,
    },
    /// Error for settings that deserialize but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Main configuration struct for this program
#[derive(Debug, Default, Deserialize, PartialEq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// How rates are derived from counters
    #[serde(default)]
    pub rate: RateConfig,
    /// How charts are drawn
    #[serde(default)]
    pub render: render::Config,
}

impl Config {
    /// Parse a configuration from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if `contents` is not a valid configuration.
    pub fn from_yaml(contents: &str) -> Result<Self, Error> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from the YAML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        Self::from_yaml(&contents)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.rate.unit_scale <= 0.0 || !self.rate.unit_scale.is_finite() {
            return Err(Error::Invalid("rate unit_scale must be positive"));
        }
        if self.rate.floor <= 0.0 || !self.rate.floor.is_finite() {
            return Err(Error::Invalid("rate floor must be positive"));
        }
        if let Some(problem) = self.render.problem() {
            return Err(Error::Invalid(problem));
        }
        Ok(())
    }
}
