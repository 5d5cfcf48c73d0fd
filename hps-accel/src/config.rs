//! Accelerator configuration.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::constants::{MAX_FILTER_WORDS, MAX_INPUT_WORDS, WINDOW_WORDS};
use crate::CfuError;

/// Store capacities of one accelerator instance.
///
/// ```toml
/// input_store_depth = 256
/// filter_store_depth = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CfuConfig {
    /// Capacity of the input store, in words.
    pub input_store_depth: usize,

    /// Capacity of the filter store, in words.
    pub filter_store_depth: usize,
}

impl Default for CfuConfig {
    fn default() -> Self { Self { input_store_depth: MAX_INPUT_WORDS, filter_store_depth: MAX_FILTER_WORDS } }
}

impl CfuConfig {
    /// Sets the filter store capacity.
    #[must_use]
    pub fn with_filter_store_depth(self, filter_store_depth: usize) -> Self { Self { filter_store_depth, ..self } }

    /// Sets the input store capacity.
    #[must_use]
    pub fn with_input_store_depth(self, input_store_depth: usize) -> Self { Self { input_store_depth, ..self } }

    /// Parses and validates a TOML configuration. Missing keys take their default.
    pub fn from_toml_str(source: &str) -> Result<Self, CfuError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CfuError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks that both depths are non-zero multiples of the window size within the hardware limits.
    pub fn validate(&self) -> Result<(), CfuError> {
        check_depth("input_store_depth", self.input_store_depth, MAX_INPUT_WORDS)?;
        check_depth("filter_store_depth", self.filter_store_depth, MAX_FILTER_WORDS)
    }
}

fn check_depth(key: &str, depth: usize, max: usize) -> Result<(), CfuError> {
    if depth == 0 || depth % WINDOW_WORDS != 0 {
        return Err(CfuError::Config(format!("{key} must be a non-zero multiple of {WINDOW_WORDS}, got {depth}")));
    }
    if depth > max {
        return Err(CfuError::Config(format!("{key} must not exceed {max}, got {depth}")));
    }
    Ok(())
}
