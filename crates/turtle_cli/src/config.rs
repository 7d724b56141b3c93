//! TOML-backed configuration for the four architecture widths and two memory
//! latencies, adapted from the teacher's `splst_front::config` (a GUI
//! settings file) to a CPU-widths file.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config file: {0}")]
    Deserialize(#[from] toml::de::Error),
    #[error(
        "config {field} = {found} does not match the compiled-in width {expected}; \
         widths are fixed at build time, only the two latencies are configurable"
    )]
    WidthMismatch { field: &'static str, found: u32, expected: u32 },
}

/// The four widths are carried for documentation and validation against the
/// compiled-in [`turtle_util`] bus widths; they are not themselves used to
/// parameterize anything at runtime; see `Config::validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_width: u32,
    pub instruction_width: u32,
    pub data_address_width: u32,
    pub instruction_address_width: u32,
    pub instruction_fetch_latency_cycles: u32,
    pub data_memory_latency_cycles: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_width: turtle_util::DataBusValue::WIDTH,
            instruction_width: turtle_util::InstructionAddressBusValue::WIDTH,
            data_address_width: turtle_util::DataAddressBusValue::WIDTH,
            instruction_address_width: turtle_util::InstructionAddressBusValue::WIDTH,
            instruction_fetch_latency_cycles: 10,
            data_memory_latency_cycles: 0,
        }
    }
}

impl Config {
    /// Load from `path`, falling back to compiled-in defaults if it doesn't
    /// exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// The four widths are compile-time constants baked into the bus-value
    /// types; a config file may only restate them, never change them.
    fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("data_width", self.data_width, turtle_util::DataBusValue::WIDTH),
            ("instruction_address_width", self.instruction_address_width, turtle_util::InstructionAddressBusValue::WIDTH),
            ("data_address_width", self.data_address_width, turtle_util::DataAddressBusValue::WIDTH),
        ];
        for (field, found, expected) in checks {
            if found != expected {
                return Err(ConfigError::WidthMismatch { field, found, expected });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("/nonexistent/turtle.toml")).unwrap();
        assert_eq!(config.instruction_fetch_latency_cycles, 10);
        assert_eq!(config.data_memory_latency_cycles, 0);
    }

    #[test]
    fn mismatched_width_is_rejected() {
        let mut config = Config::default();
        config.data_width = 16;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_widths_match_compiled_bus_types() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }
}
