//! Configuration data model

use std::path::PathBuf;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/totalspaces/config.kdl";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub global: GlobalConfig,
    /// Space names, in file order
    pub spaces: Vec<SpaceConfig>,
}

impl Config {
    /// Configured name for a space, if any
    pub fn space_name(&self, space_number: u32) -> Option<&str> {
        self.spaces
            .iter()
            .find(|space| space.space_number == space_number)
            .map(|space| space.name.as_str())
    }
}

/// Global settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
    /// Check that the library and TotalSpaces agree on the API version before use
    pub version_check: bool,
    /// Additionally require this exact API version
    pub expected_api_version: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            version_check: true,
            expected_api_version: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive for `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Name to apply to one space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceConfig {
    pub space_number: u32,
    pub name: String,
}

/// Expand `~` in a configuration path
pub fn expand_path(path: &str) -> PathBuf {
    shellexpand::tilde(path).into_owned().into()
}
