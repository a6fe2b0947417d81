//! Configuration parsing for tsctl
//!
//! This crate handles parsing the KDL configuration file and generating
//! a configuration from the current TotalSpaces space names.

mod error;
mod generator;
mod model;
mod parser;

pub use error::ConfigError;
pub use generator::{generate_spaces_kdl, write_config};
pub use model::*;
pub use parser::{parse_config, parse_config_str};
