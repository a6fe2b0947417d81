//! KDL configuration parser

use std::collections::HashMap;
use std::path::Path;

use totalspaces::MAX_SPACE_NAME_BYTES;

use crate::error::ConfigError;
use crate::model::*;

/// Line (1-indexed) of a node's name within the source
fn node_line(node: &kdl::KdlNode, source: &str) -> usize {
    let offset = node.name().span().offset();
    source
        .char_indices()
        .take_while(|(i, _)| *i < offset)
        .filter(|(_, ch)| *ch == '\n')
        .count()
        + 1
}

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl carries its own miette version, so rebuild the span from offset/len
        let span = miette::SourceSpan::from((e.span.offset(), e.span.len()));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "spaces" => {
                config.spaces = parse_spaces(node, content)?;
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

fn first_string<'a>(node: &'a kdl::KdlNode) -> Option<&'a str> {
    node.entries().first().and_then(|e| e.value().as_string())
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    if let Some(val) = first_string(child) {
                        global.log_level = val
                            .parse()
                            .map_err(|e| ConfigError::Invalid { message: e })?;
                    }
                }
                "version-check" => {
                    let value = child.entries().first().and_then(|e| e.value().as_bool());
                    global.version_check = value.ok_or_else(|| ConfigError::Invalid {
                        message: "version-check expects true or false".to_string(),
                    })?;
                }
                "expected-api-version" => {
                    let value = first_string(child).ok_or_else(|| ConfigError::Invalid {
                        message: "expected-api-version expects a string".to_string(),
                    })?;
                    global.expected_api_version = Some(value.to_string());
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_spaces(node: &kdl::KdlNode, source: &str) -> Result<Vec<SpaceConfig>, ConfigError> {
    let mut spaces = Vec::new();
    let mut seen: HashMap<u32, usize> = HashMap::new();

    let Some(children) = node.children() else {
        return Ok(spaces);
    };

    for child in children.nodes() {
        if child.name().value() != "space" {
            tracing::warn!("Unknown node in spaces block: {}", child.name().value());
            continue;
        }

        let space = parse_space(child)?;
        let line = node_line(child, source);
        if seen.insert(space.space_number, line).is_some() {
            return Err(ConfigError::DuplicateSpace {
                space_number: space.space_number,
                line,
            });
        }
        spaces.push(space);
    }

    Ok(spaces)
}

fn parse_space(node: &kdl::KdlNode) -> Result<SpaceConfig, ConfigError> {
    let mut space_number = None;
    let mut name = None;

    for entry in node.entries() {
        match entry.name().map(|n| n.value()) {
            None => {
                let number = entry
                    .value()
                    .as_i64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| ConfigError::Invalid {
                        message: format!("Invalid space number: {}", entry.value()),
                    })?;
                space_number = Some(number);
            }
            Some("name") => {
                let value = entry.value().as_string().ok_or_else(|| ConfigError::Invalid {
                    message: "Space name must be a string".to_string(),
                })?;
                name = Some(value.to_string());
            }
            Some(other) => {
                tracing::warn!("Unknown space property: {}", other);
            }
        }
    }

    let space_number = space_number.ok_or_else(|| ConfigError::MissingField {
        field: "space number".to_string(),
    })?;
    let name = name.ok_or_else(|| ConfigError::MissingField {
        field: format!("name for space {}", space_number),
    })?;

    if name.len() > MAX_SPACE_NAME_BYTES {
        return Err(ConfigError::Invalid {
            message: format!(
                "Name for space {} is {} bytes, the limit is {}",
                space_number,
                name.len(),
                MAX_SPACE_NAME_BYTES
            ),
        });
    }
    if name.contains('\0') {
        return Err(ConfigError::Invalid {
            message: format!("Name for space {} contains a NUL byte", space_number),
        });
    }

    Ok(SpaceConfig { space_number, name })
}
