//! Generate configuration files from space names

use std::fmt::Write as _;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConfigError;
use crate::model::Config;

/// Format a SystemTime as an ISO 8601 timestamp (UTC).
fn format_timestamp(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    let (year, month, day) = civil_from_days(secs.div_euclid(86400));
    let of_day = secs.rem_euclid(86400);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        of_day / 3600,
        (of_day % 3600) / 60,
        of_day % 60
    )
}

/// Convert days since 1970-01-01 to a (year, month, day) civil date
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Quote a string as a KDL string literal
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a configuration as KDL
///
/// The output starts with a comment header recording when it was generated
/// and parses back to an equal `Config`.
pub fn generate_spaces_kdl(config: &Config) -> String {
    let mut out = String::new();
    let global = &config.global;

    out.push_str("// Generated by tsctl export\n");
    let _ = writeln!(out, "// Generated at: {}", format_timestamp(SystemTime::now()));
    out.push('\n');

    out.push_str("global {\n");
    let _ = writeln!(out, "    log-level {}", quote(global.log_level.as_filter()));
    let _ = writeln!(out, "    version-check {}", global.version_check);
    if let Some(version) = &global.expected_api_version {
        let _ = writeln!(out, "    expected-api-version {}", quote(version));
    }
    out.push_str("}\n\n");

    out.push_str("spaces {\n");
    for space in &config.spaces {
        let _ = writeln!(out, "    space {} name={}", space.space_number, quote(&space.name));
    }
    out.push_str("}\n");

    out
}

/// Check that generated KDL parses back into a configuration
fn validate_kdl(content: &str) -> Result<(), ConfigError> {
    crate::parser::parse_config_str(content).map_err(|e| ConfigError::Invalid {
        message: format!("Generated KDL is invalid (this is a bug in tsctl): {}", e),
    })?;
    Ok(())
}

/// Write a configuration to `path` using an atomic write.
///
/// The content is validated first, then written to a temporary file in the
/// target directory and renamed over the target. If anything fails the
/// original file is left untouched.
pub fn write_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let content = generate_spaces_kdl(config);
    validate_kdl(&content)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Same directory so the rename stays on one filesystem
    let temp_path = path.with_extension("kdl.tmp");

    if let Err(e) = std::fs::write(&temp_path, &content) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    tracing::info!("Wrote configuration to {}", path.display());

    Ok(())
}
