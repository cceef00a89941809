//! TOML project file parsing for `krkrtools.toml`.
//!
//! ```toml
//! [defines]
//! KIRIKIRIZ = 1
//! DEBUG = true
//! ```

use parser::DefineList;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the project file looked up next to the working directory
pub const CONFIG_FILE_NAME: &str = "krkrtools.toml";

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    defines: Option<HashMap<String, toml::Value>>,
}

/// Settings shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    /// Defines visible to `@if` before the first `@set`
    pub defines: DefineList,
}

/// Parse a `krkrtools.toml` string.
pub fn parse_config(content: &str) -> Result<ProjectConfig, String> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;

    let mut defines = DefineList::new();
    for (name, value) in raw.defines.unwrap_or_default() {
        let value = match value {
            toml::Value::Integer(n) => n,
            toml::Value::Boolean(b) => b as i64,
            other => {
                return Err(format!(
                    "define '{}' must be an integer or boolean, got {}",
                    name,
                    other.type_str()
                ))
            }
        };
        defines.set(name, value);
    }
    Ok(ProjectConfig { defines })
}

/// Load the project file.
///
/// An explicit path must exist; otherwise `krkrtools.toml` in the current
/// directory is used when present, and an empty config when not.
pub fn load_config(explicit: Option<&Path>) -> Result<ProjectConfig, String> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(CONFIG_FILE_NAME);
            if !default.exists() {
                return Ok(ProjectConfig::default());
            }
            default
        }
    };
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    log::debug!("loaded project config from {}", path.display());
    parse_config(&content)
}

/// Parse one `-D NAME=VALUE` flag; a bare `NAME` means 1.
pub fn parse_define(arg: &str) -> Result<(String, i64), String> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => {
            let value = value
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid value in define '{}': {}", arg, e))?;
            (name.trim(), value)
        }
        None => (arg.trim(), 1),
    };
    if name.is_empty() {
        return Err(format!("invalid define '{}': missing name", arg));
    }
    Ok((name.to_string(), value))
}

impl ProjectConfig {
    /// Apply command-line defines on top of the file's
    pub fn with_overrides(mut self, overrides: &[(String, i64)]) -> Self {
        for (name, value) in overrides {
            self.defines.set(name.clone(), *value);
        }
        self
    }
}
