//! Loading bootstrap properties from layered `.properties` files.
//!
//! Layers are applied in order, later layers overriding earlier ones:
//! 1. the default properties file (shipped with the installation)
//! 2. the user properties file under the data directory, if present
//! 3. explicit `key=value` overrides from the command line
//!
//! After layering, `${key}` placeholders are expanded against the merged
//! properties, falling back to the process environment.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

use super::Properties;

/// Maximum nesting depth when expanding placeholders.
const MAX_INTERPOLATION_PASSES: usize = 8;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

/// Parse properties text in the `key=value` / `key: value` format.
///
/// Lines starting with `#` or `!` are comments. A trailing backslash
/// continues the value on the next line.
pub fn parse_properties(content: &str) -> Properties {
    let mut properties = Properties::new();
    let mut pending = String::new();

    for raw in content.lines() {
        let line = raw.trim();
        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
        {
            continue;
        }

        if let Some(stripped) = line.strip_suffix('\\') {
            pending.push_str(stripped);
            continue;
        }
        pending.push_str(line);

        let logical = std::mem::take(&mut pending);
        match split_entry(&logical) {
            Some((key, value)) => properties.set(key, value),
            None => properties.set(logical.trim(), ""),
        }
    }

    if !pending.is_empty() {
        if let Some((key, value)) = split_entry(&pending) {
            properties.set(key, value);
        }
    }

    properties
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(['=', ':'])?;
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[idx + 1..].trim()))
}

/// Read and parse a properties file.
pub fn load_file(path: &Path) -> Result<Properties> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read properties file: {:?}", path))?;
    let properties = parse_properties(&content);
    debug!("Loaded {} properties from {:?}", properties.len(), path);
    Ok(properties)
}

/// Read a properties file if it exists, otherwise return empty properties.
pub fn load_optional_file(path: &Path) -> Result<Properties> {
    if !path.exists() {
        debug!("Optional properties file not found: {:?}", path);
        return Ok(Properties::new());
    }
    load_file(path)
}

/// Parse a single `key=value` override as given on the command line.
pub fn parse_override(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("Invalid property override '{}', expected key=value", raw),
    }
}

/// Expand `${key}` placeholders in every value.
///
/// Lookups consult the properties first, then environment variables.
/// Unresolvable placeholders are left untouched.
pub fn interpolate(properties: &mut Properties) {
    for _ in 0..MAX_INTERPOLATION_PASSES {
        let snapshot = properties.clone();
        let mut changed = false;

        for (key, value) in snapshot.iter() {
            if !value.contains("${") {
                continue;
            }
            let expanded = expand_value(value, &snapshot);
            if expanded != value {
                properties.set(key, expanded);
                changed = true;
            }
        }

        if !changed {
            return;
        }
    }
    warn!(
        "Property interpolation did not settle after {} passes; check for cyclic placeholders",
        MAX_INTERPOLATION_PASSES
    );
}

fn expand_value(value: &str, lookup: &Properties) -> String {
    placeholder_pattern()
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            lookup
                .get(name)
                .map(str::to_string)
                .or_else(|| std::env::var(name).ok())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Build the bootstrap properties from all layers.
pub fn load_layered(
    default_file: Option<&Path>,
    user_file: Option<&Path>,
    overrides: &[(String, String)],
) -> Result<Properties> {
    let mut properties = Properties::new();

    if let Some(path) = default_file {
        properties.extend(load_file(path)?);
    }
    if let Some(path) = user_file {
        properties.extend(load_optional_file(path)?);
    }
    for (key, value) in overrides {
        properties.set(key.clone(), value.clone());
    }

    interpolate(&mut properties);
    Ok(properties)
}
