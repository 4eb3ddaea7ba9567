use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default data directory, relative to the installation directory.
const DEFAULT_DATA_DIR: &str = "../sonatype-work/nexus3";

/// Resolve the installation directory, defaulting to the current directory.
pub fn resolve_base_dir(base_dir: Option<&str>) -> Result<PathBuf> {
    match base_dir {
        Some(path) => PathBuf::from(path)
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize installation directory: {}", path)),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

/// Resolve the data directory. It may not exist yet; bootstrap creates it.
pub fn resolve_data_dir(base_dir: &Path, data_dir: Option<&str>) -> PathBuf {
    match data_dir {
        Some(path) => PathBuf::from(path),
        None => base_dir.join(DEFAULT_DATA_DIR),
    }
}

pub fn default_properties_file(base_dir: &Path, explicit: Option<&str>) -> PathBuf {
    explicit
        .map(PathBuf::from)
        .unwrap_or_else(|| base_dir.join("etc").join("nexus-default.properties"))
}

pub fn user_properties_file(data_dir: &Path, explicit: Option<&str>) -> PathBuf {
    explicit
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join("etc").join("nexus.properties"))
}

pub fn feature_catalog_file(base_dir: &Path, explicit: Option<&str>) -> PathBuf {
    explicit
        .map(PathBuf::from)
        .unwrap_or_else(|| base_dir.join("etc").join("features.json"))
}
