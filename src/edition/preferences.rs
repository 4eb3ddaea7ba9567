//! Per-user license preference lookup.
//!
//! A previously installed license leaves a `license` entry in the user's
//! preference file. The edition selector only needs to know whether one
//! exists; the value itself is opaque here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Read-only view of the stored license preference.
pub trait LicensePreferences: Send + Sync {
    fn has_stored_license(&self) -> bool;
}

#[derive(Debug, Default, Deserialize)]
struct ProfessionalPreferences {
    #[serde(default)]
    license: Option<String>,
}

/// License preference stored as JSON under the user's config directory.
///
/// Defaults to `<config_dir>/sonatype/nexus/professional.json`.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    /// Create a store at the default per-user location.
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir().context("Could not determine user config directory")?;
        Ok(Self::with_path(
            base.join("sonatype").join("nexus").join("professional.json"),
        ))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn read(&self) -> Result<ProfessionalPreferences> {
        if !self.path.exists() {
            return Ok(ProfessionalPreferences::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences: {:?}", self.path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse preferences JSON")
    }
}

impl LicensePreferences for FilePreferenceStore {
    fn has_stored_license(&self) -> bool {
        match self.read() {
            Ok(prefs) => {
                let present = prefs.license.is_some_and(|l| !l.is_empty());
                debug!("Stored license preference present: {}", present);
                present
            }
            Err(e) => {
                // An unreadable preference file counts as "no license".
                warn!("Ignoring license preferences: {:#}", e);
                false
            }
        }
    }
}
