//! Module registry capabilities consumed by the bootstrap.
//!
//! The registry is owned by the host. Its feature service may only become
//! available some time after process start, so the handle exposes it
//! through a `watch` channel that starts out empty.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

/// Read-only view of an installable feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureDescriptor {
    pub id: String,
    pub version: String,
}

impl FeatureDescriptor {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for FeatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.version)
    }
}

/// Options passed along with an installation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstallOptions {
    /// Do not refresh already-running modules affected by the install.
    pub no_auto_refresh: bool,
    /// Do not refresh already-running managed modules either.
    pub no_auto_refresh_managed: bool,
}

impl InstallOptions {
    /// Install without disturbing modules unrelated to the change.
    pub fn no_refresh() -> Self {
        Self {
            no_auto_refresh: true,
            no_auto_refresh_managed: true,
        }
    }
}

/// Errors reported by a registry when installing features.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("feature not found: {0}")]
    NotFound(String),
    #[error("installation rejected: {0}")]
    Rejected(String),
    #[error("registry storage error")]
    Storage(#[source] anyhow::Error),
}

/// Feature lookup and installation.
pub trait FeatureService: Send + Sync {
    fn get_feature(&self, id: &str) -> Option<FeatureDescriptor>;

    fn is_installed(&self, feature: &FeatureDescriptor) -> bool;

    /// Install all `ids` as one atomic request.
    fn install_features(
        &self,
        ids: &[String],
        options: InstallOptions,
    ) -> Result<(), RegistryError>;
}

/// Shared, possibly not-yet-available feature service.
pub type FeatureServiceSlot = Option<Arc<dyn FeatureService>>;

/// Handle to the host's module registry.
pub trait ModuleRegistry: Send + Sync {
    /// Watch for the feature service; the value is `None` until it is ready.
    fn feature_service(&self) -> watch::Receiver<FeatureServiceSlot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_display() {
        let feature = FeatureDescriptor::new("nexus-oss-edition", "3.23.0");
        assert_eq!(feature.to_string(), "nexus-oss-edition/3.23.0");
    }

    #[test]
    fn test_no_refresh_options() {
        let options = InstallOptions::no_refresh();
        assert!(options.no_auto_refresh);
        assert!(options.no_auto_refresh_managed);
        assert_eq!(InstallOptions::default(), InstallOptions {
            no_auto_refresh: false,
            no_auto_refresh_managed: false,
        });
    }
}
