//! Installs the resolved edition and database features into the module registry.
//!
//! Only features the registry does not already report as installed are
//! requested, in a single request, so repeated startups are no-ops.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::keys;
use crate::error::{BootstrapError, BootstrapResult};
use crate::registry::{FeatureDescriptor, FeatureService, InstallOptions, ModuleRegistry};

/// Result of a feature installation pass.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub edition: FeatureDescriptor,
    pub db_feature: FeatureDescriptor,
    /// Ids submitted for installation; empty when everything was present.
    pub requested: Vec<String>,
}

impl InstallReport {
    pub fn was_noop(&self) -> bool {
        self.requested.is_empty()
    }
}

/// Feature installer bound to a module registry.
pub struct FeatureInstaller {
    registry: Arc<dyn ModuleRegistry>,
    timeout: Duration,
}

impl FeatureInstaller {
    pub fn new(registry: Arc<dyn ModuleRegistry>) -> Self {
        Self::with_timeout(
            registry,
            Duration::from_millis(keys::DEFAULT_REGISTRY_TIMEOUT_MS),
        )
    }

    pub fn with_timeout(registry: Arc<dyn ModuleRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Wait, up to the configured bound, for the registry's feature service.
    async fn acquire_feature_service(&self) -> BootstrapResult<Arc<dyn FeatureService>> {
        let unavailable = || BootstrapError::RegistryUnavailable {
            waited: self.timeout,
        };

        let mut slot = self.registry.feature_service();
        let ready = tokio::time::timeout(self.timeout, slot.wait_for(Option::is_some)).await;

        match ready {
            Ok(Ok(service)) => service.clone().ok_or_else(unavailable),
            // Registry dropped its sender: it will never become ready.
            Ok(Err(_)) => Err(unavailable()),
            Err(_) => Err(unavailable()),
        }
    }

    /// Install the edition feature and the database feature if missing.
    pub async fn install_features(
        &self,
        edition: &str,
        db_feature: &str,
    ) -> BootstrapResult<InstallReport> {
        let service = self.acquire_feature_service().await?;

        let edition_feature = resolve(service.as_ref(), edition)?;
        let db = resolve(service.as_ref(), db_feature)?;
        info!("Installing: {} ({})", edition_feature, db);

        let mut requested: Vec<String> = Vec::with_capacity(2);
        for feature in [&edition_feature, &db] {
            if service.is_installed(feature) {
                debug!("Feature already installed: {}", feature);
            } else if !requested.contains(&feature.id) {
                requested.push(feature.id.clone());
            }
        }

        if requested.is_empty() {
            info!("Features already installed, nothing to do");
        } else {
            service
                .install_features(&requested, InstallOptions::no_refresh())
                .map_err(|source| BootstrapError::InstallFailed { source })?;
        }

        info!("Installed: {} ({})", edition_feature, db);
        Ok(InstallReport {
            edition: edition_feature,
            db_feature: db,
            requested,
        })
    }
}

fn resolve(service: &dyn FeatureService, id: &str) -> BootstrapResult<FeatureDescriptor> {
    service
        .get_feature(id)
        .ok_or_else(|| BootstrapError::UnknownFeature { id: id.to_string() })
}
