//! In-process module registry backed by a JSON feature catalog.
//!
//! The catalog lists the installable features and the services each one
//! provides once activated. Installed feature ids are persisted under the
//! work directory so later startups see them as already installed.
//!
//! The feature service is only published after [`LocalModuleRegistry::start`]
//! runs, mirroring a registry that finishes initializing in the background.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info};

use super::services::LocalServiceRegistry;
use crate::registry::{
    FeatureDescriptor, FeatureService, FeatureServiceSlot, InstallOptions, ModuleRegistry,
    RegistryError,
};
use crate::services::ServiceKind;

/// Relative location of the installed-state file under the work directory.
pub const INSTALLED_STATE_FILE: &str = "cache/installed-features.json";

/// One feature in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub version: String,
    /// Services registered when the feature is activated.
    #[serde(default)]
    pub provides: Vec<ServiceKind>,
}

/// Catalog of installable features.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureCatalog {
    pub features: Vec<CatalogEntry>,
}

impl FeatureCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feature catalog: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse feature catalog: {:?}", path))
    }

    fn entry(&self, id: &str) -> Option<&CatalogEntry> {
        self.features.iter().find(|f| f.id == id)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct InstalledState {
    #[serde(default)]
    installed: BTreeSet<String>,
}

/// Feature service over the catalog and the persisted installed set.
pub struct LocalFeatureService {
    catalog: FeatureCatalog,
    state_path: PathBuf,
    installed: Mutex<BTreeSet<String>>,
    services: Arc<LocalServiceRegistry>,
    scope: String,
}

impl LocalFeatureService {
    fn load_installed(state_path: &Path) -> Result<BTreeSet<String>> {
        if !state_path.exists() {
            return Ok(BTreeSet::new());
        }
        let content = std::fs::read_to_string(state_path)
            .with_context(|| format!("Failed to read installed state: {:?}", state_path))?;
        let state: InstalledState =
            serde_json::from_str(&content).context("Failed to parse installed state")?;
        Ok(state.installed)
    }

    fn persist(&self, installed: &BTreeSet<String>) -> Result<()> {
        if let Some(parent) = self.state_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let state = InstalledState {
            installed: installed.clone(),
        };
        let content =
            serde_json::to_string_pretty(&state).context("Failed to serialize installed state")?;
        std::fs::write(&self.state_path, content)
            .with_context(|| format!("Failed to write installed state: {:?}", self.state_path))?;
        debug!("Installed state saved to {:?}", self.state_path);
        Ok(())
    }

    /// Register the services a feature provides.
    fn activate(&self, id: &str) {
        let Some(entry) = self.catalog.entry(id) else {
            return;
        };
        for kind in &entry.provides {
            self.services.register(*kind, &self.scope, &entry.id);
        }
        debug!("Activated feature {}", id);
    }

    pub fn installed(&self) -> BTreeSet<String> {
        self.installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FeatureService for LocalFeatureService {
    fn get_feature(&self, id: &str) -> Option<FeatureDescriptor> {
        self.catalog
            .entry(id)
            .map(|e| FeatureDescriptor::new(e.id.clone(), e.version.clone()))
    }

    fn is_installed(&self, feature: &FeatureDescriptor) -> bool {
        self.installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&feature.id)
    }

    fn install_features(
        &self,
        ids: &[String],
        options: InstallOptions,
    ) -> Result<(), RegistryError> {
        // All-or-nothing: validate every id before touching state.
        if let Some(unknown) = ids.iter().find(|id| self.catalog.entry(id).is_none()) {
            return Err(RegistryError::NotFound(unknown.clone()));
        }
        debug!("Installing {:?} with {:?}", ids, options);

        let newly_installed: Vec<String> = {
            let mut installed = self.installed.lock().unwrap_or_else(PoisonError::into_inner);
            let mut next = installed.clone();
            let added: Vec<String> = ids
                .iter()
                .filter(|id| next.insert((*id).clone()))
                .cloned()
                .collect();
            self.persist(&next).map_err(RegistryError::Storage)?;
            *installed = next;
            added
        };

        for id in &newly_installed {
            self.activate(id);
        }
        info!("Registry installed {} feature(s): {:?}", newly_installed.len(), newly_installed);
        Ok(())
    }
}

/// Module registry whose feature service becomes available on [`Self::start`].
pub struct LocalModuleRegistry {
    features: Arc<LocalFeatureService>,
    slot: watch::Sender<FeatureServiceSlot>,
}

impl LocalModuleRegistry {
    pub fn new(
        catalog: FeatureCatalog,
        work_dir: &Path,
        services: Arc<LocalServiceRegistry>,
        scope: impl Into<String>,
    ) -> Result<Self> {
        let state_path = work_dir.join(INSTALLED_STATE_FILE);
        let installed = LocalFeatureService::load_installed(&state_path)?;
        let features = Arc::new(LocalFeatureService {
            catalog,
            state_path,
            installed: Mutex::new(installed),
            services,
            scope: scope.into(),
        });
        let (slot, _) = watch::channel(None);
        Ok(Self { features, slot })
    }

    /// Activate previously installed features and publish the feature service.
    pub fn start(&self) {
        let installed = self.features.installed();
        for id in &installed {
            self.features.activate(id);
        }
        info!(
            "Module registry started ({} feature(s) already installed)",
            installed.len()
        );
        self.slot
            .send_replace(Some(self.features.clone() as Arc<dyn FeatureService>));
    }

    pub fn features(&self) -> &LocalFeatureService {
        &self.features
    }
}

impl ModuleRegistry for LocalModuleRegistry {
    fn feature_service(&self) -> watch::Receiver<FeatureServiceSlot> {
        self.slot.subscribe()
    }
}
