//! Bootstrap sequence: resolve configuration, install features, wait for services.
//!
//! The flow runs once on the startup path:
//! ```text
//! require karaf.data, nexus-edition, nexus-db-feature
//! prepare work dir
//! cascade -> select edition -> (cascade again if downgraded)
//! install edition + db features
//! publish nexus.properties
//! wait for listener + filter services
//! ```
//!
//! Any failure aborts the sequence and is returned as one [`BootstrapError`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::cascade;
use crate::config::keys;
use crate::config::Properties;
use crate::edition::{EditionDecision, EditionSelector, LicensePreferences};
use crate::error::{BootstrapError, BootstrapResult};
use crate::host::HostContext;
use crate::install::{FeatureInstaller, InstallReport};
use crate::registry::ModuleRegistry;
use crate::services::{ServiceDiscovery, ServiceReadinessBarrier, ServiceRecord};

/// Keys that must be present before any step runs.
const REQUIRED_KEYS: &[&str] = &[keys::KARAF_DATA, keys::NEXUS_EDITION, keys::NEXUS_DB_FEATURE];

/// State of each bootstrap step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StepStatus {
    #[default]
    NotStarted,
    InProgress,
    Success,
    Failed(String),
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Success)
    }
}

/// Tunables read from the properties before the sequence starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOptions {
    /// Bound on waiting for the registry's feature service.
    pub registry_timeout: Duration,
    /// Scope the listener and filter services are observed under.
    pub service_scope: String,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            registry_timeout: Duration::from_millis(keys::DEFAULT_REGISTRY_TIMEOUT_MS),
            service_scope: keys::DEFAULT_SERVICE_SCOPE.to_string(),
        }
    }
}

impl BootstrapOptions {
    pub fn from_properties(properties: &Properties) -> Self {
        let mut options = Self::default();

        if let Some(raw) = properties.get(keys::REGISTRY_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => options.registry_timeout = Duration::from_millis(ms),
                Err(_) => warn!(
                    "Ignoring invalid {}={}, using {:?}",
                    keys::REGISTRY_TIMEOUT_MS,
                    raw,
                    options.registry_timeout
                ),
            }
        }
        if let Some(scope) = properties.get(keys::SERVICE_SCOPE) {
            if !scope.trim().is_empty() {
                options.service_scope = scope.trim().to_string();
            }
        }

        options
    }
}

/// Everything the host needs once bootstrap completes.
#[derive(Debug, Clone)]
pub struct BootstrapState {
    pub work_dir: PathBuf,
    pub edition: EditionDecision,
    /// `None` when no edition was configured and installation was skipped.
    pub install: Option<InstallReport>,
    pub listener: ServiceRecord,
    pub filter: ServiceRecord,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Runs the bootstrap sequence against the host's collaborators.
///
/// # Example
/// ```ignore
/// let mut bootstrap = Bootstrap::new(registry, discovery, preferences, context, options);
/// let state = bootstrap.run(&mut properties).await?;
/// // Request handling may start now
/// bootstrap.shutdown();
/// ```
pub struct Bootstrap {
    registry: Arc<dyn ModuleRegistry>,
    preferences: Arc<dyn LicensePreferences>,
    context: Arc<HostContext>,
    barrier: Arc<ServiceReadinessBarrier>,
    options: BootstrapOptions,
    config_status: StepStatus,
    edition_status: StepStatus,
    features_status: StepStatus,
    services_status: StepStatus,
}

impl Bootstrap {
    pub fn new(
        registry: Arc<dyn ModuleRegistry>,
        discovery: Arc<dyn ServiceDiscovery>,
        preferences: Arc<dyn LicensePreferences>,
        context: Arc<HostContext>,
        options: BootstrapOptions,
    ) -> Self {
        let barrier = Arc::new(ServiceReadinessBarrier::new(
            discovery,
            options.service_scope.clone(),
        ));
        Self {
            registry,
            preferences,
            context,
            barrier,
            options,
            config_status: StepStatus::NotStarted,
            edition_status: StepStatus::NotStarted,
            features_status: StepStatus::NotStarted,
            services_status: StepStatus::NotStarted,
        }
    }

    /// Barrier handle, so a shutdown signal can close it while `run` waits.
    pub fn barrier(&self) -> Arc<ServiceReadinessBarrier> {
        self.barrier.clone()
    }

    /// Check required keys and prepare the work directory.
    fn ensure_configuration(&mut self, properties: &Properties) -> BootstrapResult<PathBuf> {
        self.config_status = StepStatus::InProgress;

        let result = require_keys(properties)
            .and_then(|_| properties.require(keys::KARAF_DATA))
            .and_then(|data| prepare_work_dir(Path::new(data)));

        match result {
            Ok(work_dir) => {
                debug!("Work directory: {:?}", work_dir);
                self.config_status = StepStatus::Success;
                Ok(work_dir)
            }
            Err(e) => {
                self.config_status = StepStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Normalize flags and decide the edition.
    fn ensure_edition(&mut self, properties: &mut Properties, work_dir: &Path) -> EditionDecision {
        self.edition_status = StepStatus::InProgress;

        cascade::apply(properties);
        let decision =
            EditionSelector::new(self.preferences.as_ref()).select_edition(properties, work_dir);
        if decision.is_downgraded() {
            // Edition-dependent rules must see the baseline edition.
            cascade::apply(properties);
        }

        info!(
            "Edition: {} ({:?}), db feature: {}",
            properties.get_or(keys::NEXUS_EDITION, ""),
            decision,
            properties.get_or(keys::NEXUS_DB_FEATURE, "")
        );
        self.edition_status = StepStatus::Success;
        decision
    }

    /// Install the edition and db features if the registry lacks them.
    async fn ensure_features(
        &mut self,
        properties: &mut Properties,
    ) -> BootstrapResult<Option<InstallReport>> {
        self.features_status = StepStatus::InProgress;

        let edition = properties.require(keys::NEXUS_EDITION)?.to_string();
        if edition.is_empty() {
            warn!("No edition configured, skipping feature installation");
            self.features_status = StepStatus::Success;
            return Ok(None);
        }
        let db_feature = properties.require(keys::NEXUS_DB_FEATURE)?.to_string();

        let installer =
            FeatureInstaller::with_timeout(self.registry.clone(), self.options.registry_timeout);
        match installer.install_features(&edition, &db_feature).await {
            Ok(report) => {
                properties.set(keys::NEXUS_FULL_EDITION, report.edition.to_string());
                self.features_status = StepStatus::Success;
                Ok(Some(report))
            }
            Err(e) => {
                self.features_status = StepStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Block until the listener and filter services are published.
    async fn ensure_services(&mut self) -> BootstrapResult<(ServiceRecord, ServiceRecord)> {
        self.services_status = StepStatus::InProgress;

        match self.barrier.await_services(&self.context).await {
            Ok(services) => {
                self.services_status = StepStatus::Success;
                Ok(services)
            }
            Err(e) => {
                self.services_status = StepStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_steps(
        &mut self,
        properties: &mut Properties,
        started_at: DateTime<Utc>,
    ) -> BootstrapResult<BootstrapState> {
        let work_dir = self.ensure_configuration(properties)?;
        let edition = self.ensure_edition(properties, &work_dir);
        let install = self.ensure_features(properties).await?;

        self.context.publish_properties(properties);

        let (listener, filter) = self.ensure_services().await?;

        Ok(BootstrapState {
            work_dir,
            edition,
            install,
            listener,
            filter,
            started_at,
            completed_at: Utc::now(),
        })
    }

    /// Run the whole sequence, mutating `properties` with the derived flags.
    pub async fn run(&mut self, properties: &mut Properties) -> BootstrapResult<BootstrapState> {
        info!("Initializing");
        let started_at = Utc::now();

        match self.run_steps(properties, started_at).await {
            Ok(state) => {
                info!(
                    "Initialized in {} ms",
                    (state.completed_at - state.started_at).num_milliseconds()
                );
                Ok(state)
            }
            Err(e) => {
                error!("Failed to initialize: {}", e);
                Err(e)
            }
        }
    }

    /// Stop waiting for services. Safe to call more than once.
    pub fn shutdown(&self) {
        info!("Destroying");
        self.barrier.close();
        info!("Destroyed");
    }

    pub fn config_status(&self) -> &StepStatus {
        &self.config_status
    }

    pub fn edition_status(&self) -> &StepStatus {
        &self.edition_status
    }

    pub fn features_status(&self) -> &StepStatus {
        &self.features_status
    }

    pub fn services_status(&self) -> &StepStatus {
        &self.services_status
    }
}

fn require_keys(properties: &Properties) -> BootstrapResult<()> {
    for key in REQUIRED_KEYS {
        properties.require(key)?;
    }
    Ok(())
}

/// Create the work directory if needed and return its canonical path.
fn prepare_work_dir(path: &Path) -> BootstrapResult<PathBuf> {
    let to_error = |source| BootstrapError::WorkDir {
        path: path.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(path).map_err(to_error)?;
    path.canonicalize().map_err(to_error)
}
