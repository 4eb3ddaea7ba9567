//! Error types for the bootstrap sequence.
//!
//! Every fatal failure is reported to the host as a single
//! [`BootstrapError`]. Nothing is retried; restarting the process is the
//! only recovery path.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::registry::RegistryError;

/// Result alias for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Fatal bootstrap failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A required configuration key was absent.
    #[error("Missing required property: {key}")]
    MissingConfiguration {
        /// Name of the missing key.
        key: String,
    },
    /// The work directory could not be resolved or created.
    #[error("Failed to prepare work directory {}", .path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The module registry never exposed its feature service.
    #[error("Module registry feature service unavailable after {waited:?}")]
    RegistryUnavailable {
        /// How long the installer waited before giving up.
        waited: Duration,
    },
    /// A configured feature id is not known to the registry.
    #[error("Unknown feature: {id}")]
    UnknownFeature { id: String },
    /// The registry rejected the installation request.
    #[error("Feature installation failed")]
    InstallFailed {
        #[source]
        source: RegistryError,
    },
    /// The readiness barrier was closed while startup was still waiting.
    #[error("Service readiness barrier closed before services became available")]
    BarrierClosed,
}

/// Failure to persist the edition marker.
///
/// Advisory state only: callers log it and carry on.
#[derive(Debug, Error)]
#[error("Failed to create edition marker {}", .path.display())]
pub struct MarkerError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}
