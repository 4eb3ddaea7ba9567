//! Service discovery capabilities and the startup readiness barrier.
//!
//! Services are registered by other modules once they finish initializing.
//! The bootstrap only observes their appearance; it never owns their
//! lifecycle.

mod barrier;

pub use barrier::{ServiceReadinessBarrier, TrackerState};

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// The two service kinds request handling depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Listener,
    Filter,
}

impl ServiceKind {
    /// Host attribute key the service is published under.
    pub fn attribute_key(&self) -> &'static str {
        match self {
            ServiceKind::Listener => "listener-service",
            ServiceKind::Filter => "filter-service",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Listener => write!(f, "listener"),
            ServiceKind::Filter => write!(f, "filter"),
        }
    }
}

/// A registered service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    pub id: u64,
    pub kind: ServiceKind,
    pub scope: String,
    /// Feature or module that registered the service.
    pub provider: String,
}

/// Identifies an open observation so it can be stopped later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationId(pub u64);

/// Stream of matching service appearances.
///
/// Services already registered when the observation opens are delivered
/// first. The stream ends once the observation is stopped.
pub struct Observation {
    pub id: ObservationId,
    pub events: mpsc::UnboundedReceiver<ServiceRecord>,
}

/// Observe services of a kind appearing under a scope.
pub trait ServiceDiscovery: Send + Sync {
    fn observe(&self, kind: ServiceKind, scope: &str) -> Observation;

    /// Stop an observation. Unknown or already-stopped ids are ignored.
    fn stop_observing(&self, id: ObservationId);
}
