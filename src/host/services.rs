//! In-process service directory.
//!
//! Modules register their services here once they are up; observers get
//! existing matches replayed and new ones pushed as they appear.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::services::{Observation, ObservationId, ServiceDiscovery, ServiceKind, ServiceRecord};

struct Observer {
    kind: ServiceKind,
    scope: String,
    events: mpsc::UnboundedSender<ServiceRecord>,
}

impl Observer {
    fn matches(&self, record: &ServiceRecord) -> bool {
        self.kind == record.kind && self.scope == record.scope
    }
}

#[derive(Default)]
struct Directory {
    next_service_id: u64,
    next_observation_id: u64,
    services: Vec<ServiceRecord>,
    observers: BTreeMap<u64, Observer>,
}

/// Service directory shared by the host and its modules.
#[derive(Default)]
pub struct LocalServiceRegistry {
    directory: Mutex<Directory>,
}

impl LocalServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Directory> {
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a service and notify matching observers.
    pub fn register(&self, kind: ServiceKind, scope: &str, provider: &str) -> ServiceRecord {
        let mut directory = self.lock();
        directory.next_service_id += 1;
        let record = ServiceRecord {
            id: directory.next_service_id,
            kind,
            scope: scope.to_string(),
            provider: provider.to_string(),
        };

        for observer in directory.observers.values().filter(|o| o.matches(&record)) {
            // A dropped receiver just means nobody is listening anymore.
            let _ = observer.events.send(record.clone());
        }
        directory.services.push(record.clone());

        debug!(
            "Registered {} service #{} (scope '{}', provider {})",
            kind, record.id, scope, provider
        );
        record
    }

    pub fn services(&self, kind: ServiceKind, scope: &str) -> Vec<ServiceRecord> {
        self.lock()
            .services
            .iter()
            .filter(|s| s.kind == kind && s.scope == scope)
            .cloned()
            .collect()
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }
}

impl ServiceDiscovery for LocalServiceRegistry {
    fn observe(&self, kind: ServiceKind, scope: &str) -> Observation {
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = Observer {
            kind,
            scope: scope.to_string(),
            events: tx,
        };

        let mut directory = self.lock();
        for record in directory.services.iter().filter(|s| observer.matches(s)) {
            let _ = observer.events.send(record.clone());
        }

        directory.next_observation_id += 1;
        let id = directory.next_observation_id;
        directory.observers.insert(id, observer);

        Observation {
            id: ObservationId(id),
            events: rx,
        }
    }

    fn stop_observing(&self, id: ObservationId) {
        if self.lock().observers.remove(&id.0).is_some() {
            debug!("Stopped observation #{}", id.0);
        }
    }
}
