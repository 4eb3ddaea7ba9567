//! Readiness barrier: hold startup until a listener and a filter service exist.
//!
//! No timeout: a missing service keeps startup pending. Each wait logs
//! when it begins. Closing the barrier wakes any waiter.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::{ObservationId, ServiceDiscovery, ServiceKind, ServiceRecord};
use crate::error::{BootstrapError, BootstrapResult};
use crate::host::HostContext;

/// Per-kind tracking state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Waiting,
    Observed(ServiceRecord),
    Published(ServiceRecord),
    Closed,
}

#[derive(Debug)]
struct Trackers {
    listener: TrackerState,
    filter: TrackerState,
    observations: Vec<ObservationId>,
    closed: bool,
}

impl Trackers {
    fn get_mut(&mut self, kind: ServiceKind) -> &mut TrackerState {
        match kind {
            ServiceKind::Listener => &mut self.listener,
            ServiceKind::Filter => &mut self.filter,
        }
    }
}

/// Blocks startup until both awaited services are observed under a scope.
pub struct ServiceReadinessBarrier {
    discovery: Arc<dyn ServiceDiscovery>,
    scope: String,
    closed: watch::Sender<bool>,
    trackers: Mutex<Trackers>,
}

impl ServiceReadinessBarrier {
    pub fn new(discovery: Arc<dyn ServiceDiscovery>, scope: impl Into<String>) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            discovery,
            scope: scope.into(),
            closed,
            trackers: Mutex::new(Trackers {
                listener: TrackerState::Waiting,
                filter: TrackerState::Waiting,
                observations: Vec::new(),
                closed: false,
            }),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn state(&self, kind: ServiceKind) -> TrackerState {
        self.lock().get_mut(kind).clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    fn lock(&self) -> MutexGuard<'_, Trackers> {
        self.trackers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self, kind: ServiceKind) -> BootstrapResult<mpsc::UnboundedReceiver<ServiceRecord>> {
        let mut trackers = self.lock();
        if trackers.closed {
            return Err(BootstrapError::BarrierClosed);
        }

        info!("Waiting for {} service (scope '{}')", kind, self.scope);
        let observation = self.discovery.observe(kind, &self.scope);
        trackers.observations.push(observation.id);
        Ok(observation.events)
    }

    /// Wait until one listener and one filter service are observed, then
    /// publish both into `context`.
    ///
    /// Returns `(listener, filter)`. Fails only with
    /// [`BootstrapError::BarrierClosed`].
    pub async fn await_services(
        &self,
        context: &HostContext,
    ) -> BootstrapResult<(ServiceRecord, ServiceRecord)> {
        let mut closed = self.closed.subscribe();
        let mut listeners = self.open(ServiceKind::Listener)?;
        let mut filters = self.open(ServiceKind::Filter)?;

        loop {
            if let Some((listener, filter)) = self.take_ready() {
                context.publish_service(listener.clone());
                context.publish_service(filter.clone());
                info!(
                    "Services ready: listener #{} ({}), filter #{} ({})",
                    listener.id, listener.provider, filter.id, filter.provider
                );
                return Ok((listener, filter));
            }

            tokio::select! {
                biased;
                _ = closed.wait_for(|closed| *closed) => {
                    return Err(BootstrapError::BarrierClosed);
                }
                record = listeners.recv() => self.on_event(ServiceKind::Listener, record)?,
                record = filters.recv() => self.on_event(ServiceKind::Filter, record)?,
            }
        }
    }

    fn on_event(&self, kind: ServiceKind, record: Option<ServiceRecord>) -> BootstrapResult<()> {
        let Some(record) = record else {
            if !self.is_closed() {
                warn!("Service discovery stopped delivering {} services", kind);
            }
            return Err(BootstrapError::BarrierClosed);
        };

        let mut trackers = self.lock();
        let state = trackers.get_mut(kind);
        match state {
            TrackerState::Waiting => {
                info!(
                    "Observed {} service #{} from {}",
                    kind, record.id, record.provider
                );
                *state = TrackerState::Observed(record);
                Ok(())
            }
            TrackerState::Observed(first) | TrackerState::Published(first) => {
                info!(
                    "Ignoring additional {} service #{} from {}; keeping #{}",
                    kind, record.id, record.provider, first.id
                );
                Ok(())
            }
            TrackerState::Closed => Err(BootstrapError::BarrierClosed),
        }
    }

    /// Move both trackers to `Published` once both kinds are observed.
    fn take_ready(&self) -> Option<(ServiceRecord, ServiceRecord)> {
        let mut trackers = self.lock();
        let (TrackerState::Observed(listener), TrackerState::Observed(filter)) =
            (&trackers.listener, &trackers.filter)
        else {
            return None;
        };
        let (listener, filter) = (listener.clone(), filter.clone());
        trackers.listener = TrackerState::Published(listener.clone());
        trackers.filter = TrackerState::Published(filter.clone());
        Some((listener, filter))
    }

    /// Stop observing and wake any in-progress wait. Safe to call repeatedly.
    pub fn close(&self) {
        let observations = {
            let mut trackers = self.lock();
            if trackers.closed {
                debug!("Service readiness barrier already closed");
                return;
            }
            trackers.closed = true;
            trackers.listener = TrackerState::Closed;
            trackers.filter = TrackerState::Closed;
            std::mem::take(&mut trackers.observations)
        };

        self.closed.send_replace(true);
        for id in observations {
            self.discovery.stop_observing(id);
        }
        info!("Service readiness barrier closed (scope '{}')", self.scope);
    }
}

impl Drop for ServiceReadinessBarrier {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LocalServiceRegistry;
    use std::time::Duration;

    fn setup() -> (Arc<LocalServiceRegistry>, Arc<ServiceReadinessBarrier>) {
        let registry = Arc::new(LocalServiceRegistry::new());
        let barrier = Arc::new(ServiceReadinessBarrier::new(registry.clone(), "nexus"));
        (registry, barrier)
    }

    #[tokio::test]
    async fn test_services_already_registered() {
        let (registry, barrier) = setup();
        registry.register(ServiceKind::Listener, "nexus", "edition");
        registry.register(ServiceKind::Filter, "nexus", "edition");
        let context = HostContext::new();

        let (listener, filter) = barrier.await_services(&context).await.unwrap();

        assert_eq!(listener.kind, ServiceKind::Listener);
        assert_eq!(filter.kind, ServiceKind::Filter);
        assert_eq!(context.service(ServiceKind::Listener), Some(listener.clone()));
        assert_eq!(context.service(ServiceKind::Filter), Some(filter));
        assert_eq!(
            barrier.state(ServiceKind::Listener),
            TrackerState::Published(listener)
        );
    }

    #[tokio::test]
    async fn test_duplicates_do_not_unblock_and_first_wins() {
        let (registry, barrier) = setup();
        let context = Arc::new(HostContext::new());

        let waiter = {
            let barrier = barrier.clone();
            let context = context.clone();
            tokio::spawn(async move { barrier.await_services(&context).await })
        };

        let first = registry.register(ServiceKind::Listener, "nexus", "first");
        registry.register(ServiceKind::Listener, "nexus", "second");
        // Other scopes are not observed
        registry.register(ServiceKind::Filter, "other", "elsewhere");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        assert_eq!(barrier.state(ServiceKind::Listener), TrackerState::Observed(first.clone()));
        assert_eq!(barrier.state(ServiceKind::Filter), TrackerState::Waiting);
        assert!(context.service(ServiceKind::Listener).is_none());

        let filter = registry.register(ServiceKind::Filter, "nexus", "filter");
        let (listener, published_filter) = waiter.await.unwrap().unwrap();

        assert_eq!(listener, first);
        assert_eq!(published_filter, filter);
        assert_eq!(context.service(ServiceKind::Listener), Some(first));
    }

    #[tokio::test]
    async fn test_close_unblocks_waiter() {
        let (registry, barrier) = setup();
        registry.register(ServiceKind::Listener, "nexus", "edition");
        let context = Arc::new(HostContext::new());

        let waiter = {
            let barrier = barrier.clone();
            let context = context.clone();
            tokio::spawn(async move { barrier.await_services(&context).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        barrier.close();
        let result = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter should wake on close")
            .unwrap();

        assert!(matches!(result, Err(BootstrapError::BarrierClosed)));
        assert_eq!(barrier.state(ServiceKind::Listener), TrackerState::Closed);
        assert_eq!(registry.observer_count(), 0);
        assert!(context.service(ServiceKind::Listener).is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (registry, barrier) = setup();
        registry.register(ServiceKind::Listener, "nexus", "edition");
        registry.register(ServiceKind::Filter, "nexus", "edition");
        barrier.await_services(&HostContext::new()).await.unwrap();
        assert_eq!(registry.observer_count(), 2);

        barrier.close();
        barrier.close();
        assert!(barrier.is_closed());
        assert_eq!(registry.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_after_close_fails_fast() {
        let (_registry, barrier) = setup();
        barrier.close();

        let result = barrier.await_services(&HostContext::new()).await;
        assert!(matches!(result, Err(BootstrapError::BarrierClosed)));
    }
}
