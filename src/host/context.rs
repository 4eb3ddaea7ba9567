//! Shared attribute space of the host process.
//!
//! Bootstrap publishes the resolved properties and the two awaited
//! services here; request handling reads them after startup.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::Properties;
use crate::services::{ServiceKind, ServiceRecord};

/// Attribute key for the resolved property snapshot.
pub const PROPERTIES_ATTRIBUTE: &str = "nexus.properties";

/// A value stored in the host context.
#[derive(Debug, Clone)]
pub enum Attribute {
    Properties(Arc<Properties>),
    Service(ServiceRecord),
}

/// Host attribute space, shared between bootstrap and the rest of the process.
#[derive(Debug, Default)]
pub struct HostContext {
    attributes: RwLock<HashMap<String, Attribute>>,
}

impl HostContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&self, key: impl Into<String>, value: Attribute) {
        self.attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    pub fn attribute(&self, key: &str) -> Option<Attribute> {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Publish a read-only snapshot of the resolved properties.
    pub fn publish_properties(&self, properties: &Properties) {
        self.set_attribute(
            PROPERTIES_ATTRIBUTE,
            Attribute::Properties(Arc::new(properties.clone())),
        );
    }

    pub fn properties(&self) -> Option<Arc<Properties>> {
        match self.attribute(PROPERTIES_ATTRIBUTE)? {
            Attribute::Properties(props) => Some(props),
            _ => None,
        }
    }

    pub fn publish_service(&self, record: ServiceRecord) {
        self.set_attribute(record.kind.attribute_key(), Attribute::Service(record));
    }

    pub fn service(&self, kind: ServiceKind) -> Option<ServiceRecord> {
        match self.attribute(kind.attribute_key())? {
            Attribute::Service(record) => Some(record),
            _ => None,
        }
    }
}
