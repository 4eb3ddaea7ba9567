//! Host-side collaborators: the shared attribute space and the in-process
//! registries the binary runs the bootstrap against.

mod context;
mod registry;
mod services;

pub use context::{Attribute, HostContext, PROPERTIES_ATTRIBUTE};
pub use registry::{CatalogEntry, FeatureCatalog, LocalModuleRegistry, INSTALLED_STATE_FILE};
pub use services::LocalServiceRegistry;
