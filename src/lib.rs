//! Bootstrap orchestrator for a modular repository-manager runtime.
//!
//! Resolves raw configuration flags into a consistent feature selection,
//! selects the edition once per installation, installs the missing
//! features into the module registry, and holds startup until the
//! listener and filter services are registered.

pub mod bootstrap;
pub mod cascade;
pub mod config;
pub mod edition;
pub mod error;
pub mod host;
pub mod install;
pub mod registry;
pub mod services;

pub use bootstrap::{Bootstrap, BootstrapOptions, BootstrapState};
pub use config::Properties;
pub use error::{BootstrapError, BootstrapResult};
