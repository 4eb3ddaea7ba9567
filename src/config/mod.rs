//! Bootstrap configuration.
//!
//! The configuration is a flat property map threaded explicitly through
//! each bootstrap step. Nothing here is a process-wide singleton; the
//! host owns the map and publishes a snapshot once bootstrap completes.

pub mod keys;
pub mod loader;
mod properties;

pub use properties::Properties;
