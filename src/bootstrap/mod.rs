//! Startup orchestration.
//!
//! Brings the runtime into a consistent state from raw configuration:
//! - resolve feature flags into one consistent selection
//! - decide the edition once per installation and persist the decision
//! - install the edition and database features the registry is missing
//! - hold startup until the listener and filter services are registered
//!
//! Fail-fast: any fatal step aborts startup with a single error. Restart is
//! the only recovery path.

mod sequence;
#[cfg(test)]
mod tests;

pub use sequence::{Bootstrap, BootstrapOptions, BootstrapState, StepStatus};
