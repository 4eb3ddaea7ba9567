//! Edition selection and its persisted marker.

mod marker;
mod preferences;
mod selector;

pub use marker::{EditionMarkerStore, EDITION_PRO_MARKER};
pub use preferences::{FilePreferenceStore, LicensePreferences};
pub use selector::{should_downgrade, DowngradeSignals, EditionDecision, EditionSelector};
