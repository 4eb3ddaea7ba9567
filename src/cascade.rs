//! Configuration cascade.
//!
//! Normalizes raw feature flags into a consistent selection. Three
//! sub-cascades run in a fixed order:
//!
//! 1. storage engine: datastore vs. the embedded orient database
//! 2. database feature: which registry feature provides persistence
//! 3. authentication: session vs. JWT
//!
//! The cascade is pure (no I/O) and idempotent: applying it to its own
//! output changes nothing.

use tracing::debug;

use crate::config::keys;
use crate::config::Properties;

/// Apply all three sub-cascades in order.
pub fn apply(properties: &mut Properties) {
    select_datastore_feature(properties);
    select_db_feature(properties);
    select_authentication_feature(properties);

    debug!(
        "Cascade resolved: db-feature={}, datastore={}, orient={}, session={}",
        properties.get_or(keys::NEXUS_DB_FEATURE, ""),
        properties.get_or(keys::DATASTORE_ENABLED, "false"),
        properties.get_or(keys::ORIENT_ENABLED, "true"),
        properties.get_or(keys::SESSION_ENABLED, "true"),
    );
}

fn select_datastore_feature(properties: &mut Properties) {
    if properties.get_bool(keys::DATASTORE_DEVELOPER, false) {
        properties.set_bool(keys::DATASTORE_ENABLED, true);
    }

    if properties.get_bool(keys::DATASTORE_CLUSTERED_ENABLED, false) {
        properties.set_bool(keys::DATASTORE_ENABLED, true);
    }

    if properties.get_bool(keys::DATASTORE_SEARCH_ENABLED, false) {
        properties.set_bool(keys::DATASTORE_ENABLED, true);
        properties.set_bool(keys::ELASTICSEARCH_ENABLED, false);
    }

    if properties.get_bool(keys::ELASTICSEARCH_ENABLED, false) {
        properties.set_bool(keys::DATASTORE_SEARCH_ENABLED, false);
    }

    if properties.get_bool(keys::DATASTORE_ENABLED, false) {
        // Orient and the datastore are mutually exclusive.
        properties.set_bool(keys::ORIENT_ENABLED, false);

        materialize_exclusions(properties);
    }
}

fn select_db_feature(properties: &mut Properties) {
    if properties.get_bool(keys::ORIENT_ENABLED, true) {
        properties.set(keys::NEXUS_DB_FEATURE, keys::ORIENT_FEATURE);
        properties.set_bool(keys::ORIENT_ENABLED, true);
        return;
    }

    properties.set(keys::NEXUS_DB_FEATURE, keys::MYBATIS_FEATURE);
    properties.set_bool(keys::DATASTORE_ENABLED, true);
    properties.set_bool(keys::QUARTZ_JOBSTORE_JDBC, true);
    // The datastore was only switched on here, so the storage step above
    // did not see it yet.
    materialize_exclusions(properties);

    if properties.get(keys::NEXUS_EDITION) == Some(keys::OSS_EDITION) {
        let excluded = properties.get_or(keys::NEXUS_EXCLUDE_FEATURES, "");
        if !is_listed(excluded, keys::CMA_FEATURE) {
            let prepended = format!("{},{}", keys::CMA_FEATURE, excluded);
            properties.set(keys::NEXUS_EXCLUDE_FEATURES, prepended);
        }
    }
}

/// Outside developer mode the exclusion list is re-assigned to itself:
/// the key materializes (possibly empty) and no exclusion is added.
fn materialize_exclusions(properties: &mut Properties) {
    if properties.get_bool(keys::DATASTORE_DEVELOPER, false) {
        return;
    }
    let excluded = properties.get_or(keys::NEXUS_EXCLUDE_FEATURES, "").to_string();
    properties.set(keys::NEXUS_EXCLUDE_FEATURES, excluded);
}

fn select_authentication_feature(properties: &mut Properties) {
    if properties.get_bool(keys::SESSION_ENABLED, true) {
        properties.set_bool(keys::SESSION_ENABLED, true);
    }

    // JWT wins over sessions.
    if properties.get_bool(keys::JWT_ENABLED, false) {
        properties.set_bool(keys::SESSION_ENABLED, false);
    }
}

fn is_listed(list: &str, id: &str) -> bool {
    list.split(',').any(|item| item.trim() == id)
}
