//! Property keys and well-known values read or written during bootstrap.

/// Installation root of the container.
pub const KARAF_BASE: &str = "karaf.base";
/// Working (data) directory; the edition marker lives directly under it.
pub const KARAF_DATA: &str = "karaf.data";

pub const NEXUS_EDITION: &str = "nexus-edition";
pub const NEXUS_FULL_EDITION: &str = "nexus-full-edition";
pub const NEXUS_FEATURES: &str = "nexus-features";
pub const NEXUS_DB_FEATURE: &str = "nexus-db-feature";
pub const NEXUS_EXCLUDE_FEATURES: &str = "nexus-exclude-features";

pub const DATASTORE_ENABLED: &str = "nexus.datastore.enabled";
pub const DATASTORE_DEVELOPER: &str = "nexus.datastore.developer";
pub const DATASTORE_CLUSTERED_ENABLED: &str = "nexus.datastore.clustered.enabled";
pub const DATASTORE_SEARCH_ENABLED: &str = "nexus.datastore.search.enabled";
pub const ELASTICSEARCH_ENABLED: &str = "nexus.elasticsearch.enabled";
pub const ORIENT_ENABLED: &str = "nexus.orient.enabled";
pub const QUARTZ_JOBSTORE_JDBC: &str = "nexus.quartz.jobstore.jdbc";

pub const SESSION_ENABLED: &str = "nexus.session.enabled";
pub const JWT_ENABLED: &str = "nexus.jwt.enabled";

/// Explicit edition override: `true` forces the baseline edition, `false` keeps pro.
pub const LOAD_AS_OSS: &str = "nexus.loadAsOSS";
pub const CLUSTERED: &str = "nexus.clustered";
pub const LICENSE_FILE: &str = "nexus.licenseFile";

/// Bounded wait for the registry's feature service, in milliseconds.
pub const REGISTRY_TIMEOUT_MS: &str = "nexus.bootstrap.registryTimeoutMs";
/// Scope under which the listener and filter services are observed.
pub const SERVICE_SCOPE: &str = "nexus.bootstrap.serviceScope";

pub const PRO_EDITION: &str = "nexus-pro-edition";
pub const PRO_FEATURE: &str = "nexus-pro-feature";
pub const OSS_EDITION: &str = "nexus-oss-edition";
pub const OSS_FEATURE: &str = "nexus-oss-feature";

pub const ORIENT_FEATURE: &str = "nexus-orient";
pub const MYBATIS_FEATURE: &str = "nexus-datastore-mybatis";
/// Excluded from the baseline edition when running on the datastore.
pub const CMA_FEATURE: &str = "nexus-cma-feature";

pub const DEFAULT_SERVICE_SCOPE: &str = "nexus";
pub const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 1000;
