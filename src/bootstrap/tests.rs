//! End-to-end tests for the bootstrap sequence over the in-process host.

#[cfg(test)]
mod tests {
    use crate::bootstrap::{Bootstrap, BootstrapOptions, StepStatus};
    use crate::config::keys;
    use crate::config::Properties;
    use crate::edition::{EditionDecision, EditionMarkerStore, LicensePreferences};
    use crate::error::BootstrapError;
    use crate::host::{FeatureCatalog, HostContext, LocalModuleRegistry, LocalServiceRegistry};
    use crate::services::ServiceKind;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct NoStoredLicense;

    impl LicensePreferences for NoStoredLicense {
        fn has_stored_license(&self) -> bool {
            false
        }
    }

    const CATALOG: &str = r#"{"features":[
        {"id":"nexus-pro-edition","version":"3.23.0","provides":["listener","filter"]},
        {"id":"nexus-oss-edition","version":"3.23.0","provides":["listener","filter"]},
        {"id":"nexus-orient","version":"3.23.0"},
        {"id":"nexus-datastore-mybatis","version":"3.23.0"},
        {"id":"nexus-bare-edition","version":"3.23.0"}
    ]}"#;

    struct Host {
        services: Arc<LocalServiceRegistry>,
        registry: Arc<LocalModuleRegistry>,
        context: Arc<HostContext>,
    }

    impl Host {
        fn new(work_dir: &Path) -> Self {
            let catalog: FeatureCatalog = serde_json::from_str(CATALOG).unwrap();
            let services = Arc::new(LocalServiceRegistry::new());
            let registry = Arc::new(
                LocalModuleRegistry::new(catalog, work_dir, services.clone(), "nexus").unwrap(),
            );
            Self {
                services,
                registry,
                context: Arc::new(HostContext::new()),
            }
        }

        fn bootstrap(&self, options: BootstrapOptions) -> Bootstrap {
            Bootstrap::new(
                self.registry.clone(),
                self.services.clone(),
                Arc::new(NoStoredLicense),
                self.context.clone(),
                options,
            )
        }
    }

    fn base_properties(work_dir: &Path, edition: &str, features: &str) -> Properties {
        [
            (keys::KARAF_DATA, work_dir.to_string_lossy().to_string()),
            (keys::NEXUS_EDITION, edition.to_string()),
            (keys::NEXUS_FEATURES, features.to_string()),
            (keys::NEXUS_DB_FEATURE, keys::ORIENT_FEATURE.to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_full_startup_with_license_keeps_pro() {
        let tmp = TempDir::new().unwrap();
        let host = Host::new(tmp.path());
        host.registry.start();

        let mut props = base_properties(tmp.path(), keys::PRO_EDITION, keys::PRO_FEATURE);
        props.set(keys::LICENSE_FILE, "/etc/nexus.lic");

        let mut bootstrap = host.bootstrap(BootstrapOptions::default());
        let state = bootstrap.run(&mut props).await.unwrap();

        assert_eq!(state.edition, EditionDecision::KeptPro);
        assert!(EditionMarkerStore::new(&state.work_dir).exists());
        let install = state.install.unwrap();
        assert_eq!(install.requested, vec!["nexus-pro-edition", "nexus-orient"]);
        assert_eq!(props.get(keys::NEXUS_FULL_EDITION), Some("nexus-pro-edition/3.23.0"));
        assert_eq!(state.listener.provider, "nexus-pro-edition");

        let published = host.context.properties().unwrap();
        assert_eq!(published.get(keys::NEXUS_DB_FEATURE), Some(keys::ORIENT_FEATURE));
        assert!(host.context.service(ServiceKind::Listener).is_some());
        assert!(host.context.service(ServiceKind::Filter).is_some());

        assert!(bootstrap.config_status().is_success());
        assert!(bootstrap.edition_status().is_success());
        assert!(bootstrap.features_status().is_success());
        assert!(bootstrap.services_status().is_success());
    }

    #[tokio::test]
    async fn test_unlicensed_datastore_startup_downgrades() {
        let tmp = TempDir::new().unwrap();
        let host = Host::new(tmp.path());
        host.registry.start();

        let mut props = base_properties(tmp.path(), keys::PRO_EDITION, keys::PRO_FEATURE);
        props.set(keys::DATASTORE_ENABLED, "true");

        let state = host
            .bootstrap(BootstrapOptions::default())
            .run(&mut props)
            .await
            .unwrap();

        assert_eq!(state.edition, EditionDecision::Downgraded);
        assert_eq!(props.get(keys::NEXUS_EDITION), Some(keys::OSS_EDITION));
        assert_eq!(props.get(keys::NEXUS_FEATURES), Some(keys::OSS_FEATURE));
        assert_eq!(props.get(keys::NEXUS_DB_FEATURE), Some(keys::MYBATIS_FEATURE));
        // The re-applied cascade sees the baseline edition
        assert_eq!(props.get(keys::NEXUS_EXCLUDE_FEATURES), Some("nexus-cma-feature,"));
        assert!(!EditionMarkerStore::new(&state.work_dir).exists());
    }

    #[tokio::test]
    async fn test_second_startup_installs_nothing() {
        let tmp = TempDir::new().unwrap();

        for round in 0..2 {
            let host = Host::new(tmp.path());
            host.registry.start();
            let mut props = base_properties(tmp.path(), keys::OSS_EDITION, keys::OSS_FEATURE);

            let state = host
                .bootstrap(BootstrapOptions::default())
                .run(&mut props)
                .await
                .unwrap();

            let install = state.install.unwrap();
            if round == 0 {
                assert_eq!(install.requested.len(), 2);
            } else {
                assert!(install.was_noop());
            }
        }
    }

    #[tokio::test]
    async fn test_missing_required_key_fails_before_anything_runs() {
        let tmp = TempDir::new().unwrap();
        let host = Host::new(tmp.path());
        let mut props = base_properties(tmp.path(), keys::PRO_EDITION, keys::PRO_FEATURE);
        let mut without_db: Properties = props
            .iter()
            .filter(|(k, _)| *k != keys::NEXUS_DB_FEATURE)
            .collect();

        let mut bootstrap = host.bootstrap(BootstrapOptions::default());
        let err = bootstrap.run(&mut without_db).await.unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::MissingConfiguration { ref key } if key == keys::NEXUS_DB_FEATURE
        ));
        assert!(matches!(bootstrap.config_status(), StepStatus::Failed(_)));
        assert_eq!(*bootstrap.edition_status(), StepStatus::NotStarted);
        // No cascade output, no marker
        assert!(!without_db.contains(keys::SESSION_ENABLED));
        assert!(!EditionMarkerStore::new(tmp.path()).exists());

        props = props.iter().filter(|(k, _)| *k != keys::KARAF_DATA).collect();
        let err = bootstrap.run(&mut props).await.unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::MissingConfiguration { ref key } if key == keys::KARAF_DATA
        ));
    }

    #[tokio::test]
    async fn test_registry_not_started_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let host = Host::new(tmp.path());
        let mut props = base_properties(tmp.path(), keys::OSS_EDITION, keys::OSS_FEATURE);

        let mut bootstrap = host.bootstrap(BootstrapOptions {
            registry_timeout: Duration::from_millis(50),
            ..BootstrapOptions::default()
        });
        let err = bootstrap.run(&mut props).await.unwrap_err();

        assert!(matches!(err, BootstrapError::RegistryUnavailable { .. }));
        assert!(matches!(bootstrap.features_status(), StepStatus::Failed(_)));
        assert!(host.context.properties().is_none());
    }

    #[tokio::test]
    async fn test_unknown_edition_feature() {
        let tmp = TempDir::new().unwrap();
        let host = Host::new(tmp.path());
        host.registry.start();
        let mut props = base_properties(tmp.path(), "nexus-community-edition", "");

        let err = host
            .bootstrap(BootstrapOptions::default())
            .run(&mut props)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::UnknownFeature { ref id } if id == "nexus-community-edition"
        ));
    }

    #[tokio::test]
    async fn test_shutdown_unblocks_startup_without_services() {
        let tmp = TempDir::new().unwrap();
        let host = Host::new(tmp.path());
        host.registry.start();
        // This edition registers no services, so startup would block forever
        let mut props = base_properties(tmp.path(), "nexus-bare-edition", "");

        let mut bootstrap = host.bootstrap(BootstrapOptions::default());
        let barrier = bootstrap.barrier();
        let closer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            barrier.close();
        });

        let err = bootstrap.run(&mut props).await.unwrap_err();
        closer.await.unwrap();

        assert!(matches!(err, BootstrapError::BarrierClosed));
        assert!(matches!(bootstrap.services_status(), StepStatus::Failed(_)));
        // Properties were published before the wait began
        assert!(host.context.properties().is_some());

        bootstrap.shutdown();
        bootstrap.shutdown();
    }
}
