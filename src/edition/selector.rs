//! Edition selection: keep the pro edition or fall back to the baseline edition.
//!
//! The decision is made once per installation. Keeping pro writes the
//! edition marker, and an existing marker pins every later startup to pro
//! unless the explicit override says otherwise.

use std::path::Path;

use tracing::{error, info};

use super::marker::EditionMarkerStore;
use super::preferences::LicensePreferences;
use crate::config::keys;
use crate::config::Properties;

/// Inputs to the downgrade decision, gathered from configuration and storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DowngradeSignals {
    /// Explicit `nexus.loadAsOSS` value, if the key is present.
    pub load_as_oss_override: Option<bool>,
    /// The pro edition marker already exists.
    pub marker_exists: bool,
    /// The node is configured as part of a cluster.
    pub clustered: bool,
    /// A license file path is configured.
    pub license_file_configured: bool,
    /// A license is stored in the user preferences.
    pub stored_license_present: bool,
}

/// Decide whether to fall back to the baseline edition.
///
/// Priority: explicit override, then marker, then cluster membership,
/// then license presence.
pub fn should_downgrade(signals: &DowngradeSignals) -> bool {
    if let Some(load_as_oss) = signals.load_as_oss_override {
        return load_as_oss;
    }
    if signals.marker_exists {
        return false;
    }
    if signals.clustered {
        return false;
    }
    !signals.license_file_configured && !signals.stored_license_present
}

/// Outcome of edition selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditionDecision {
    /// No pro feature requested; nothing was changed.
    NotApplicable,
    /// Pro was kept and the marker is in place.
    KeptPro,
    /// Pro was kept but the marker could not be written.
    KeptProWithoutMarker,
    /// Edition and feature list were rewritten to the baseline edition.
    Downgraded,
}

impl EditionDecision {
    pub fn is_downgraded(&self) -> bool {
        matches!(self, EditionDecision::Downgraded)
    }
}

/// Selects the edition for this startup.
pub struct EditionSelector<'a> {
    preferences: &'a dyn LicensePreferences,
}

impl<'a> EditionSelector<'a> {
    pub fn new(preferences: &'a dyn LicensePreferences) -> Self {
        Self { preferences }
    }

    /// Select the edition, rewriting `properties` in place.
    ///
    /// Never fails: a marker that cannot be written is logged and ignored.
    pub fn select_edition(&self, properties: &mut Properties, work_dir: &Path) -> EditionDecision {
        if !has_pro_feature(properties) {
            return EditionDecision::NotApplicable;
        }

        let marker = EditionMarkerStore::new(work_dir);
        let signals = self.gather_signals(properties, &marker);

        if should_downgrade(&signals) {
            adjust_edition_properties(properties);
            return EditionDecision::Downgraded;
        }

        match marker.ensure() {
            Ok(_) => EditionDecision::KeptPro,
            Err(e) => {
                error!("{}: {}", e, e.source);
                EditionDecision::KeptProWithoutMarker
            }
        }
    }

    fn gather_signals(
        &self,
        properties: &Properties,
        marker: &EditionMarkerStore,
    ) -> DowngradeSignals {
        let load_as_oss_override = properties
            .contains(keys::LOAD_AS_OSS)
            .then(|| properties.get_bool(keys::LOAD_AS_OSS, false));
        let marker_exists = marker.exists();
        let clustered = properties.get_bool(keys::CLUSTERED, false);
        let license_file_configured = properties.contains(keys::LICENSE_FILE);

        // Lazily consulted: only reached when every earlier signal is neutral.
        let stored_license_present = load_as_oss_override.is_none()
            && !marker_exists
            && !clustered
            && !license_file_configured
            && self.preferences.has_stored_license();

        DowngradeSignals {
            load_as_oss_override,
            marker_exists,
            clustered,
            license_file_configured,
            stored_license_present,
        }
    }
}

fn has_pro_feature(properties: &Properties) -> bool {
    properties
        .get_or(keys::NEXUS_FEATURES, "")
        .contains(keys::PRO_FEATURE)
}

fn adjust_edition_properties(properties: &mut Properties) {
    info!("Loading OSS Edition");
    properties.set(keys::NEXUS_EDITION, keys::OSS_EDITION);
    let features = properties
        .get_or(keys::NEXUS_FEATURES, "")
        .replace(keys::PRO_FEATURE, keys::OSS_FEATURE);
    properties.set(keys::NEXUS_FEATURES, features);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FixedPreferences(bool);

    impl LicensePreferences for FixedPreferences {
        fn has_stored_license(&self) -> bool {
            self.0
        }
    }

    fn signals(
        load_as_oss_override: Option<bool>,
        marker_exists: bool,
        clustered: bool,
        license_file_configured: bool,
        stored_license_present: bool,
    ) -> DowngradeSignals {
        DowngradeSignals {
            load_as_oss_override,
            marker_exists,
            clustered,
            license_file_configured,
            stored_license_present,
        }
    }

    #[test]
    fn test_override_wins_over_everything() {
        assert!(should_downgrade(&signals(Some(true), true, true, true, true)));
        assert!(!should_downgrade(&signals(Some(false), false, false, false, false)));
    }

    #[test]
    fn test_marker_prevents_downgrade() {
        for clustered in [false, true] {
            for file in [false, true] {
                for stored in [false, true] {
                    assert!(!should_downgrade(&signals(None, true, clustered, file, stored)));
                }
            }
        }
    }

    #[test]
    fn test_cluster_prevents_downgrade() {
        assert!(!should_downgrade(&signals(None, false, true, false, false)));
    }

    #[test]
    fn test_license_presence_decides() {
        assert!(should_downgrade(&signals(None, false, false, false, false)));
        assert!(!should_downgrade(&signals(None, false, false, true, false)));
        assert!(!should_downgrade(&signals(None, false, false, false, true)));
    }

    fn pro_properties() -> Properties {
        [
            (keys::NEXUS_EDITION, keys::PRO_EDITION),
            (keys::NEXUS_FEATURES, "nexus-pro-feature,nexus-extra"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_downgrade_rewrites_edition_and_features() {
        let tmp = tempdir().unwrap();
        let prefs = FixedPreferences(false);
        let mut props = pro_properties();

        let decision = EditionSelector::new(&prefs).select_edition(&mut props, tmp.path());

        assert_eq!(decision, EditionDecision::Downgraded);
        assert_eq!(props.get(keys::NEXUS_EDITION), Some(keys::OSS_EDITION));
        assert_eq!(props.get(keys::NEXUS_FEATURES), Some("nexus-oss-feature,nexus-extra"));
        assert!(!EditionMarkerStore::new(tmp.path()).exists());
    }

    #[test]
    fn test_keep_pro_writes_marker_and_pins_later_startups() {
        let tmp = tempdir().unwrap();
        let mut props = pro_properties();
        props.set(keys::LICENSE_FILE, "/etc/nexus.lic");

        let decision =
            EditionSelector::new(&FixedPreferences(false)).select_edition(&mut props, tmp.path());
        assert_eq!(decision, EditionDecision::KeptPro);
        assert!(EditionMarkerStore::new(tmp.path()).exists());

        // License removed later: the marker still keeps pro
        let mut props = pro_properties();
        let decision =
            EditionSelector::new(&FixedPreferences(false)).select_edition(&mut props, tmp.path());
        assert_eq!(decision, EditionDecision::KeptPro);
        assert_eq!(props.get(keys::NEXUS_EDITION), Some(keys::PRO_EDITION));
    }

    #[test]
    fn test_override_forces_downgrade_despite_marker() {
        let tmp = tempdir().unwrap();
        EditionMarkerStore::new(tmp.path()).ensure().unwrap();

        let mut props = pro_properties();
        props.set(keys::LOAD_AS_OSS, "true");
        let decision =
            EditionSelector::new(&FixedPreferences(true)).select_edition(&mut props, tmp.path());

        assert_eq!(decision, EditionDecision::Downgraded);
        // Marker is never deleted
        assert!(EditionMarkerStore::new(tmp.path()).exists());
    }

    #[test]
    fn test_marker_failure_is_not_fatal() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("missing");
        let mut props = pro_properties();
        props.set(keys::CLUSTERED, "true");

        let decision =
            EditionSelector::new(&FixedPreferences(false)).select_edition(&mut props, &missing);

        assert_eq!(decision, EditionDecision::KeptProWithoutMarker);
        assert_eq!(props.get(keys::NEXUS_EDITION), Some(keys::PRO_EDITION));
    }

    #[test]
    fn test_without_pro_feature_nothing_changes() {
        let tmp = tempdir().unwrap();
        let mut props: Properties = [
            (keys::NEXUS_EDITION, keys::OSS_EDITION),
            (keys::NEXUS_FEATURES, keys::OSS_FEATURE),
        ]
        .into_iter()
        .collect();
        let before = props.clone();

        let decision =
            EditionSelector::new(&FixedPreferences(false)).select_edition(&mut props, tmp.path());

        assert_eq!(decision, EditionDecision::NotApplicable);
        assert_eq!(props, before);
        assert!(!EditionMarkerStore::new(tmp.path()).exists());
    }
}
