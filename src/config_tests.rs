// File: config_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#[cfg(test)]
mod tests {
    use crate::config::*;
    use rstest::*;
    use std::path::PathBuf;

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();

        assert_eq!(config.storage_key(), "a11y-scan-history");
        assert_eq!(config.storage_limit(), 5 * 1024 * 1024);
        assert_eq!(config.warning_threshold(), 0.8);
        assert_eq!(config.aggressive_prune_threshold(), 0.95);
        assert_eq!(config.max_scans(), 50);
        assert_eq!(config.prune_ratio(), 0.5);
        assert_eq!(config.backend(), BackendKind::File);
        assert!(config.data_dir().is_none());
    }

    #[test]
    fn test_set_storage_limit() {
        let mut config = StoreConfig::new();
        config.set_storage_limit(1024);
        assert_eq!(config.storage_limit(), 1024);
    }

    #[test]
    fn test_thresholds_are_clamped() {
        let mut config = StoreConfig::new();

        config.set_warning_threshold(1.5);
        assert_eq!(config.warning_threshold(), 1.0);

        config.set_aggressive_prune_threshold(-0.2);
        assert_eq!(config.aggressive_prune_threshold(), 0.0);
    }

    #[test]
    fn test_max_scans_never_zero() {
        let mut config = StoreConfig::new();
        config.set_max_scans(0);
        assert_eq!(config.max_scans(), 1);

        config.set_max_scans(10);
        assert_eq!(config.max_scans(), 10);
    }

    #[test]
    fn test_resolve_data_dir_prefers_explicit_path() {
        let mut config = StoreConfig::new();
        config.set_data_dir(Some(PathBuf::from("/tmp/a11y")));
        assert_eq!(config.resolve_data_dir(), PathBuf::from("/tmp/a11y"));

        config.set_data_dir(None);
        assert!(config.resolve_data_dir().ends_with("a11yhistory"));
    }

    #[rstest]
    #[case("file", Ok(BackendKind::File))]
    #[case("JSON", Ok(BackendKind::File))]
    #[case("sled", Ok(BackendKind::Sled))]
    fn test_backend_kind_parse(#[case] input: &str, #[case] expected: Result<BackendKind, String>) {
        assert_eq!(input.parse::<BackendKind>(), expected);
    }

    #[test]
    fn test_backend_kind_rejects_unknown() {
        assert!("redis".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Sled.to_string(), "sled");
    }
}
