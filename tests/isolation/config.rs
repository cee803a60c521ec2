//! Sources opened from TOML configuration

use crate::common::*;
use std::io::Write;

#[test]
fn options_loaded_from_file_drive_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
reconciliation = "corrected"
capabilities = [
  {{ kind = "use_provided_fid" }},
  {{ kind = "sort_by", attribute = "area" }},
]
"#
    )
    .unwrap();

    let ts = TestStore::new();
    let options = SourceOptions::load(file.path()).unwrap();
    let source = ts.source_with(options);

    assert_eq!(source.options().reconciliation, ReconciliationMode::Corrected);
    assert!(source.capabilities().is_use_provided_fid_supported());
    assert!(source.capabilities().supports_sorting(&[SortBy::asc("area")]));
    assert!(!source.capabilities().supports_sorting(&[SortBy::asc("zone")]));
    assert_eq!(
        source.supported_capabilities(),
        vec![
            SourceCapability::UseProvidedFid,
            SourceCapability::SortBy {
                attribute: "area".into()
            },
        ]
    );
}

#[test]
fn unknown_sort_attribute_fails_open() {
    let ts = TestStore::new();
    let options = SourceOptions::from_toml_str(
        r#"capabilities = [{ kind = "sort_by", attribute = "owner" }]"#,
    )
    .unwrap();

    let err = FeatureSource::open(ts.store.clone(), TYPE, options).unwrap_err();
    assert!(matches!(err, StrataError::Config(_)));
}
