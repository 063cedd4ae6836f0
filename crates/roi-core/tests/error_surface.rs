use roi_core::{ErrorInfo, RoiError};

#[test]
fn error_display_includes_context_and_hint() {
    let info = ErrorInfo::new("region_missing", "region missing from stats file")
        .with_context("region", "49")
        .with_context("subject", "S1")
        .with_hint("re-run the extraction for this subject");
    let err = RoiError::Extraction(info);
    let text = err.to_string();
    assert!(text.starts_with("extraction error: region missing from stats file"));
    assert!(text.contains("region=49"));
    assert!(text.contains("subject=S1"));
    assert!(text.contains("hint: re-run the extraction"));
}

#[test]
fn missing_and_unexpected_fields_are_config_errors() {
    let missing = RoiError::missing_field("fname");
    assert!(matches!(missing, RoiError::Config(_)));
    assert_eq!(missing.info().message, "missing field");

    let unexpected = RoiError::unexpected_field("colour");
    assert!(matches!(unexpected, RoiError::Config(_)));
    assert_eq!(unexpected.info().message, "unexpected field");
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = RoiError::init_required("paradigm");
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "Init");
    assert_eq!(json["detail"]["message"], "paradigm is not initialized");
    let back: RoiError = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, err);
}

#[test]
fn context_can_be_attached_after_construction() {
    let err = RoiError::missing_field("regions").with_context("atlas", "aseg");
    assert_eq!(err.info().context.get("atlas").map(String::as_str), Some("aseg"));
    assert_eq!(err.info().context.get("field").map(String::as_str), Some("regions"));
}
