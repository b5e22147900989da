use super::*;

#[test]
fn test_groups() {
    for raw in ["pending", "queued"] {
        assert_eq!(JobStatus::parse(raw).group(), StatusGroup::Queued, "{raw}");
    }
    for raw in ["generating", "processing", "in_progress", "working"] {
        assert_eq!(JobStatus::parse(raw).group(), StatusGroup::Active, "{raw}");
    }
    assert_eq!(JobStatus::parse("completed").group(), StatusGroup::Succeeded);
    for raw in [
        "failed",
        "not_found",
        "timeout",
        "connection_error",
        "api_error",
        "unknown_error",
        "unknown",
        "limit_exceeded",
    ] {
        let status = JobStatus::parse(raw);
        assert_eq!(status.group(), StatusGroup::Failed, "{raw}");
        assert!(status.is_terminal());
    }
}

#[test]
fn test_parse_is_case_insensitive() {
    assert_eq!(JobStatus::parse("Generating"), JobStatus::Generating);
    assert_eq!(JobStatus::parse(" COMPLETED "), JobStatus::Completed);
}

#[test]
fn test_unrecognized_keeps_raw_value() {
    let status = JobStatus::parse("rendering_frames");
    assert_eq!(status, JobStatus::Other("rendering_frames".to_string()));
    assert_eq!(status.group(), StatusGroup::Unrecognized);
    assert!(!status.is_terminal());
    assert_eq!(status.as_str(), "rendering_frames");
}

#[test]
fn test_serde_uses_wire_strings() {
    let json = serde_json::to_string(&JobStatus::InProgress).unwrap();
    assert_eq!(json, "\"in_progress\"");

    let status: JobStatus = serde_json::from_str("\"limit_exceeded\"").unwrap();
    assert_eq!(status, JobStatus::LimitExceeded);
}

#[test]
fn test_labels_are_specific() {
    assert_eq!(JobStatus::NotFound.label(), "video not found");
    assert_ne!(JobStatus::Timeout.label(), JobStatus::ApiError.label());
    assert!(!JobStatus::Other(String::new()).label().is_empty());
}
