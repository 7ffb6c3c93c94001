use std::error::Error;
use std::time::Duration;

use clinicsched_core::errors::{ScheduleError, ScheduleResult};

#[test]
fn test_schedule_error_display() {
    let validation = ScheduleError::Validation("price must be a number".to_string());
    let not_found = ScheduleError::NotFound("operating hours for Mon".to_string());
    let conflict = ScheduleError::EditConflict("Tue has unsaved changes".to_string());
    let sync = ScheduleError::Sync(eyre::eyre!("service returned 503"));
    let timeout = ScheduleError::Timeout(Duration::from_secs(5));

    assert_eq!(
        validation.to_string(),
        "Validation error: price must be a number"
    );
    assert_eq!(
        not_found.to_string(),
        "Resource not found: operating hours for Mon"
    );
    assert_eq!(
        conflict.to_string(),
        "Edit conflict: Tue has unsaved changes"
    );
    assert!(sync.to_string().contains("service returned 503"));
    assert_eq!(timeout.to_string(), "Request timed out after 5s");
    assert_eq!(ScheduleError::Cancelled.to_string(), "Request cancelled");
}

#[test]
fn test_retryable_errors() {
    assert!(ScheduleError::Sync(eyre::eyre!("connection reset")).is_retryable());
    assert!(ScheduleError::Timeout(Duration::from_millis(100)).is_retryable());
    assert!(ScheduleError::Cancelled.is_retryable());
    assert!(!ScheduleError::Validation("bad".to_string()).is_retryable());
    assert!(!ScheduleError::EditConflict("busy".to_string()).is_retryable());
}

#[test]
fn test_from_eyre_report() {
    fn fails() -> ScheduleResult<()> {
        Err(eyre::eyre!("malformed response").into())
    }

    let err = fails().unwrap_err();
    assert!(matches!(err, ScheduleError::Sync(_)));
    assert!(err.to_string().contains("malformed response"));
    assert!(err.source().is_some());
}
