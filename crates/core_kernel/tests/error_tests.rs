//! Tests for kernel and port errors

use core_kernel::{AdapterHealth, CoreError, HealthCheckResult, MoneyError, PortError, TemporalError};

#[test]
fn test_core_error_wraps_sources() {
    let err: CoreError = MoneyError::UnknownCurrency("XYZ".to_string()).into();
    assert!(matches!(err, CoreError::Money(_)));
    assert!(err.to_string().contains("XYZ"));

    let err: CoreError = TemporalError::InvalidMonth(13).into();
    assert!(matches!(err, CoreError::Temporal(_)));
}

#[test]
fn test_core_error_constructors() {
    assert_eq!(
        CoreError::validation("bad").to_string(),
        "Validation error: bad"
    );
    assert_eq!(
        CoreError::configuration("missing secret").to_string(),
        "Configuration error: missing secret"
    );
}

#[test]
fn test_port_error_classification() {
    assert!(PortError::connection("refused").is_transient());
    assert!(PortError::conflict("stale").is_transient());
    assert!(!PortError::internal("bug").is_transient());
    assert!(!PortError::not_found("Claim", 1).is_transient());
    assert!(PortError::not_found("Claim", 1).is_not_found());
}

#[test]
fn test_validation_field_is_kept() {
    match PortError::validation_field("must be positive", "hours_worked") {
        PortError::Validation { message, field } => {
            assert_eq!(message, "must be positive");
            assert_eq!(field.as_deref(), Some("hours_worked"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_healthy_result() {
    let result = HealthCheckResult::healthy("memory-claim-store");
    assert_eq!(result.status, AdapterHealth::Healthy);
    assert_eq!(result.adapter_id, "memory-claim-store");
    assert!(result.message.is_none());
}
