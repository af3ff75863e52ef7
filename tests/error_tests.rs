use std::error::Error;
use std::io;
use std::time::Duration;

use staff_chat::ChatError;

// Test ChatError display implementation
#[test]
fn test_chat_error_display() {
    let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused");
    let err = ChatError::IoError(io_err);
    assert_eq!(format!("{}", err), "I/O error: Connection refused");

    let err = ChatError::ConnectTimeout {
        endpoint: "192.168.2.101:5555".to_string(),
        timeout: Duration::from_secs(3),
    };
    assert_eq!(
        format!("{}", err),
        "Connection to 192.168.2.101:5555 timed out after 3s"
    );

    let err = ChatError::LineTooLong(16);
    assert_eq!(
        format!("{}", err),
        "Line exceeds maximum length of 16 bytes"
    );

    let err = ChatError::NoCandidates;
    assert_eq!(format!("{}", err), "No host candidates configured");
}

#[test]
fn test_describe_prefixes_kind() {
    let err = ChatError::WriterUnavailable;
    assert_eq!(err.describe(), "WriterUnavailable: Writer not available");

    let inner = ChatError::IoError(io::Error::new(io::ErrorKind::Other, "boom"));
    let err = ChatError::Unreachable(Box::new(inner));
    assert_eq!(err.kind(), "Unreachable");
    assert!(err.describe().starts_with("Unreachable: "));
    assert!(err.describe().contains("boom"));
}

#[test]
fn test_connect_failure_classification() {
    assert!(ChatError::NoCandidates.is_connect_failure());
    assert!(ChatError::ConnectTimeout {
        endpoint: "h:1".to_string(),
        timeout: Duration::from_millis(1),
    }
    .is_connect_failure());
    assert!(!ChatError::LineTooLong(1).is_connect_failure());
    assert!(!ChatError::WriterUnavailable.is_connect_failure());
}

// Test ChatError implements Error trait
#[test]
fn test_chat_error_trait() {
    let err = ChatError::InvalidConfig("Test error".to_string());

    fn takes_error(_: &dyn Error) {}
    takes_error(&err);
}

// Test conversions to ChatError
#[test]
fn test_chat_error_conversions() {
    let io_err = io::Error::new(io::ErrorKind::Other, "Test IO error");
    let err: ChatError = io_err.into();
    match err {
        ChatError::IoError(_) => {} // Success
        _ => panic!("Expected IoError variant"),
    }
}
