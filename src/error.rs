//! Domain error taxonomy and its wire mappings.
//!
//! Every domain-facing boundary speaks [`DomainError`]. Transports translate
//! at their edge:
//!
//! | Domain            | gRPC               | HTTP |
//! |-------------------|--------------------|------|
//! | `InvalidArgument` | `INVALID_ARGUMENT` | 400  |
//! | `NotFound`        | `NOT_FOUND`        | 404  |
//! | `Internal`        | `INTERNAL`         | 500  |
//!
//! Anything a client cannot classify (other status codes, connection
//! failures) comes back as `Internal`. The message carried by each variant is
//! for logs only; wire representations carry the canonical kind text.

use http::StatusCode;
use serde::Serialize;
use tonic::{Code, Status};

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Canonical text for [`DomainError::InvalidArgument`] on the wire.
pub const INVALID_ARGUMENT_TEXT: &str = "invalid argument";
/// Canonical text for [`DomainError::NotFound`] on the wire.
pub const NOT_FOUND_TEXT: &str = "not found";
/// Canonical text for [`DomainError::Internal`] on the wire.
pub const INTERNAL_TEXT: &str = "internal error";

/// Closed set of errors that cross domain boundaries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// The caller supplied bad input: coordinates, time range, malformed username.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The system failed to serve a valid request.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        DomainError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }

    /// Returns true for errors caused by the request itself.
    ///
    /// Caller-fault errors are never retried and never count against a
    /// circuit breaker.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidArgument(_) | DomainError::NotFound(_)
        )
    }

    /// Returns true for `Internal`.
    pub fn is_internal(&self) -> bool {
        matches!(self, DomainError::Internal(_))
    }

    /// Detail-free text safe to put on the wire.
    pub fn canonical_text(&self) -> &'static str {
        match self {
            DomainError::InvalidArgument(_) => INVALID_ARGUMENT_TEXT,
            DomainError::NotFound(_) => NOT_FOUND_TEXT,
            DomainError::Internal(_) => INTERNAL_TEXT,
        }
    }

    /// The gRPC code this error maps to.
    pub fn code(&self) -> Code {
        match self {
            DomainError::InvalidArgument(_) => Code::InvalidArgument,
            DomainError::NotFound(_) => Code::NotFound,
            DomainError::Internal(_) => Code::Internal,
        }
    }

    /// The HTTP status this error maps to.
    pub fn http_status(&self) -> StatusCode {
        match self {
            DomainError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Decides whether an error counts as a success for breaker and retrier
/// bookkeeping. `true` means "the dependency is healthy, do not retry".
pub type SuccessClassifier = std::sync::Arc<dyn Fn(&DomainError) -> bool + Send + Sync>;

/// Default success classifier for breaker and retrier bookkeeping.
///
/// Only `Internal` indicates an unhealthy dependency.
pub fn is_successful(err: &DomainError) -> bool {
    !err.is_internal()
}

/// Server side: domain error to gRPC status.
pub fn to_status(err: &DomainError) -> Status {
    Status::new(err.code(), err.canonical_text())
}

/// Client side: gRPC status to domain error.
pub fn from_status(status: &Status) -> DomainError {
    match status.code() {
        Code::InvalidArgument => DomainError::invalid_argument(status.message()),
        Code::NotFound => DomainError::not_found(status.message()),
        code => DomainError::internal(format!("rpc failed with {:?}: {}", code, status.message())),
    }
}

impl From<DomainError> for Status {
    fn from(err: DomainError) -> Self {
        to_status(&err)
    }
}

impl From<Status> for DomainError {
    fn from(status: Status) -> Self {
        from_status(&status)
    }
}

/// JSON body returned by the HTTP API on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl From<&DomainError> for ErrorBody {
    fn from(err: &DomainError) -> Self {
        Self {
            error: err.canonical_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_to_status_mapping() {
        let cases = [
            (DomainError::invalid_argument("bad lat"), Code::InvalidArgument),
            (DomainError::not_found("no user"), Code::NotFound),
            (DomainError::internal("db down"), Code::Internal),
        ];

        for (err, code) in cases {
            let status = to_status(&err);
            assert_eq!(status.code(), code);
            assert_eq!(status.message(), err.canonical_text());
        }
    }

    #[test]
    fn test_status_does_not_leak_detail() {
        let status: Status = DomainError::internal("password=hunter2 at 10.0.0.1").into();
        assert_eq!(status.message(), INTERNAL_TEXT);
    }

    #[test]
    fn test_status_to_domain_mapping() {
        assert!(matches!(
            from_status(&Status::invalid_argument("x")),
            DomainError::InvalidArgument(_)
        ));
        assert!(matches!(
            from_status(&Status::not_found("x")),
            DomainError::NotFound(_)
        ));
        assert!(matches!(
            from_status(&Status::internal("x")),
            DomainError::Internal(_)
        ));
    }

    #[test]
    fn test_unclassified_status_is_internal() {
        for status in [
            Status::unavailable("connection refused"),
            Status::unknown("?"),
            Status::deadline_exceeded("slow"),
            Status::cancelled("gone"),
            Status::failed_precondition("x"),
            Status::permission_denied("x"),
        ] {
            assert!(from_status(&status).is_internal(), "{:?}", status.code());
        }
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            DomainError::invalid_argument("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(DomainError::not_found("x").http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            DomainError::internal("x").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_caller_fault_classification() {
        assert!(DomainError::invalid_argument("x").is_caller_fault());
        assert!(DomainError::not_found("x").is_caller_fault());
        assert!(!DomainError::internal("x").is_caller_fault());

        assert!(is_successful(&DomainError::invalid_argument("x")));
        assert!(is_successful(&DomainError::not_found("x")));
        assert!(!is_successful(&DomainError::internal("x")));
    }

    #[test]
    fn test_error_body() {
        let body = ErrorBody::from(&DomainError::not_found("user bob"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "not found" }));
    }
}
