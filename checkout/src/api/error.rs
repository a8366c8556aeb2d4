//! Error types for the order service client

use serde::Deserialize;
use thiserror::Error;

/// One error entry reported by the order service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorDetail {
    /// Machine-readable code, when the service sends one
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl ApiErrorDetail {
    /// A detail with only a message
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// A detail with a code and a message
    #[must_use]
    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Errors that can occur when talking to the order service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, TLS)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// A success response whose body could not be decoded
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// The service answered with a non-success status
    #[error("API error (status {status}): {}", join_messages(.errors))]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error entries from the body, never empty
        errors: Vec<ApiErrorDetail>,
    },
}

fn join_messages(errors: &[ApiErrorDetail]) -> String {
    errors
        .iter()
        .map(|detail| detail.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApiError {
    /// HTTP status of a rejection
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::RequestFailed(_) | Self::ResponseParseFailed(_) => None,
        }
    }

    /// Whether any error entry carries `code`
    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        match self {
            Self::Rejected { errors, .. } => errors
                .iter()
                .any(|detail| detail.code.as_deref() == Some(code)),
            Self::RequestFailed(_) | Self::ResponseParseFailed(_) => false,
        }
    }

    /// Messages suitable for showing to a buyer
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Rejected { errors, .. } => {
                errors.iter().map(|detail| detail.message.clone()).collect()
            },
            other => vec![other.to_string()],
        }
    }

    /// Whether the service refused the request on its merits (4xx)
    #[must_use]
    pub const fn is_client_rejection(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if *status >= 400 && *status < 500)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

/// Extract error entries from a non-success body
///
/// Accepts `{"errors":[{"code","message"}]}` or `{"message"}`; any other
/// non-empty body becomes a single message, an empty one a status line.
pub(crate) fn parse_error_body(status: u16, body: &str) -> Vec<ApiErrorDetail> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if !parsed.errors.is_empty() {
            return parsed.errors;
        }
        if let Some(message) = parsed.message.filter(|m| !m.trim().is_empty()) {
            return vec![ApiErrorDetail::message(message)];
        }
    }

    let body = body.trim();
    if body.is_empty() {
        vec![ApiErrorDetail::message(format!("HTTP {status}"))]
    } else {
        vec![ApiErrorDetail::message(body)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_array() {
        let details = parse_error_body(
            404,
            r#"{"errors":[{"code":"PROMO_CODE_NOT_FOUND","message":"Unknown code"}]}"#,
        );
        assert_eq!(
            details,
            vec![ApiErrorDetail::coded("PROMO_CODE_NOT_FOUND", "Unknown code")]
        );
    }

    #[test]
    fn test_parse_message_object() {
        let details = parse_error_body(400, r#"{"message":"Sold out"}"#);
        assert_eq!(details, vec![ApiErrorDetail::message("Sold out")]);
    }

    #[test]
    fn test_parse_plain_and_empty_bodies() {
        assert_eq!(
            parse_error_body(502, "Bad gateway"),
            vec![ApiErrorDetail::message("Bad gateway")]
        );
        assert_eq!(
            parse_error_body(503, "  "),
            vec![ApiErrorDetail::message("HTTP 503")]
        );
    }

    #[test]
    fn test_rejection_helpers() {
        let error = ApiError::Rejected {
            status: 422,
            errors: vec![
                ApiErrorDetail::coded("PROMO_CODE_NOT_APPLICABLE", "Wrong event"),
                ApiErrorDetail::message("Try another code"),
            ],
        };

        assert_eq!(error.status(), Some(422));
        assert!(error.has_code("PROMO_CODE_NOT_APPLICABLE"));
        assert!(error.is_client_rejection());
        assert_eq!(error.messages(), vec!["Wrong event", "Try another code"]);
        assert_eq!(
            error.to_string(),
            "API error (status 422): Wrong event; Try another code"
        );
    }

    #[test]
    fn test_transport_errors_are_not_rejections() {
        let error = ApiError::RequestFailed("timed out".to_string());
        assert_eq!(error.status(), None);
        assert!(!error.is_client_rejection());
        assert_eq!(error.messages(), vec!["Request failed: timed out"]);
    }
}
