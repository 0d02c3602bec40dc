//! Error taxonomy for Salesforce API calls
//!
//! Mirrors the exception classes the Salesforce REST API reports through
//! HTTP status codes, so callers can tell a recoverable "record not found"
//! apart from errors that must stop a run.

use serde::Deserialize;

/// Error returned by any call against the remote record store
#[derive(Debug)]
pub enum ApiError {
    /// The SOAP login call was rejected
    Authentication { code: String, message: String },
    /// HTTP 300: more than one record matched an external id
    MultipleRecords { url: String, content: String },
    /// HTTP 400: the request body or query was rejected
    MalformedRequest { url: String, content: String },
    /// HTTP 401: the session id is no longer valid
    ExpiredSession { url: String, content: String },
    /// HTTP 403: the user lacks permission for the request
    RefusedRequest { url: String, content: String },
    /// HTTP 404: the record or resource does not exist
    ResourceNotFound { url: String, content: String },
    /// Any other non-success status
    General {
        status: u16,
        url: String,
        content: String,
    },
    /// The response could not be interpreted
    InvalidResponse(String),
    /// Connection, TLS or decoding failure below the HTTP layer
    Transport(reqwest::Error),
}

/// Single entry of the error list Salesforce returns in failed responses
#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
    #[serde(rename = "errorCode")]
    error_code: String,
}

impl ApiError {
    /// Classify a non-success HTTP response
    pub fn from_status(status: u16, url: &str, body: &str) -> Self {
        let url = url.to_string();
        let content = describe_error_body(body);
        match status {
            300 => ApiError::MultipleRecords { url, content },
            400 => ApiError::MalformedRequest { url, content },
            401 => ApiError::ExpiredSession { url, content },
            403 => ApiError::RefusedRequest { url, content },
            404 => ApiError::ResourceNotFound { url, content },
            _ => ApiError::General {
                status,
                url,
                content,
            },
        }
    }

    /// Whether this error means the targeted record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ResourceNotFound { .. })
    }

}

/// Render an error body as "CODE: message" pairs, falling back to the raw text
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<Vec<ErrorEntry>>(body) {
        Ok(entries) if !entries.is_empty() => entries
            .iter()
            .map(|e| format!("{}: {}", e.error_code, e.message))
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.trim().to_string(),
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Authentication { code, message } => {
                write!(f, "Authentication failed ({}): {}", code, message)
            }
            ApiError::MultipleRecords { url, content } => {
                write!(f, "More than one record for {}. Response content: {}", url, content)
            }
            ApiError::MalformedRequest { url, content } => {
                write!(f, "Malformed request {}. Response content: {}", url, content)
            }
            ApiError::ExpiredSession { url, content } => {
                write!(f, "Expired session for {}. Response content: {}", url, content)
            }
            ApiError::RefusedRequest { url, content } => {
                write!(f, "Request refused for {}. Response content: {}", url, content)
            }
            ApiError::ResourceNotFound { url, content } => {
                write!(f, "Resource {} not found. Response content: {}", url, content)
            }
            ApiError::General {
                status,
                url,
                content,
            } => write!(
                f,
                "Error code {} for {}. Response content: {}",
                status, url, content
            ),
            ApiError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ApiError::Transport(err) => write!(f, "Request failed: {}", err),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}
