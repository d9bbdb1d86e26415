use serde::{Deserialize, Serialize};

/// Unified error type for all SberCloud DNS API operations.
///
/// Lookup failures carry the names they searched for so the CLI can report
/// them verbatim. All variants are serializable for structured error
/// reporting.
///
/// # Retryable Errors
///
/// The following variants represent transient failures that may succeed on
/// retry:
/// - [`Network`](Self::Network) — network connectivity issues
/// - [`Timeout`](Self::Timeout) — request timed out
/// - [`RateLimited`](Self::RateLimited) — API rate limit exceeded
///
/// The HTTP layer automatically retries these with exponential backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ApiError {
    /// A network-level error occurred (DNS resolution failure, connection
    /// refused, HTTP 502-504, etc.).
    Network {
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Error details.
        detail: String,
    },

    /// The provided access key / secret key pair was rejected (HTTP 401).
    InvalidCredentials {
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The authenticated user lacks permission for the operation (HTTP 403).
    PermissionDenied {
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The API rate limit has been exceeded (HTTP 429).
    RateLimited {
        /// Suggested wait time in seconds before retrying, if provided.
        retry_after: Option<u64>,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// No enabled project with the requested name exists.
    ProjectNotFound {
        /// The project name that was searched for.
        name: String,
    },

    /// No active zone with the requested name exists.
    ZoneNotFound {
        /// The zone name that was searched for, without the trailing dot.
        zone: String,
    },

    /// No active TXT record with the requested name and value exists.
    RecordNotFound {
        /// FQDN of the record that was searched for.
        name: String,
        /// Challenge value that was searched for.
        value: String,
    },

    /// The API returned a non-2xx status not covered by a more specific
    /// variant.
    ApiStatus {
        /// HTTP status code.
        status: u16,
        /// Provider error code from the response body, if it was parseable.
        error_code: Option<String>,
        /// Error message (provider message or raw body).
        message: String,
    },

    /// Failed to parse an API response.
    Parse {
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    Serialization {
        /// Details about the serialization failure.
        detail: String,
    },
}

impl ApiError {
    /// Whether this error reflects expected conditions (bad input, missing
    /// resources) rather than a fault, for log leveling.
    ///
    /// Returns `true` for `warn`-level errors, `false` for `error`-level.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::PermissionDenied { .. }
                | Self::ProjectNotFound { .. }
                | Self::ZoneNotFound { .. }
                | Self::RecordNotFound { .. }
        )
    }

    /// Whether a retry may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network { detail } => {
                write!(f, "Network error: {detail}")
            }
            Self::Timeout { detail } => {
                write!(f, "Request timeout: {detail}")
            }
            Self::InvalidCredentials { raw_message } => {
                if let Some(msg) = raw_message {
                    write!(f, "Invalid credentials: {msg}")
                } else {
                    write!(f, "Invalid credentials")
                }
            }
            Self::PermissionDenied { raw_message } => {
                if let Some(msg) = raw_message {
                    write!(f, "Permission denied: {msg}")
                } else {
                    write!(f, "Permission denied")
                }
            }
            Self::RateLimited { retry_after, .. } => {
                if let Some(secs) = retry_after {
                    write!(f, "Rate limited (retry after {secs}s)")
                } else {
                    write!(f, "Rate limited")
                }
            }
            Self::ProjectNotFound { name } => {
                write!(f, "no active project named '{name}' found")
            }
            Self::ZoneNotFound { zone } => {
                write!(f, "no active '{zone}' zone found")
            }
            Self::RecordNotFound { name, value } => {
                write!(
                    f,
                    "no active record '{name}' of type 'TXT' with value '{value}' found"
                )
            }
            Self::ApiStatus {
                status,
                error_code,
                message,
            } => {
                if let Some(code) = error_code {
                    write!(f, "API error (HTTP {status}, {code}): {message}")
                } else {
                    write!(f, "API error (HTTP {status}): {message}")
                }
            }
            Self::Parse { detail } => {
                write!(f, "Parse error: {detail}")
            }
            Self::Serialization { detail } => {
                write!(f, "Serialization error: {detail}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Convenience type alias for `Result<T, ApiError>`.
pub type Result<T> = std::result::Result<T, ApiError>;
