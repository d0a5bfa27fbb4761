//! Domain errors for the vectorcase retrieval core.

use thiserror::Error;

/// Domain-level errors that can occur in the retrieval core.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Bad input shape: empty text, blank query, wrong vector dimension.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing or inconsistent settings, detected before any network call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An external service failed (after retries, where retries apply).
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Malformed structured output from a language model.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Returns true if retrying the failed operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Provider(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Returns true if the provider reported that the resource already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Provider(ProviderError::Conflict { .. }))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures reported by (or while talking to) an external service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request was rejected as invalid (HTTP 400, 422).
    #[error("{service} rejected the request ({status}): {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Invalid or missing credentials (HTTP 401, 403).
    #[error("{service} authentication failed ({status})")]
    Unauthorized { service: &'static str, status: u16 },

    /// The addressed resource does not exist (HTTP 404).
    #[error("{service} resource not found: {body}")]
    NotFound { service: &'static str, body: String },

    /// The resource already exists (HTTP 409).
    #[error("{service} resource already exists: {body}")]
    Conflict { service: &'static str, body: String },

    /// Too many requests (HTTP 429).
    #[error("{service} rate limit exceeded")]
    RateLimited { service: &'static str },

    /// Server-side failure (HTTP 5xx).
    #[error("{service} unavailable ({status}): {body}")]
    Unavailable {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The request did not complete in time.
    #[error("{service} request timed out")]
    Timeout { service: &'static str },

    /// Connection-level failure.
    #[error("{service} transport error: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// The service answered, but not with what its API documents.
    #[error("{service} returned a malformed response: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    /// Batched re-ranking did not converge within the configured number of rounds.
    #[error("re-ranking did not converge within {rounds} rounds ({remaining} candidates left)")]
    RerankDiverged { rounds: usize, remaining: usize },
}

impl ProviderError {
    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Unavailable { .. }
                | Self::Timeout { .. }
                | Self::Transport { .. }
        )
    }

    /// Classify a non-success HTTP status into a provider error.
    pub fn from_status(service: &'static str, status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized { service, status },
            404 => Self::NotFound { service, body },
            409 => Self::Conflict { service, body },
            429 => Self::RateLimited { service },
            500..=599 => Self::Unavailable {
                service,
                status,
                body,
            },
            _ => Self::Rejected {
                service,
                status,
                body,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ProviderError::RateLimited { service: "openai" }.is_transient());
        assert!(ProviderError::from_status("openai", 503, String::new()).is_transient());
        assert!(ProviderError::Timeout { service: "pinecone" }.is_transient());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!ProviderError::from_status("openai", 400, "bad".into()).is_transient());
        assert!(!ProviderError::from_status("openai", 401, String::new()).is_transient());
        assert!(!ProviderError::from_status("pinecone", 404, String::new()).is_transient());
        assert!(!ProviderError::from_status("pinecone", 409, String::new()).is_transient());
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ProviderError::from_status("pinecone", 409, "exists".into()),
            ProviderError::Conflict { .. }
        ));
        assert!(matches!(
            ProviderError::from_status("openai", 429, String::new()),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            ProviderError::from_status("openai", 422, String::new()),
            ProviderError::Rejected { status: 422, .. }
        ));
    }

    #[test]
    fn test_domain_error_wraps_provider() {
        let err: DomainError = ProviderError::from_status("pinecone", 409, String::new()).into();
        assert!(err.is_conflict());
        assert!(!err.is_transient());

        let err: DomainError = ProviderError::Timeout { service: "openai" }.into();
        assert!(err.is_transient());
        assert!(!DomainError::Validation("empty".into()).is_transient());
    }
}
