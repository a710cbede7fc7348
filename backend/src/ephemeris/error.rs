//! Error types for ephemeris collaborator calls.
//!
//! Every error carries an [`ErrorContext`] describing which request failed and
//! whether repeating it could succeed. The retry layer only repeats errors whose
//! context is marked retryable.

use std::fmt;

/// Result type for ephemeris operations
pub type EphemerisResult<T> = Result<T, EphemerisError>;

/// Where and why an ephemeris call failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "get_longitude", "get_elements")
    pub operation: Option<String>,
    /// Body id the request was about
    pub body: Option<String>,
    /// Julian date of the request
    pub epoch: Option<f64>,
    pub details: Option<String>,
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_epoch(mut self, epoch_jd: f64) -> Self {
        self.epoch = Some(epoch_jd);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref body) = self.body {
            parts.push(format!("body={}", body));
        }
        if let Some(epoch) = self.epoch {
            parts.push(format!("jd={:.1}", epoch));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EphemerisError {
    /// Network or HTTP failure talking to the service.
    #[error("Transport error: {message} {context}")]
    Transport {
        message: String,
        context: ErrorContext,
    },

    /// No answer within the per-request timeout.
    #[error("Timeout error: {message} {context}")]
    Timeout {
        message: String,
        context: ErrorContext,
    },

    /// Body or epoch outside what the service can answer.
    #[error("Unsupported request: {message} {context}")]
    Unsupported {
        message: String,
        context: ErrorContext,
    },

    /// Response arrived but could not be parsed.
    #[error("Malformed response: {message} {context}")]
    Malformed {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Internal error: {message} {context}")]
    Internal {
        message: String,
        context: ErrorContext,
    },
}

impl EphemerisError {
    /// Transport failure; retryable.
    pub fn transport(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Transport {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Transport failure the caller decided must not be retried (e.g. HTTP 4xx).
    pub fn transport_fatal(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Transport {
            message: message.into(),
            context,
        }
    }

    /// Timeout; retryable.
    pub fn timeout(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Timeout {
            message: message.into(),
            context: context.retryable(),
        }
    }

    pub fn unsupported(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Unsupported {
            message: message.into(),
            context,
        }
    }

    pub fn malformed(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Malformed {
            message: message.into(),
            context,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Internal {
            message: message.into(),
            context,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { context, .. } | Self::Timeout { context, .. } => context.retryable,
            _ => false,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Transport { context, .. }
            | Self::Timeout { context, .. }
            | Self::Unsupported { context, .. }
            | Self::Malformed { context, .. }
            | Self::Configuration { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. }
            | Self::Timeout { message, .. }
            | Self::Unsupported { message, .. }
            | Self::Malformed { message, .. }
            | Self::Configuration { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    /// Add or update the attempt counter in the error context.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        let context = match &mut self {
            Self::Transport { context, .. }
            | Self::Timeout { context, .. }
            | Self::Unsupported { context, .. }
            | Self::Malformed { context, .. }
            | Self::Configuration { context, .. }
            | Self::Internal { context, .. } => context,
        };
        context.details = Some(match context.details.take() {
            Some(details) => format!("{}; attempt={}", details, attempt),
            None => format!("attempt={}", attempt),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("get_longitude")
            .with_body("499")
            .with_epoch(2_461_041.5)
            .with_details("status=503")
            .retryable();
        assert_eq!(
            ctx.to_string(),
            "[operation=get_longitude, body=499, jd=2461041.5, details=status=503, retryable=true]"
        );
    }

    #[test]
    fn test_retryable_classification() {
        let ctx = ErrorContext::new("get_longitude");
        assert!(EphemerisError::transport("reset", ctx.clone()).is_retryable());
        assert!(EphemerisError::timeout("slow", ctx.clone()).is_retryable());
        assert!(!EphemerisError::transport_fatal("404", ctx.clone()).is_retryable());
        assert!(!EphemerisError::malformed("no $$SOE", ctx.clone()).is_retryable());
        assert!(!EphemerisError::unsupported("range", ctx).is_retryable());
        assert!(!EphemerisError::configuration("bad url").is_retryable());
    }

    #[test]
    fn test_with_attempt_appends_details() {
        let err = EphemerisError::timeout(
            "slow",
            ErrorContext::new("get_longitude").with_details("t=30s"),
        )
        .with_attempt(3);
        assert_eq!(err.context().details.as_deref(), Some("t=30s; attempt=3"));
        assert_eq!(err.message(), "slow");
        assert!(err.to_string().starts_with("Timeout error: slow"));
    }
}
