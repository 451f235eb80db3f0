//! Error types shared across the routing core

/// Standard result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error for core operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl CoreError {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::invalid_config(err.to_string())
    }
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}

/// Errors raised while compiling a route path pattern
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Route path '{pattern}' must start with '/'")]
    NotAbsolute { pattern: String },

    #[error("Route path '{pattern}' has an invalid parameter name '{name}'")]
    InvalidParameter { pattern: String, name: String },

    #[error("Route path '{pattern}' declares parameter '{name}' more than once")]
    DuplicateParameter { pattern: String, name: String },

    #[error("Route path '{pattern}' failed to compile: {message}")]
    Regex { pattern: String, message: String },

    #[error("Missing parameter '{name}' for route path '{pattern}'")]
    MissingParameter { pattern: String, name: String },
}

/// Errors raised by route lookups and navigation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("No route named '{0}'")]
    UnknownRouteName(String),

    #[error("Route '{name}' is a redirect and cannot be reversed with parameters")]
    RedirectRoute { name: String },

    #[error("Navigation to '{path}' exceeded {limit} redirects")]
    RedirectLoop { path: String, limit: usize },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Errors raised while extracting typed path parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("Path parameter '{0}' is not present")]
    Missing(String),

    #[error("Failed to parse path parameter '{name}' = '{value}': {message}")]
    Parse {
        name: String,
        value: String,
        message: String,
    },
}

/// Errors raised while decoding an access token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token has {found} segments, expected 3")]
    Segments { found: usize },

    #[error("Token payload is not valid base64: {0}")]
    Encoding(String),

    #[error("Token payload is not a valid claims object: {0}")]
    Payload(String),

    #[error("Token expiry {0} is out of range")]
    ExpiryOutOfRange(i64),
}

/// Errors reported by a token refresh collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("Token refresh failed: {0}")]
    Failed(String),

    #[error("No refresh credential available")]
    NoCredential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_error_converts_into_core_error() {
        let err: CoreError = PatternError::NotAbsolute {
            pattern: "todo".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Route path 'todo' must start with '/'");
    }

    #[test]
    fn test_router_error_display() {
        let err = RouterError::RedirectLoop {
            path: "/admin".to_string(),
            limit: 8,
        };
        assert_eq!(err.to_string(), "Navigation to '/admin' exceeded 8 redirects");
    }

    #[test]
    fn test_config_error_maps_to_invalid_config() {
        let err: CoreError = config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
        assert!(err.to_string().contains("bad value"));
    }
}
