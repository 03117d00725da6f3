//! Crate-level error types.
//!
//! User input problems are never errors here: field and global validation
//! messages travel as data inside [`crate::engine::Computation`]. `SizerError`
//! covers contract violations, config loading and the toggle list.

use thiserror::Error;

/// The normal quantile function was called outside the open interval (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("probability {p} is outside the open interval (0, 1)")]
pub struct QuantileDomainError {
    pub p: f64,
}

/// Rejected feature-toggle list operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("toggle name must not be empty")]
    EmptyName,

    #[error("no toggle with id `{0}`")]
    UnknownId(String),

    #[error("rollout must be between 0 and 100, got {0}")]
    RolloutOutOfRange(u32),
}

/// Failure while loading the TOML config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level error for the library and the binary.
#[derive(Debug, Error)]
pub enum SizerError {
    #[error("internal quantile contract violation: {0}")]
    Quantile(#[from] QuantileDomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Toggle(#[from] ToggleError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_error_message_names_probability() {
        let e = QuantileDomainError { p: 1.5 };
        assert_eq!(e.to_string(), "probability 1.5 is outside the open interval (0, 1)");
    }

    #[test]
    fn test_quantile_error_converts_into_sizer_error() {
        let e: SizerError = QuantileDomainError { p: 0.0 }.into();
        assert!(matches!(e, SizerError::Quantile(_)));
        assert!(e.to_string().starts_with("internal quantile contract violation"));
    }

    #[test]
    fn test_toggle_error_is_transparent() {
        let e: SizerError = ToggleError::UnknownId("abc".into()).into();
        assert_eq!(e.to_string(), "no toggle with id `abc`");
    }

    #[test]
    fn test_rollout_error_message() {
        assert_eq!(
            ToggleError::RolloutOutOfRange(140).to_string(),
            "rollout must be between 0 and 100, got 140"
        );
    }
}
