//! Error types for the Stipulate validation engine
//!
//! Constraint violations are never errors: they are data returned from the
//! validation entry points. The variants below cover broken metadata
//! (configuration errors), malformed requests, and failing validator
//! implementations.

use thiserror::Error;

/// Main error type for Stipulate operations
#[derive(Error, Debug)]
pub enum Error {
    /// Contradictory or unusable metadata detected while building a type model
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        type_name: Option<String>,
    },

    /// The requested bean type has no declaration
    #[error("Unknown bean type: {type_name}")]
    UnknownType { type_name: String },

    /// Broken group or group sequence definitions
    #[error("Group definition error: {message}")]
    GroupDefinition { message: String },

    /// A method configuration rule rejected the executable hierarchy
    #[error("Method configuration rule '{rule}' violated for {executable}: {message}")]
    MethodConfiguration {
        rule: &'static str,
        executable: String,
        message: String,
    },

    /// No extractor or more than one maximally specific extractor
    #[error("Value extractor error for container '{container_type}' (type argument {position}): {message}")]
    ValueExtractor {
        container_type: String,
        position: usize,
        message: String,
    },

    /// Dynamic default group sequence provider misbehaved
    #[error("Default group sequence provider of '{type_name}' failed: {message}")]
    GroupSequenceProvider {
        type_name: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The property path does not resolve against the bean model
    #[error("Invalid property path '{path}': {message}")]
    InvalidPropertyPath { path: String, message: String },

    /// Wrong number of arguments passed for an executable
    #[error("Executable {executable} expects {expected} parameter(s), got {actual}")]
    ParameterCount {
        executable: String,
        expected: usize,
        actual: usize,
    },

    /// A plugged-in constraint validator failed
    #[error("Constraint validator for '{constraint}' failed: {source}")]
    Validator {
        constraint: String,
        #[source]
        source: anyhow::Error,
    },

    /// A traversable resolver failed while deciding whether to visit a property
    #[error("Traversable resolver failed for property '{property}' of '{bean_type}': {source}")]
    TraversableResolver {
        bean_type: String,
        property: String,
        #[source]
        source: anyhow::Error,
    },

    /// None of the constraint's validators accepts the runtime value
    #[error("No validator of constraint '{constraint}' accepts values of type '{value_type}'")]
    UnexpectedValueType {
        constraint: String,
        value_type: String,
    },

    /// JSON parsing errors while loading configuration
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing errors while loading configuration
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error not tied to a single type
    pub fn configuration<M: Into<String>>(message: M) -> Self {
        Error::Configuration {
            message: message.into(),
            type_name: None,
        }
    }

    /// Create a configuration error raised while building metadata for `type_name`
    pub fn configuration_for<T, M>(type_name: T, message: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Error::Configuration {
            message: message.into(),
            type_name: Some(type_name.into()),
        }
    }

    /// Create a group definition error
    pub fn group_definition<M: Into<String>>(message: M) -> Self {
        Error::GroupDefinition {
            message: message.into(),
        }
    }

    /// Create an invalid property path error
    pub fn invalid_path<P, M>(path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Error::InvalidPropertyPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by broken metadata rather than by the request or a validator
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. }
                | Error::UnknownType { .. }
                | Error::GroupDefinition { .. }
                | Error::MethodConfiguration { .. }
                | Error::ValueExtractor { .. }
                | Error::GroupSequenceProvider { .. }
                | Error::UnexpectedValueType { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::configuration("broken").is_configuration_error());
        assert!(Error::group_definition("cycle").is_configuration_error());
        assert!(!Error::invalid_path("a.b", "unknown").is_configuration_error());

        let err = Error::Validator {
            constraint: "NotNull".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        assert!(!err.is_configuration_error());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_error_display() {
        let err = Error::configuration_for("Order", "both a static sequence and a provider");
        assert_eq!(
            err.to_string(),
            "Configuration error: both a static sequence and a provider"
        );

        let err = Error::ParameterCount {
            executable: "place(String)".to_string(),
            expected: 1,
            actual: 2,
        };
        assert!(err.to_string().contains("expects 1 parameter(s), got 2"));
    }
}
