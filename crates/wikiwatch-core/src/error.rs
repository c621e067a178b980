use std::path::PathBuf;
use thiserror::Error;

/// All configuration and startup errors produced by wikiwatch.
#[derive(Error, Debug)]
pub enum WikiwatchError {
    /// The config file exists but could not be read from disk.
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`BotConfig`](crate::settings::BotConfig).
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No component is enabled, so there is nothing to run.
    #[error("No components are enabled")]
    NoComponents,

    /// A component is enabled but the section it needs is missing.
    #[error("Component {component} is enabled but has no [{section}] configuration")]
    MissingSection {
        component: &'static str,
        section: &'static str,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the wikiwatch crates.
pub type Result<T> = std::result::Result<T, WikiwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = WikiwatchError::ConfigRead {
            path: PathBuf::from("/etc/wikiwatch.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read config file"));
        assert!(msg.contains("/etc/wikiwatch.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_error_display_config_parse() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err = WikiwatchError::ConfigParse {
            path: PathBuf::from("config.json"),
            source: json_err,
        };
        assert!(err
            .to_string()
            .starts_with("Failed to parse config file config.json"));
    }

    #[test]
    fn test_error_display_no_components() {
        assert_eq!(
            WikiwatchError::NoComponents.to_string(),
            "No components are enabled"
        );
    }

    #[test]
    fn test_error_display_missing_section() {
        let err = WikiwatchError::MissingSection {
            component: "watcher",
            section: "watcher",
        };
        assert_eq!(
            err.to_string(),
            "Component watcher is enabled but has no [watcher] configuration"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = WikiwatchError::Config("backoff must be positive".to_string());
        assert_eq!(err.to_string(), "Configuration error: backoff must be positive");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: WikiwatchError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }
}
