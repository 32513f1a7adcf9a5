#![allow(clippy::collapsible_if)]

use eyre::Result;

use crate::config::models::{DirectoryConfig, EditorConfig};

/// Validation result type alias
pub type ConfigValidationResult<T> = Result<T, ConfigValidationError>;

/// Editor settings validation errors
#[derive(Debug, thiserror::Error, Clone)]
pub enum ConfigValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid directory source '{source_value}': {reason}")]
    InvalidDirectorySource { source_value: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Where a directory is read from, parsed from its configured string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorySource {
    File(std::path::PathBuf),
    Http(url::Url),
}

impl DirectorySource {
    /// `http://` and `https://` values are URLs; anything else is a file path.
    pub fn parse(value: &str) -> ConfigValidationResult<Self> {
        if value.trim().is_empty() {
            return Err(ConfigValidationError::InvalidDirectorySource {
                source_value: value.to_string(),
                reason: "Source cannot be empty".to_string(),
            });
        }

        if value.starts_with("http://") || value.starts_with("https://") {
            let url = url::Url::parse(value).map_err(|e| {
                ConfigValidationError::InvalidDirectorySource {
                    source_value: value.to_string(),
                    reason: format!("Invalid URL format: {e}"),
                }
            })?;
            if url.host().is_none() {
                return Err(ConfigValidationError::InvalidDirectorySource {
                    source_value: value.to_string(),
                    reason: "URL must have a valid host".to_string(),
                });
            }
            return Ok(DirectorySource::Http(url));
        }

        Ok(DirectorySource::File(value.into()))
    }
}

/// Editor settings validator
pub struct EditorConfigValidator;

impl EditorConfigValidator {
    /// Validate the entire editor configuration
    pub fn validate(config: &EditorConfig) -> ConfigValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&config.log_level) {
            errors.push(ConfigValidationError::InvalidField {
                field: "log_level".to_string(),
                message: format!("Invalid log filter '{}': {e}", config.log_level),
            });
        }

        if let Err(mut directory_errors) = Self::validate_directories(&config.directories) {
            errors.append(&mut directory_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    fn validate_directories(config: &DirectoryConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        for source in [&config.services, &config.domains].into_iter().flatten() {
            if let Err(e) = DirectorySource::parse(source) {
                errors.push(e);
            }
        }

        for (field, value) in [
            ("directories.timeout", &config.timeout),
            ("directories.poll_interval", &config.poll_interval),
        ] {
            match humantime::parse_duration(value) {
                Ok(duration) => {
                    if duration.is_zero() {
                        errors.push(ConfigValidationError::InvalidField {
                            field: field.to_string(),
                            message: "Duration must be greater than 0".to_string(),
                        });
                    }
                }
                Err(e) => errors.push(ConfigValidationError::InvalidField {
                    field: field.to_string(),
                    message: format!("Invalid duration '{value}': {e}"),
                }),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ConfigValidationError>) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_defaults() {
        assert!(EditorConfigValidator::validate(&EditorConfig::default()).is_ok());
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = EditorConfig::default();
        config.directories.poll_interval = "0s".to_string();

        assert!(EditorConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn validate_collects_every_bad_field() {
        let mut config = EditorConfig::default();
        config.directories.timeout = "soon".to_string();
        config.directories.services = Some("http://".to_string());

        let err = EditorConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Found 2 validation errors"));
    }

    #[test]
    fn directory_source_distinguishes_urls_from_paths() {
        assert!(matches!(
            DirectorySource::parse("https://console.local/v1/domains"),
            Ok(DirectorySource::Http(_))
        ));
        assert_eq!(
            DirectorySource::parse("./services.json").unwrap(),
            DirectorySource::File("./services.json".into())
        );
        assert!(DirectorySource::parse("  ").is_err());
    }
}
