//! Configuration validation
//!
//! Checks a loaded configuration before any request goes out:
//! - Credentials are present
//! - The API root is an HTTP(S) URL
//! - Board filters do not contradict each other
//! - The label template compiles

use super::chorewarrior_config::ChoreWarriorConfig;
use super::service_config::FlatasticConfig;
use crate::ChoreSyncError;
use std::collections::HashSet;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a chorewarrior configuration
pub fn validate_config(config: &ChoreWarriorConfig) -> ValidationResult {
    validate_flatastic(&config.flatastic)
}

/// Validate the Flatastic section
pub fn validate_flatastic(config: &FlatasticConfig) -> ValidationResult {
    let mut errors = Vec::new();

    let email = config.email.trim();
    if email.is_empty() {
        errors.push(ValidationError::new(
            "flatastic.email",
            "Email cannot be empty",
        ));
    } else if !email.contains('@') {
        errors.push(ValidationError::new(
            "flatastic.email",
            format!("'{}' does not look like an email address", email),
        ));
    }

    if config.password.is_empty() {
        errors.push(ValidationError::new(
            "flatastic.password",
            "Password cannot be empty",
        ));
    } else if let Err(e) = config.resolve_password() {
        errors.push(ValidationError::new("flatastic.password", e.to_string()));
    }

    if !is_valid_http_url(&config.base_url) {
        errors.push(ValidationError::new(
            "flatastic.base_url",
            format!("Invalid API URL: {}", config.base_url),
        ));
    }

    let included: HashSet<&str> = config.include_board_ids.iter().map(String::as_str).collect();
    for board in &config.exclude_board_ids {
        if included.contains(board.as_str()) {
            errors.push(ValidationError::new(
                "flatastic.exclude_board_ids",
                format!("Board {} is both included and excluded", board),
            ));
        }
    }

    if let Err(e) = minijinja::Environment::new().template_from_str(&config.label_template) {
        errors.push(ValidationError::new(
            "flatastic.label_template",
            format!("Template does not compile: {}", e),
        ));
    }

    if let Some(user) = &config.only_if_assigned {
        if user.trim().is_empty() {
            errors.push(ValidationError::new(
                "flatastic.only_if_assigned",
                "User id cannot be empty",
            ));
        }
    } else if config.also_unassigned {
        errors.push(ValidationError::new(
            "flatastic.also_unassigned",
            "Only meaningful together with only_if_assigned",
        ));
    }

    if config.description_length == Some(0) {
        errors.push(ValidationError::new(
            "flatastic.description_length",
            "Must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}

/// Validate configuration and fold the problems into a single error
pub fn validate_config_result(config: &ChoreWarriorConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ChoreSyncError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}
