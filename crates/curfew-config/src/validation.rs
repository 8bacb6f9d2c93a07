//! Configuration validation

use crate::schema::{RawCommand, RawConfig};
use curfew_api::{FallbackStrategy, InspectionFailurePolicy, SHUTDOWN_PLACEHOLDERS};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("[{section}] {message}")]
    SectionError { section: String, message: String },

    #[error("[{section}] program cannot be empty")]
    EmptyProgram { section: String },

    #[error("[{section}] unknown placeholder '{{{name}}}' in arguments")]
    UnknownPlaceholder { section: String, name: String },

    #[error("[{section}] {field} must be at least 1 second")]
    ZeroDuration { section: String, field: String },

    #[error("Unknown value '{value}' for {field}")]
    UnknownValue { field: String, value: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // [guard]
    if config.guard.tick_interval_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            section: "guard".into(),
            field: "tick_interval_seconds".into(),
        });
    }
    if let Some(value) = &config.guard.inspection_failure
        && let Err(e) = parse_inspection_failure(value)
    {
        errors.push(e);
    }

    // [sessions]
    let sessions = &config.sessions;
    if sessions.program.as_deref().is_some_and(|p| p.trim().is_empty()) {
        errors.push(ValidationError::EmptyProgram {
            section: "sessions".into(),
        });
    }
    if sessions.timeout_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            section: "sessions".into(),
            field: "timeout_seconds".into(),
        });
    }
    if sessions.current_marker.as_deref().is_some_and(|m| m.contains(char::is_whitespace)) {
        errors.push(ValidationError::SectionError {
            section: "sessions".into(),
            message: "current_marker cannot contain whitespace".into(),
        });
    }

    // [shutdown]
    let shutdown = &config.shutdown;
    if shutdown.program.as_deref().is_some_and(|p| p.trim().is_empty()) {
        errors.push(ValidationError::EmptyProgram {
            section: "shutdown".into(),
        });
    }
    if let Some(args) = &shutdown.args {
        errors.extend(validate_placeholders("shutdown", args));
    }
    if let Some(value) = &shutdown.strategy
        && let Err(e) = parse_fallback_strategy(value)
    {
        errors.push(e);
    }
    if shutdown.timeout_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            section: "shutdown".into(),
            field: "timeout_seconds".into(),
        });
    }
    for (i, fallback) in shutdown.fallbacks.iter().enumerate() {
        errors.extend(validate_fallback(i, fallback));
    }

    errors
}

fn validate_fallback(index: usize, fallback: &RawCommand) -> Vec<ValidationError> {
    let section = format!("shutdown.fallbacks[{index}]");
    let mut errors = Vec::new();

    if fallback.program.trim().is_empty() {
        errors.push(ValidationError::EmptyProgram {
            section: section.clone(),
        });
    }
    errors.extend(validate_placeholders(&section, &fallback.args));

    errors
}

fn validate_placeholders(section: &str, args: &[String]) -> Vec<ValidationError> {
    let spec = curfew_api::CommandSpec::new("", args.iter().cloned());
    spec.placeholders()
        .into_iter()
        .filter(|name| !SHUTDOWN_PLACEHOLDERS.contains(name))
        .map(|name| ValidationError::UnknownPlaceholder {
            section: section.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Parse an inspection failure policy name
pub fn parse_inspection_failure(value: &str) -> Result<InspectionFailurePolicy, ValidationError> {
    match value.to_lowercase().as_str() {
        "assume_no_sessions" => Ok(InspectionFailurePolicy::AssumeNoSessions),
        "assume_exempt" => Ok(InspectionFailurePolicy::AssumeExempt),
        other => Err(ValidationError::UnknownValue {
            field: "guard.inspection_failure".into(),
            value: other.to_string(),
        }),
    }
}

/// Parse a fallback strategy name
pub fn parse_fallback_strategy(value: &str) -> Result<FallbackStrategy, ValidationError> {
    match value.to_lowercase().as_str() {
        "first_success" => Ok(FallbackStrategy::FirstSuccess),
        "broadcast" => Ok(FallbackStrategy::Broadcast),
        other => Err(ValidationError::UnknownValue {
            field: "shutdown.strategy".into(),
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> RawConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = parse("config_version = 1");
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_parse_inspection_failure() {
        assert_eq!(
            parse_inspection_failure("assume_no_sessions").unwrap(),
            InspectionFailurePolicy::AssumeNoSessions
        );
        assert_eq!(
            parse_inspection_failure("Assume_Exempt").unwrap(),
            InspectionFailurePolicy::AssumeExempt
        );
        assert!(parse_inspection_failure("panic").is_err());
    }

    #[test]
    fn test_parse_fallback_strategy() {
        assert_eq!(
            parse_fallback_strategy("first_success").unwrap(),
            FallbackStrategy::FirstSuccess
        );
        assert_eq!(
            parse_fallback_strategy("broadcast").unwrap(),
            FallbackStrategy::Broadcast
        );
        assert!(parse_fallback_strategy("all").is_err());
    }

    #[test]
    fn test_zero_durations_rejected() {
        let config = parse(
            r#"
            config_version = 1
            [guard]
            tick_interval_seconds = 0
            [sessions]
            timeout_seconds = 0
        "#,
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::ZeroDuration { .. })));
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let config = parse(
            r#"
            config_version = 1
            [shutdown]
            args = ["-h", "+{minutes}", "{message}"]

            [[shutdown.fallbacks]]
            program = "poweroff"
            args = ["{force}"]
        "#,
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::UnknownPlaceholder { name, .. } if name == "minutes"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::UnknownPlaceholder { section, name }
                if section == "shutdown.fallbacks[0]" && name == "force"
        )));
    }

    #[test]
    fn test_empty_programs_rejected() {
        let config = parse(
            r#"
            config_version = 1
            [sessions]
            program = ""
            [[shutdown.fallbacks]]
            program = "  "
        "#,
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::EmptyProgram { .. })));
    }

    #[test]
    fn test_unknown_strategy_reported() {
        let config = parse(
            r#"
            config_version = 1
            [shutdown]
            strategy = "everything"
        "#,
        );

        let errors = validate_config(&config);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::UnknownValue { value, .. }] if value == "everything"
        ));
    }
}
