//! Configuration validation
//!
//! Band ordering is deliberately not checked: overlapping or non-monotonic
//! bands are classified by whatever the stepping walk computes.

use crate::schema::{RawConfig, RawLevel, RawReaperConfig, RawSensor, RawThermalObject};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Object '{object}': {message}")]
    ObjectError { object: String, message: String },

    #[error("Object '{object}', level {level}: {message}")]
    LevelError {
        object: String,
        level: &'static str,
        message: String,
    },

    #[error("Reaper config error: {0}")]
    ReaperError(String),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.daemon.heartbeat_period_seconds == Some(0) {
        errors.push(ValidationError::GlobalError(
            "heartbeat_period_seconds must be positive".into(),
        ));
    }

    if config.daemon.request_timeout_seconds == Some(0) {
        errors.push(ValidationError::GlobalError(
            "request_timeout_seconds must be positive".into(),
        ));
    }

    for object in &config.objects {
        errors.extend(validate_object(object));
    }

    errors.extend(validate_reaper(&config.reaper));

    errors
}

fn validate_object(object: &RawThermalObject) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if object.name.is_empty() {
        errors.push(ValidationError::ObjectError {
            object: object.name.clone(),
            message: "name cannot be empty".into(),
        });
    } else if object.name.contains('/') {
        // The name becomes part of the tuning file name
        errors.push(ValidationError::ObjectError {
            object: object.name.clone(),
            message: "name cannot contain '/'".into(),
        });
    }

    match &object.sensor {
        RawSensor::Sysfs { path } => {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::ObjectError {
                    object: object.name.clone(),
                    message: "sensor path cannot be empty".into(),
                });
            }
        }
    }

    for (level, raw) in object.levels.ordered() {
        if let Some(message) = check_level(raw) {
            errors.push(ValidationError::LevelError {
                object: object.name.clone(),
                level,
                message,
            });
        }
    }

    errors
}

fn check_level(level: &RawLevel) -> Option<String> {
    match level.maxtime {
        Some(0) => Some("maxtime must be positive".into()),
        Some(maxtime) if maxtime < level.mintime => Some(format!(
            "maxtime {} is shorter than mintime {}",
            maxtime, level.mintime
        )),
        _ => None,
    }
}

fn validate_reaper(reaper: &RawReaperConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(path) = &reaper.helper_path
        && path.as_os_str().is_empty()
    {
        errors.push(ValidationError::ReaperError("helper_path cannot be empty".into()));
    }

    if let Some(users) = &reaper.users
        && users.is_empty()
    {
        errors.push(ValidationError::ReaperError(
            "users must name at least one account".into(),
        ));
    }

    if let Some(percent) = reaper.min_free_percent
        && percent > 100
    {
        errors.push(ValidationError::ReaperError(format!(
            "min_free_percent {} exceeds 100",
            percent
        )));
    }

    if reaper.check_interval_seconds == Some(0) {
        errors.push(ValidationError::ReaperError(
            "check_interval_seconds must be positive".into(),
        ));
    }

    errors
}
