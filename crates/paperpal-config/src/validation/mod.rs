//! Full configuration validation.
//!
//! Validates numeric ranges and the backend URL. Each domain has its own
//! submodule; this orchestrator calls them all and collects errors into a
//! single `ConfigError`.

mod backend;
mod helpers;
mod timing;


use crate::schema::PaperPalConfig;
use paperpal_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &PaperPalConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    timing::validate_avatar(&mut errors, config);
    timing::validate_notifications(&mut errors, config);
    timing::validate_chat(&mut errors, config);
    backend::validate_backend(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
