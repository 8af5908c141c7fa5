//! Validation for the backend connection section.

use std::sync::LazyLock;

use regex::Regex;

use crate::schema::PaperPalConfig;

use super::helpers::validate_range;

static BASE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9.\-\[\]:]+(/\S*)?$").expect("static regex is valid")
});

/// Validate backend constraints.
pub(crate) fn validate_backend(errors: &mut Vec<String>, config: &PaperPalConfig) {
    if !BASE_URL_RE.is_match(&config.backend.base_url) {
        errors.push(format!(
            "backend.base_url = {:?} is not an http(s) URL",
            config.backend.base_url
        ));
    }
    validate_range(
        errors,
        "backend.connect_timeout_secs",
        u64::from(config.backend.connect_timeout_secs),
        1,
        60,
    );
    validate_range(
        errors,
        "backend.request_timeout_secs",
        u64::from(config.backend.request_timeout_secs),
        1,
        600,
    );
}
