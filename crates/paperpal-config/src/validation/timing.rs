//! Validation for timer and polling settings: avatar, notifications, chat.

use crate::schema::PaperPalConfig;

use super::helpers::{validate_range, validate_range_f64};

const HOUR_MS: u64 = 3_600_000;

/// Validate avatar constraints.
pub(crate) fn validate_avatar(errors: &mut Vec<String>, config: &PaperPalConfig) {
    validate_range(
        errors,
        "avatar.idle_timeout_ms",
        config.avatar.idle_timeout_ms,
        1_000,
        HOUR_MS,
    );
}

/// Validate notification constraints. An auto-dismiss of zero is allowed.
pub(crate) fn validate_notifications(errors: &mut Vec<String>, config: &PaperPalConfig) {
    validate_range(
        errors,
        "notifications.auto_dismiss_ms",
        config.notifications.auto_dismiss_ms,
        0,
        HOUR_MS,
    );
    validate_range(
        errors,
        "notifications.poll_interval_ms",
        config.notifications.poll_interval_ms,
        1_000,
        HOUR_MS,
    );
    validate_range_f64(
        errors,
        "notifications.min_score",
        config.notifications.min_score,
        0.0,
        20.0,
    );
}

/// Validate chat constraints.
pub(crate) fn validate_chat(errors: &mut Vec<String>, config: &PaperPalConfig) {
    validate_range(
        errors,
        "chat.pdf_poll_interval_ms",
        config.chat.pdf_poll_interval_ms,
        250,
        60_000,
    );
    validate_range(
        errors,
        "chat.history_limit",
        u64::from(config.chat.history_limit),
        0,
        200,
    );
}
