//! HTTP client for the Paper Pal backend.
//!
//! Implements [`crate::AnswerProvider`] and [`crate::PdfService`] over the
//! backend's REST API, plus the notification and paper endpoints used by
//! the companion.

mod api;
mod client;
mod types;

pub use client::BackendClient;
pub use types::{NotificationDto, PaperDto, PdfProcessResponse};
