//! PDF processing kickoff and status polling.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use paperpal_common::sync::lock;
use paperpal_common::{spawn_task, ScheduledTask};

use crate::PdfProcessingStatus;

use super::manager::{ChatSession, Inner};
use super::types::SessionEvent;

impl ChatSession {
    /// Fire the kickoff request and start polling for the open context.
    pub(super) fn start_pdf_processing(&self, inner: &mut Inner, paper_id: &str, pdf_url: &str) {
        let pdf = Arc::clone(&self.shared.pdf);
        let (id, url) = (paper_id.to_string(), pdf_url.to_string());
        spawn_task(async move {
            match pdf.start_processing(&id, &url).await {
                Ok(()) => debug!(paper_id = %id, "PDF processing requested"),
                Err(e) => warn!(
                    paper_id = %id,
                    error = %e,
                    "PDF processing kickoff failed, answering from the abstract"
                ),
            }
        })
        .detach();

        let terminal = inner
            .context
            .as_ref()
            .is_some_and(|ctx| ctx.pdf_status.is_terminal());
        if !terminal {
            inner.poller = Some(self.spawn_poller(inner.generation, paper_id.to_string()));
        }
    }

    fn spawn_poller(&self, generation: u64, paper_id: String) -> ScheduledTask {
        let weak = Arc::downgrade(&self.shared);
        let pdf = Arc::clone(&self.shared.pdf);
        let period = self.shared.poll_interval;

        spawn_task(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let result = pdf.fetch_status(&paper_id).await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let session = ChatSession { shared };
                match result {
                    Ok(status) => {
                        if !session.apply_status(generation, status) {
                            break;
                        }
                    }
                    Err(e) => warn!(paper_id = %paper_id, error = %e, "PDF status poll failed"),
                }
            }
        })
    }

    /// Merge a polled status. Returns whether polling should continue.
    fn apply_status(&self, generation: u64, status: PdfProcessingStatus) -> bool {
        let paper_id = {
            let mut inner = lock(&self.shared.inner);
            if inner.generation != generation {
                return false;
            }
            let Some(context) = inner.context.as_mut() else {
                return false;
            };
            context.pdf_status = status.clone();
            let paper_id = context.paper_id.clone();
            if status.is_terminal() {
                if let Some(poller) = inner.poller.take() {
                    poller.detach();
                }
            }
            paper_id
        };

        if status.has_error() {
            warn!(
                paper_id = %paper_id,
                error = status.error_message.as_deref().unwrap_or_default(),
                "PDF processing failed, answering from the abstract"
            );
        } else if status.is_complete {
            info!(paper_id = %paper_id, chunks = status.total_chunks, "PDF processing complete");
        } else {
            debug!(paper_id = %paper_id, progress = status.progress, "PDF status updated");
        }

        let keep_polling = !status.is_terminal();
        self.notify(&SessionEvent::PdfStatusUpdated { paper_id, status });
        keep_polling
    }
}
