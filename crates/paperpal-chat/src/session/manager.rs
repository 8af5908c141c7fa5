//! ChatSession struct, open/close and accessors.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use paperpal_common::sync::lock;
use paperpal_common::{ScheduledTask, Subscribers, Subscription};
use paperpal_config::PaperPalConfig;

use crate::{AnswerProvider, ChatContext, ChatError, PdfService};

use super::types::{SessionEvent, SessionListener};

/// Assistant reply used when the answer service fails.
pub const FALLBACK_REPLY: &str = "抱歉，我暂时无法回答这个问题。请稍后再试。";

/// Prefixes the offline extraction when a quick command cannot be answered.
pub const QUICK_COMMAND_FALLBACK_PREFIX: &str =
    "⚠️ 在线服务暂时不可用，以下是根据摘要离线提取的结果：\n\n";

pub const DEFAULT_PDF_POLL_INTERVAL: Duration = Duration::from_millis(2_000);

pub(super) struct Inner {
    pub(super) context: Option<ChatContext>,
    /// Bumped on every open and close.
    pub(super) generation: u64,
    pub(super) poller: Option<ScheduledTask>,
    /// Generation of the context whose request awaits a reply.
    pub(super) busy_generation: Option<u64>,
}

impl Inner {
    /// Stop polling and drop the current context.
    fn teardown(&mut self) -> Option<ChatContext> {
        self.generation = self.generation.wrapping_add(1);
        self.busy_generation = None;
        if let Some(mut poller) = self.poller.take() {
            poller.cancel();
        }
        self.context.take()
    }
}

pub(super) struct Shared {
    pub(super) inner: Mutex<Inner>,
    pub(super) answers: Arc<dyn AnswerProvider>,
    pub(super) pdf: Arc<dyn PdfService>,
    pub(super) poll_interval: Duration,
    listeners: Subscribers<SessionListener>,
}

/// Cheaply cloneable handle to the chat session.
#[derive(Clone)]
pub struct ChatSession {
    pub(super) shared: Arc<Shared>,
}

impl ChatSession {
    pub fn new(
        answers: Arc<dyn AnswerProvider>,
        pdf: Arc<dyn PdfService>,
        poll_interval: Duration,
    ) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            DEFAULT_PDF_POLL_INTERVAL
        } else {
            poll_interval
        };
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    context: None,
                    generation: 0,
                    poller: None,
                    busy_generation: None,
                }),
                answers,
                pdf,
                poll_interval,
                listeners: Subscribers::new(),
            }),
        }
    }

    pub fn from_config(
        answers: Arc<dyn AnswerProvider>,
        pdf: Arc<dyn PdfService>,
        config: &PaperPalConfig,
    ) -> Self {
        Self::new(
            answers,
            pdf,
            Duration::from_millis(config.chat.pdf_poll_interval_ms),
        )
    }

    /// Open a chat on a paper, replacing any context that is already open.
    ///
    /// With a PDF URL, processing is kicked off in the background and its
    /// status is polled until it completes or fails.
    pub fn open(
        &self,
        paper_id: impl Into<String>,
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        pdf_url: Option<String>,
    ) -> Result<(), ChatError> {
        let abstract_text = abstract_text.into();
        if abstract_text.trim().is_empty() {
            return Err(ChatError::InvalidInput("paper abstract is empty".into()));
        }
        let paper_id = paper_id.into();
        let title = title.into();
        let pdf_url = pdf_url.filter(|url| !url.trim().is_empty());

        let previous = {
            let mut inner = lock(&self.shared.inner);
            let previous = inner.teardown();
            inner.context = Some(ChatContext::new(
                paper_id.clone(),
                title.clone(),
                abstract_text,
                pdf_url.clone(),
            ));
            if let Some(url) = &pdf_url {
                self.start_pdf_processing(&mut inner, &paper_id, url);
            }
            previous
        };

        if let Some(old) = previous {
            info!(paper_id = %old.paper_id, "replacing open chat");
            self.notify(&SessionEvent::Closed {
                paper_id: old.paper_id,
            });
        }
        info!(paper_id = %paper_id, has_pdf = pdf_url.is_some(), "chat opened");
        self.notify(&SessionEvent::Opened { paper_id, title });
        Ok(())
    }

    /// Discard the context and stop polling. No-op when already closed.
    pub fn close(&self) {
        let closed = lock(&self.shared.inner).teardown();
        if let Some(old) = closed {
            info!(paper_id = %old.paper_id, "chat closed");
            self.notify(&SessionEvent::Closed {
                paper_id: old.paper_id,
            });
        }
    }

    /// Snapshot of the open context.
    pub fn context(&self) -> Option<ChatContext> {
        lock(&self.shared.inner).context.clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.shared.inner).context.is_some()
    }

    /// Whether a request is awaiting its reply.
    pub fn is_sending(&self) -> bool {
        let inner = lock(&self.shared.inner);
        inner.busy_generation == Some(inner.generation)
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.shared.inner)
            .poller
            .as_ref()
            .is_some_and(ScheduledTask::is_active)
    }

    pub fn poll_interval(&self) -> Duration {
        self.shared.poll_interval
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.shared.listeners.add(Arc::new(listener))
    }

    /// Close and drop every listener.
    pub fn dispose(&self) {
        self.close();
        self.shared.listeners.clear();
    }

    pub(super) fn notify(&self, event: &SessionEvent) {
        for listener in self.shared.listeners.snapshot() {
            listener(event);
        }
    }
}
