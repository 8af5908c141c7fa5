//! Message and quick-command requests.

use tracing::{debug, warn};

use paperpal_common::sync::lock;

use crate::quick_command::{match_quick_command, offline_answer, QuickCommand};
use crate::reliability::annotate;
use crate::{ChatContext, ChatMessage, Role};

use super::manager::{ChatSession, FALLBACK_REPLY, QUICK_COMMAND_FALLBACK_PREFIX};
use super::types::{BusyGuard, SessionEvent};

impl ChatSession {
    /// Ask a free-form question about the open paper.
    ///
    /// Returns the appended assistant reply, or `None` when the session is
    /// closed, `content` is blank, another request is in flight, or the
    /// context changed before the reply arrived.
    pub async fn send_message(&self, content: &str) -> Option<ChatMessage> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        let _guard = BusyGuard::acquire(&self.shared.inner)?;
        let (generation, snapshot) = self.append_user(content)?;

        let reply = match self.shared.answers.answer(content, &snapshot).await {
            Ok(text) => annotate(&text, snapshot.is_pdf_processed()),
            Err(e) => {
                warn!(paper_id = %snapshot.paper_id, error = %e, "answer request failed");
                FALLBACK_REPLY.to_string()
            }
        };
        self.append_reply(generation, reply)
    }

    /// Run a quick command, falling back to offline extraction over the
    /// abstract when the answer service fails.
    pub async fn execute_quick_command(&self, command: QuickCommand) -> Option<ChatMessage> {
        let _guard = BusyGuard::acquire(&self.shared.inner)?;
        let (generation, snapshot) = self.append_user(command.as_str())?;

        let reply = match self.shared.answers.quick_command(command, &snapshot).await {
            Ok(text) => annotate(&text, snapshot.is_pdf_processed()),
            Err(e) => {
                warn!(paper_id = %snapshot.paper_id, %command, error = %e, "quick command failed, extracting offline");
                format!(
                    "{QUICK_COMMAND_FALLBACK_PREFIX}{}",
                    offline_answer(command, &snapshot.abstract_text)
                )
            }
        };
        self.append_reply(generation, reply)
    }

    /// Route user input to a quick command or a free-form message.
    pub async fn submit(&self, input: &str) -> Option<ChatMessage> {
        match match_quick_command(input) {
            Some(command) => self.execute_quick_command(command).await,
            None => self.send_message(input).await,
        }
    }

    fn append_user(&self, content: &str) -> Option<(u64, ChatContext)> {
        let (generation, snapshot, message) = {
            let mut inner = lock(&self.shared.inner);
            let generation = inner.generation;
            let context = inner.context.as_mut()?;
            let message = context.push(Role::User, content);
            (generation, context.clone(), message)
        };
        self.notify(&SessionEvent::MessageAppended {
            paper_id: snapshot.paper_id.clone(),
            message,
        });
        Some((generation, snapshot))
    }

    fn append_reply(&self, generation: u64, content: String) -> Option<ChatMessage> {
        let (paper_id, message) = {
            let mut inner = lock(&self.shared.inner);
            if inner.generation != generation {
                debug!("discarding reply for a closed chat");
                return None;
            }
            let context = inner.context.as_mut()?;
            (context.paper_id.clone(), context.push(Role::Assistant, content))
        };
        self.notify(&SessionEvent::MessageAppended {
            paper_id,
            message: message.clone(),
        });
        Some(message)
    }
}
