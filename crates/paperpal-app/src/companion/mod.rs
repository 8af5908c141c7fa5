//! The companion: owns the avatar, the bubble queue and the chat session,
//! feeds new-paper notifications into them and republishes every change on
//! the event bus.

mod feed;
mod pdf_url;
mod seen;


use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use paperpal_avatar::{AvatarStateMachine, BubbleMessage, BubbleQueue, TransitionTrigger};
use paperpal_chat::{
    AnswerProvider, ChatError, ChatMessage, ChatSession, NotificationDto, PdfService,
    SessionEvent,
};
use paperpal_common::sync::lock;
use paperpal_common::{AvatarState, Event, EventBus, PaperSource, Subscription};
use paperpal_config::PaperPalConfig;

pub use feed::PaperFeed;
pub use pdf_url::derive_pdf_url;

use seen::SeenIds;

/// How many recent notification ids are remembered for deduplication.
const SEEN_CAPACITY: usize = 1024;

pub struct Companion {
    avatar: AvatarStateMachine,
    bubbles: BubbleQueue,
    chat: ChatSession,
    feed: Arc<dyn PaperFeed>,
    bus: EventBus,
    min_score: f64,
    poll_interval: Duration,
    seen: Mutex<SeenIds>,
    subscriptions: Vec<Subscription>,
}

impl Companion {
    pub fn new(
        config: &PaperPalConfig,
        feed: Arc<dyn PaperFeed>,
        answers: Arc<dyn AnswerProvider>,
        pdf: Arc<dyn PdfService>,
        bus: EventBus,
    ) -> Self {
        let mut companion = Self {
            avatar: AvatarStateMachine::from_config(config),
            bubbles: BubbleQueue::from_config(config),
            chat: ChatSession::from_config(answers, pdf, config),
            feed,
            bus,
            min_score: config.notifications.min_score,
            poll_interval: Duration::from_millis(config.notifications.poll_interval_ms),
            seen: Mutex::new(SeenIds::new(SEEN_CAPACITY)),
            subscriptions: Vec::new(),
        };
        companion.wire();
        companion
    }

    fn wire(&mut self) {
        let bus = self.bus.clone();
        let avatar_sub = self.avatar.subscribe(move |state, previous| {
            bus.publish(Event::AvatarStateChanged { state, previous });
        });

        let avatar = self.avatar.clone();
        let queue = self.bubbles.clone();
        let realert_sub = self.avatar.subscribe(move |state, _| {
            if state == AvatarState::Idle && queue.current().is_some() {
                avatar.transition(TransitionTrigger::NewPaper);
            }
        });

        let bus = self.bus.clone();
        let avatar = self.avatar.clone();
        // Holds the queue from inside its own listener; `shutdown` breaks the cycle.
        let queue = self.bubbles.clone();
        let bubble_sub = self.bubbles.subscribe(move |current| match current {
            Some(message) => {
                bus.publish(Event::BubbleShown {
                    id: message.id().to_string(),
                    paper_id: message.paper_id().to_string(),
                    content: message.content().to_string(),
                    pending: queue.pending_len(),
                });
            }
            None => {
                bus.publish(Event::BubbleCleared);
                // Nothing left to announce.
                if avatar.state() == AvatarState::Alert {
                    avatar.transition(TransitionTrigger::Dismiss);
                }
            }
        });

        let bus = self.bus.clone();
        let click_sub = self.bubbles.on_click(move |paper_id| {
            bus.publish(Event::BubbleClicked {
                paper_id: paper_id.to_string(),
            });
        });

        let bus = self.bus.clone();
        let chat_sub = self.chat.subscribe(move |event| {
            bus.publish(session_event(event));
        });

        self.subscriptions
            .extend([avatar_sub, realert_sub, bubble_sub, click_sub, chat_sub]);
    }

    pub fn avatar(&self) -> &AvatarStateMachine {
        &self.avatar
    }

    pub fn bubbles(&self) -> &BubbleQueue {
        &self.bubbles
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    /// Queue bubbles for notifications that clear the score threshold and
    /// have not been seen before. Returns how many were queued.
    pub fn ingest(&self, notifications: &[NotificationDto]) -> usize {
        let messages: Vec<BubbleMessage> = {
            let mut seen = lock(&self.seen);
            notifications
                .iter()
                .filter(|n| {
                    if n.score < self.min_score {
                        debug!(id = %n.id, score = n.score, "notification below threshold");
                        return false;
                    }
                    seen.insert(&n.id)
                })
                .filter_map(to_bubble)
                .collect()
        };

        let queued = messages.len();
        if queued > 0 {
            self.bubbles.enqueue_all(messages);
            self.avatar.transition(TransitionTrigger::NewPaper);
        }
        queued
    }

    /// Fetch pending notifications, queue them and acknowledge every one
    /// fetched so the backend stops serving them.
    pub async fn poll_notifications(&self) -> Result<usize, ChatError> {
        let notifications = self.feed.pending().await?;
        let queued = self.ingest(&notifications);

        for notification in &notifications {
            if let Err(e) = self.feed.acknowledge(&notification.id).await {
                warn!(id = %notification.id, error = %e, "failed to acknowledge notification");
            }
        }
        if queued > 0 {
            info!(queued, pending = self.bubbles.pending_len(), "new papers queued");
        }
        Ok(queued)
    }

    /// Poll the feed every `notifications.poll_interval_ms` until cancelled.
    pub async fn run_notification_poller(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_notifications().await {
                        warn!(error = %e, "notification poll failed");
                    }
                }
            }
        }
        debug!("notification poller stopped");
    }

    /// Click the shown bubble: the avatar becomes active and a chat opens
    /// on its paper. Returns the paper id, or `None` with no bubble shown.
    pub async fn click_bubble(&self) -> Option<String> {
        self.bubbles.current()?;
        // Activate first so the queue emptying does not send the avatar idle.
        self.avatar.transition(TransitionTrigger::Click);
        let clicked = self.bubbles.click()?;
        let paper_id = clicked.paper_id().to_string();

        if let Err(e) = self.open_paper(&paper_id).await {
            warn!(paper_id = %paper_id, error = %e, "failed to open chat for clicked paper");
        }
        Some(paper_id)
    }

    /// Open a chat on a paper looked up from the feed.
    pub async fn open_paper(&self, paper_id: &str) -> Result<(), ChatError> {
        let paper = self.feed.paper(paper_id).await?;
        let pdf_url = derive_pdf_url(&paper);
        self.chat
            .open(paper_id, paper.title, paper.abstract_text, pdf_url)?;
        self.activate();
        Ok(())
    }

    /// Open a chat on a paper whose details the caller already has.
    pub fn open_direct(
        &self,
        paper_id: &str,
        title: &str,
        abstract_text: &str,
        pdf_url: Option<String>,
    ) -> Result<(), ChatError> {
        self.chat.open(paper_id, title, abstract_text, pdf_url)?;
        self.activate();
        Ok(())
    }

    fn activate(&self) {
        if !self.avatar.transition(TransitionTrigger::Click) {
            self.avatar.reset_idle_timer();
        }
    }

    /// Dismiss the shown bubble and reveal the next one.
    pub fn dismiss_bubble(&self) -> Option<BubbleMessage> {
        self.bubbles.dismiss()
    }

    pub fn close_chat(&self) {
        self.chat.close();
        if self.avatar.state() == AvatarState::Active {
            self.avatar.transition(TransitionTrigger::Dismiss);
        }
    }

    /// Send user input to the open chat, keeping the avatar awake while
    /// the reply is pending.
    pub async fn submit(&self, input: &str) -> Option<ChatMessage> {
        self.avatar.reset_idle_timer();
        let reply = self.chat.submit(input).await;
        if reply.is_some() {
            self.avatar.reset_idle_timer();
        }
        reply
    }

    /// Tear everything down and announce shutdown.
    pub fn shutdown(&self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
        self.chat.dispose();
        self.bubbles.dispose();
        self.avatar.dispose();
        self.bus.publish(Event::Shutdown);
        info!("companion shut down");
    }
}

fn to_bubble(notification: &NotificationDto) -> Option<BubbleMessage> {
    let source = match notification.source.parse::<PaperSource>() {
        Ok(source) => source,
        Err(e) => {
            warn!(id = %notification.id, error = %e, "skipping notification with unknown source");
            return None;
        }
    };
    let mut message = BubbleMessage::new(
        notification.paper_id.as_str(),
        source,
        notification.title.as_str(),
        notification.score,
    )
    .with_id(notification.id.as_str());
    if let Some(created_at) = notification.created_at() {
        message = message.with_created_at(created_at);
    }
    Some(message)
}

fn session_event(event: &SessionEvent) -> Event {
    match event {
        SessionEvent::Opened { paper_id, title } => Event::ChatOpened {
            paper_id: paper_id.clone(),
            title: title.clone(),
        },
        SessionEvent::Closed { paper_id } => Event::ChatClosed {
            paper_id: paper_id.clone(),
        },
        SessionEvent::MessageAppended { paper_id, message } => Event::ChatMessage {
            paper_id: paper_id.clone(),
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        },
        SessionEvent::PdfStatusUpdated { paper_id, status } => Event::PdfStatusUpdated {
            paper_id: paper_id.clone(),
            progress: status.progress,
            complete: status.is_complete,
            error: status
                .error_message
                .clone()
                .filter(|message| !message.trim().is_empty()),
        },
    }
}
