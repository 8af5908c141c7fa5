use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::reliability::{ABSTRACT_ONLY_NOTE, FULL_TEXT_NOTE};
use crate::{AnswerProvider, ChatContext, ChatError, PdfProcessingStatus, PdfService, QuickCommand, Role};

// ---- fakes ----

#[derive(Default)]
struct FakeAnswers {
    fail: bool,
    delay: Option<Duration>,
    /// (message, history length seen) per call.
    calls: Mutex<Vec<(String, usize)>>,
}

impl FakeAnswers {
    fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }
}

#[async_trait]
impl AnswerProvider for FakeAnswers {
    async fn answer(&self, message: &str, context: &ChatContext) -> Result<String, ChatError> {
        self.calls
            .lock()
            .unwrap()
            .push((message.to_string(), context.history().len()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ChatError::Network("connection refused".into()));
        }
        Ok(format!("reply to {message}"))
    }

    async fn quick_command(
        &self,
        command: QuickCommand,
        _context: &ChatContext,
    ) -> Result<String, ChatError> {
        if self.fail {
            return Err(ChatError::Unavailable("no model".into()));
        }
        Ok(format!("online {command}"))
    }
}

#[derive(Default)]
struct FakePdf {
    kickoff_fails: bool,
    kickoffs: AtomicUsize,
    polls: AtomicUsize,
    script: Mutex<VecDeque<Result<PdfProcessingStatus, ChatError>>>,
}

impl FakePdf {
    fn scripted(script: Vec<Result<PdfProcessingStatus, ChatError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }
}

#[async_trait]
impl PdfService for FakePdf {
    async fn start_processing(&self, _paper_id: &str, _pdf_url: &str) -> Result<(), ChatError> {
        self.kickoffs.fetch_add(1, Ordering::SeqCst);
        if self.kickoff_fails {
            return Err(ChatError::Http {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(())
    }

    async fn fetch_status(&self, _paper_id: &str) -> Result<PdfProcessingStatus, ChatError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(processing(0.5)))
    }
}

fn processing(progress: f64) -> PdfProcessingStatus {
    PdfProcessingStatus {
        is_processing: true,
        progress,
        ..Default::default()
    }
}

fn complete() -> PdfProcessingStatus {
    PdfProcessingStatus {
        is_complete: true,
        progress: 1.0,
        total_chunks: 12,
        processed_chunks: 12,
        ..Default::default()
    }
}

fn new_session(answers: Arc<FakeAnswers>, pdf: Arc<FakePdf>) -> ChatSession {
    ChatSession::new(answers, pdf, DEFAULT_PDF_POLL_INTERVAL)
}

fn contents(session: &ChatSession) -> Vec<(Role, String)> {
    session
        .context()
        .map(|ctx| {
            ctx.history()
                .iter()
                .map(|m| (m.role, m.content.clone()))
                .collect()
        })
        .unwrap_or_default()
}

// ---- open / close ----

#[tokio::test(start_paused = true)]
async fn open_builds_fresh_context() {
    let session = new_session(FakeAnswers::ok(), Arc::new(FakePdf::default()));
    session.open("p1", "Title", "X", None).unwrap();

    let ctx = session.context().unwrap();
    assert_eq!(ctx.abstract_text, "X");
    assert!(ctx.history().is_empty());
    assert!(!ctx.is_pdf_processed());
    assert!(!session.is_polling());
}

#[tokio::test(start_paused = true)]
async fn close_discards_context() {
    let session = new_session(FakeAnswers::ok(), Arc::new(FakePdf::default()));
    session.open("p1", "Title", "X", None).unwrap();
    session.send_message("hi").await;

    session.close();
    assert!(session.context().is_none());
    assert!(!session.is_open());

    session.open("p1", "Title", "X", None).unwrap();
    assert!(session.context().unwrap().history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn blank_abstract_is_rejected() {
    let session = new_session(FakeAnswers::ok(), Arc::new(FakePdf::default()));
    let err = session.open("p1", "Title", "   ", None).unwrap_err();
    assert!(matches!(err, ChatError::InvalidInput(_)));
    assert!(!session.is_open());
}

#[tokio::test(start_paused = true)]
async fn events_follow_lifecycle() {
    let session = new_session(FakeAnswers::ok(), Arc::new(FakePdf::default()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.subscribe(move |event| {
        let tag = match event {
            SessionEvent::Opened { .. } => "opened",
            SessionEvent::Closed { .. } => "closed",
            SessionEvent::MessageAppended { .. } => "message",
            SessionEvent::PdfStatusUpdated { .. } => "pdf",
        };
        sink.lock().unwrap().push(tag);
    });

    session.open("a", "A", "X", None).unwrap();
    session.send_message("hi").await;
    session.open("b", "B", "Y", None).unwrap();
    session.close();
    session.close();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["opened", "message", "message", "closed", "opened", "closed"]
    );
}

// ---- messages ----

#[tokio::test(start_paused = true)]
async fn send_appends_user_then_reply_with_disclaimer() {
    let answers = FakeAnswers::ok();
    let session = new_session(Arc::clone(&answers), Arc::new(FakePdf::default()));
    session.open("p1", "Title", "X", None).unwrap();

    let reply = session.send_message("  what is new?  ").await.unwrap();
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(
        reply.content,
        format!("reply to what is new?\n\n{ABSTRACT_ONLY_NOTE}")
    );
    assert_eq!(
        contents(&session),
        vec![
            (Role::User, "what is new?".to_string()),
            (Role::Assistant, reply.content.clone()),
        ]
    );
    // The collaborator sees the history including the new question.
    assert_eq!(*answers.calls.lock().unwrap(), vec![("what is new?".to_string(), 1)]);
}

#[tokio::test(start_paused = true)]
async fn failing_collaborator_yields_fallback() {
    let session = new_session(FakeAnswers::failing(), Arc::new(FakePdf::default()));
    session.open("p1", "Title", "X", None).unwrap();

    let reply = session.send_message("hi").await.unwrap();
    assert_eq!(reply.content, FALLBACK_REPLY);
    assert_eq!(
        contents(&session),
        vec![
            (Role::User, "hi".to_string()),
            (Role::Assistant, FALLBACK_REPLY.to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn blank_or_closed_send_is_noop() {
    let answers = FakeAnswers::ok();
    let session = new_session(Arc::clone(&answers), Arc::new(FakePdf::default()));
    assert!(session.send_message("hi").await.is_none());

    session.open("p1", "Title", "X", None).unwrap();
    assert!(session.send_message("   ").await.is_none());
    assert!(session.send_message("").await.is_none());
    assert!(contents(&session).is_empty());
    assert!(answers.calls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn history_grows_in_order() {
    let session = new_session(FakeAnswers::ok(), Arc::new(FakePdf::default()));
    session.open("p1", "Title", "X", None).unwrap();
    for q in ["one", "two", "three"] {
        session.send_message(q).await;
    }

    let ctx = session.context().unwrap();
    assert_eq!(ctx.history().len(), 6);
    let users: Vec<_> = ctx
        .history()
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(users, vec!["one", "two", "three"]);
    assert!(ctx
        .history()
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test(start_paused = true)]
async fn concurrent_send_is_rejected() {
    let session = new_session(FakeAnswers::slow(Duration::from_secs(1)), Arc::new(FakePdf::default()));
    session.open("p1", "Title", "X", None).unwrap();

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.send_message("first").await })
    };
    tokio::task::yield_now().await;
    assert!(session.is_sending());

    assert!(session.send_message("second").await.is_none());
    assert!(first.await.unwrap().is_some());
    assert!(!session.is_sending());

    let users: Vec<_> = contents(&session)
        .into_iter()
        .filter(|(role, _)| *role == Role::User)
        .map(|(_, c)| c)
        .collect();
    assert_eq!(users, vec!["first"]);
}

#[tokio::test(start_paused = true)]
async fn late_reply_for_closed_context_is_discarded() {
    let session = new_session(FakeAnswers::slow(Duration::from_secs(1)), Arc::new(FakePdf::default()));
    session.open("p1", "Title", "X", None).unwrap();

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.send_message("hi").await })
    };
    tokio::task::yield_now().await;

    session.close();
    session.open("p2", "Other", "Y", None).unwrap();

    assert!(pending.await.unwrap().is_none());
    let ctx = session.context().unwrap();
    assert_eq!(ctx.paper_id, "p2");
    assert!(ctx.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn pending_reply_on_closed_context_does_not_block_next_paper() {
    let answers = FakeAnswers::slow(Duration::from_secs(60));
    let session = new_session(Arc::clone(&answers), Arc::new(FakePdf::default()));
    session.open("p1", "Title", "X", None).unwrap();

    let stale = {
        let session = session.clone();
        tokio::spawn(async move { session.send_message("hi").await })
    };
    tokio::task::yield_now().await;
    assert!(session.is_sending());

    session.close();
    assert!(!session.is_sending());
    session.open("p2", "Other", "Y", None).unwrap();
    assert!(!session.is_sending());

    tokio::time::sleep(Duration::from_secs(30)).await;
    let fresh = {
        let session = session.clone();
        tokio::spawn(async move { session.send_message("question on p2").await })
    };
    tokio::task::yield_now().await;
    assert!(session.is_sending());
    assert_eq!(
        contents(&session),
        vec![(Role::User, "question on p2".to_string())]
    );

    // The p1 request settles first and must not release p2's mark.
    assert!(stale.await.unwrap().is_none());
    assert!(session.is_sending());
    assert!(session.send_message("again").await.is_none());

    let reply = fresh.await.unwrap().unwrap();
    assert!(reply.content.starts_with("reply to question on p2"));
    assert!(!session.is_sending());
    assert_eq!(contents(&session).len(), 2);
}

// ---- quick commands ----

#[tokio::test(start_paused = true)]
async fn submit_routes_quick_commands() {
    let answers = FakeAnswers::ok();
    let session = new_session(Arc::clone(&answers), Arc::new(FakePdf::default()));
    session.open("p1", "Title", "X", None).unwrap();

    let reply = session.submit("看公式 ").await.unwrap();
    assert!(reply.content.starts_with("online 看公式"));
    assert!(answers.calls.lock().unwrap().is_empty());

    session.submit("看公式!").await.unwrap();
    assert_eq!(answers.calls.lock().unwrap().len(), 1);

    let users: Vec<_> = contents(&session)
        .into_iter()
        .filter(|(role, _)| *role == Role::User)
        .map(|(_, c)| c)
        .collect();
    assert_eq!(users, vec!["看公式", "看公式!"]);
}

#[tokio::test(start_paused = true)]
async fn failed_quick_command_extracts_offline() {
    let session = new_session(FakeAnswers::failing(), Arc::new(FakePdf::default()));
    session
        .open(
            "p1",
            "Title",
            "Code is at https://github.com/acme/widget.",
            None,
        )
        .unwrap();

    let reply = session
        .execute_quick_command(QuickCommand::CodeLink)
        .await
        .unwrap();
    assert!(reply.content.starts_with(QUICK_COMMAND_FALLBACK_PREFIX));
    assert!(reply.content.contains("https://github.com/acme/widget"));
    assert_ne!(reply.content, FALLBACK_REPLY);
}

// ---- PDF processing ----

#[tokio::test(start_paused = true)]
async fn pdf_polling_runs_until_complete() {
    let pdf = FakePdf::scripted(vec![Ok(processing(0.3)), Ok(complete())]);
    let session = new_session(FakeAnswers::ok(), Arc::clone(&pdf));
    session
        .open("p1", "Title", "X", Some("https://arxiv.org/pdf/1".into()))
        .unwrap();
    tokio::task::yield_now().await;
    assert_eq!(pdf.kickoffs.load(Ordering::SeqCst), 1);
    assert!(session.is_polling());

    tokio::time::sleep(Duration::from_millis(2_100)).await;
    assert_eq!(pdf.polls.load(Ordering::SeqCst), 1);
    assert!((session.context().unwrap().pdf_status.progress - 0.3).abs() < f64::EPSILON);

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(pdf.polls.load(Ordering::SeqCst), 2);
    assert!(session.context().unwrap().is_pdf_processed());
    assert!(!session.is_polling());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(pdf.polls.load(Ordering::SeqCst), 2);

    let reply = session.send_message("hi").await.unwrap();
    assert!(reply.content.ends_with(FULL_TEXT_NOTE));
}

#[tokio::test(start_paused = true)]
async fn poll_errors_are_retried() {
    let pdf = FakePdf::scripted(vec![
        Err(ChatError::Network("timeout".into())),
        Err(ChatError::Network("timeout".into())),
        Ok(complete()),
    ]);
    let session = new_session(FakeAnswers::ok(), Arc::clone(&pdf));
    session
        .open("p1", "Title", "X", Some("https://arxiv.org/pdf/1".into()))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(6_100)).await;
    assert_eq!(pdf.polls.load(Ordering::SeqCst), 3);
    assert!(session.context().unwrap().is_pdf_processed());
    assert!(!session.is_polling());
}

#[tokio::test(start_paused = true)]
async fn error_status_stops_polling() {
    let pdf = FakePdf::scripted(vec![Ok(PdfProcessingStatus {
        error_message: Some("download failed".into()),
        ..Default::default()
    })]);
    let session = new_session(FakeAnswers::ok(), Arc::clone(&pdf));
    session
        .open("p1", "Title", "X", Some("https://arxiv.org/pdf/1".into()))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(pdf.polls.load(Ordering::SeqCst), 1);
    assert!(!session.is_polling());

    let reply = session.send_message("hi").await.unwrap();
    assert!(reply.content.ends_with(ABSTRACT_ONLY_NOTE));
}

#[tokio::test(start_paused = true)]
async fn close_stops_polling() {
    let pdf = Arc::new(FakePdf::default());
    let session = new_session(FakeAnswers::ok(), Arc::clone(&pdf));
    session
        .open("p1", "Title", "X", Some("https://arxiv.org/pdf/1".into()))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(4_100)).await;
    assert_eq!(pdf.polls.load(Ordering::SeqCst), 2);

    session.close();
    assert!(!session.is_polling());
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(pdf.polls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn kickoff_failure_keeps_session_usable() {
    let pdf = Arc::new(FakePdf {
        kickoff_fails: true,
        ..Default::default()
    });
    let session = new_session(FakeAnswers::ok(), Arc::clone(&pdf));
    session
        .open("p1", "Title", "X", Some("https://arxiv.org/pdf/1".into()))
        .unwrap();
    tokio::task::yield_now().await;
    assert_eq!(pdf.kickoffs.load(Ordering::SeqCst), 1);

    let reply = session.send_message("hi").await.unwrap();
    assert!(reply.content.ends_with(ABSTRACT_ONLY_NOTE));
}

#[tokio::test(start_paused = true)]
async fn blank_pdf_url_skips_processing() {
    let pdf = Arc::new(FakePdf::default());
    let session = new_session(FakeAnswers::ok(), Arc::clone(&pdf));
    session.open("p1", "Title", "X", Some("  ".into())).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(pdf.kickoffs.load(Ordering::SeqCst), 0);
    assert_eq!(pdf.polls.load(Ordering::SeqCst), 0);
    assert!(session.context().unwrap().pdf_url.is_none());
}
