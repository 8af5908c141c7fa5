//! Line-oriented terminal front-end: reads commands from stdin and renders
//! bus events to stdout.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use paperpal_common::Event;

use crate::companion::Companion;

const HELP: &str = "\
commands:
  /click          open a chat on the shown bubble
  /dismiss        dismiss the shown bubble
  /open <id>      open a chat on a paper by id
  /close          close the chat
  /poll           check for new papers now
  /status         show avatar, bubbles and chat state
  /help           show this help
  /quit           exit
anything else is sent to the open chat (看公式 and 看代码链接 are quick commands)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Click,
    Dismiss,
    Open(String),
    Close,
    Poll,
    Status,
    Help,
    Quit,
    Say(String),
}

/// `None` for blank lines and `/open` without an id.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Say(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let command = match name {
        "click" => Command::Click,
        "dismiss" => Command::Dismiss,
        "open" if !arg.is_empty() => Command::Open(arg.to_string()),
        "open" => return None,
        "close" => Command::Close,
        "poll" => Command::Poll,
        "status" => Command::Status,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Say(line.to_string()),
    };
    Some(command)
}

/// Chat reply being awaited while the loop keeps reading input.
type PendingReply<'a> = Pin<Box<dyn Future<Output = ()> + 'a>>;

/// Read commands from stdin until `/quit`, end of input, or cancellation.
/// Cancels `cancel` on the way out so sibling loops stop too.
pub async fn run(companion: &Companion, cancel: CancellationToken) {
    run_with(companion, BufReader::new(tokio::io::stdin()), cancel).await;
}

async fn run_with<R>(companion: &Companion, input: R, cancel: CancellationToken)
where
    R: AsyncBufRead + Unpin,
{
    println!("{HELP}");
    let mut lines = input.lines();
    let mut reply: Option<PendingReply<'_>> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = async { if let Some(pending) = reply.as_mut() { pending.await } }, if reply.is_some() => {
                reply = None;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let Some(command) = parse_command(&line) else {
                        continue;
                    };
                    match command {
                        Command::Quit => break,
                        Command::Say(text) => {
                            if let Some(hint) = say_hint(companion, reply.is_some()) {
                                println!("{hint}");
                            } else {
                                reply = Some(Box::pin(async move {
                                    companion.submit(&text).await;
                                }));
                            }
                        }
                        command => {
                            tokio::select! {
                                _ = cancel.cancelled() => break,
                                _ = execute(companion, command) => {}
                            }
                        }
                    }
                }
                Ok(None) => {
                    // Let a reply to the last piped line land before exiting.
                    if let Some(pending) = reply.take() {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = pending => {}
                        }
                    }
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read from stdin");
                    break;
                }
            }
        }
    }
    cancel.cancel();
}

fn say_hint(companion: &Companion, awaiting_reply: bool) -> Option<&'static str> {
    if !companion.chat().is_open() {
        Some("(no chat open, use /click or /open <id>)")
    } else if awaiting_reply || companion.chat().is_sending() {
        Some("(still waiting for the previous reply)")
    } else {
        None
    }
}

async fn execute(companion: &Companion, command: Command) {
    match command {
        Command::Click => {
            if companion.click_bubble().await.is_none() {
                println!("(no bubble to click)");
            }
        }
        Command::Dismiss => {
            if companion.bubbles().current().is_none() {
                println!("(no bubble to dismiss)");
            } else {
                companion.dismiss_bubble();
            }
        }
        Command::Open(paper_id) => {
            if let Err(e) = companion.open_paper(&paper_id).await {
                println!("could not open {paper_id}: {e}");
            }
        }
        Command::Close => companion.close_chat(),
        Command::Poll => match companion.poll_notifications().await {
            Ok(0) => println!("(no new papers)"),
            Ok(_) => {}
            Err(e) => println!("poll failed: {e}"),
        },
        Command::Status => println!("{}", status_line(companion)),
        Command::Help => println!("{HELP}"),
        // Handled by the read loop.
        Command::Say(_) | Command::Quit => {}
    }
}

fn status_line(companion: &Companion) -> String {
    let bubble = companion
        .bubbles()
        .current()
        .map(|m| m.paper_id().to_string())
        .unwrap_or_else(|| "-".into());
    let chat = match companion.chat().context() {
        Some(ctx) => format!(
            "{} ({} messages, pdf {:.0}%{})",
            ctx.paper_id,
            ctx.history().len(),
            ctx.pdf_status.progress * 100.0,
            if ctx.is_pdf_processed() { ", ready" } else { "" },
        ),
        None => "closed".into(),
    };
    format!(
        "avatar: {} | bubble: {} (+{} pending) | chat: {}",
        companion.avatar().state(),
        bubble,
        companion.bubbles().pending_len(),
        chat,
    )
}

/// Print bus events until shutdown or cancellation.
pub async fn render_events(mut events: broadcast::Receiver<Event>, cancel: CancellationToken) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(Event::Shutdown) => break,
            Ok(event) => {
                if let Some(line) = render(&event) {
                    println!("{line}");
                }
            }
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "renderer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

pub fn render(event: &Event) -> Option<String> {
    let line = match event {
        Event::AvatarStateChanged { state, previous } => {
            format!("[avatar] {previous} -> {state}")
        }
        Event::BubbleShown {
            content, pending, ..
        } => {
            if *pending > 0 {
                format!("[bubble] {content}\n         (+{pending} more)")
            } else {
                format!("[bubble] {content}")
            }
        }
        Event::BubbleCleared => "[bubble] -".into(),
        Event::ChatOpened { paper_id, title } => format!("[chat] opened {paper_id}: {title}"),
        Event::ChatClosed { paper_id } => format!("[chat] closed {paper_id}"),
        Event::ChatMessage { role, content, .. } => format!("{role}> {content}"),
        Event::PdfStatusUpdated {
            progress,
            complete,
            error,
            ..
        } => match error {
            Some(error) => format!("[pdf] failed: {error}"),
            None if *complete => "[pdf] full text ready".into(),
            None => format!("[pdf] {:.0}%", progress * 100.0),
        },
        Event::BubbleClicked { .. } | Event::Shutdown | Event::Unknown => return None,
    };
    Some(line)
}
