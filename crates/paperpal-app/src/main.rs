mod cli;
mod companion;
mod terminal;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

use paperpal_chat::BackendClient;
use paperpal_common::{EventBus, PaperPalError};
use paperpal_config::{config_to_json, PaperPalConfig};

use crate::cli::Args;
use crate::companion::Companion;

const DEFAULT_LOG_DIRECTIVE: &str = "paperpal=info";
const EVENT_BUS_CAPACITY: usize = 256;

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!("panic: {info}");
        eprintln!("\n--- Paper Pal crashed ---");
        eprintln!("Re-run with --log-level paperpal=debug and include the log when reporting.");
        eprintln!("-------------------------\n");
        default_hook(info);
    }));
}

/// Load environment variables from a .env file (KEY=VALUE lines).
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        // Workspace root, two levels up from crates/paperpal-app/
        manifest_dir.join("..").join("..").join(".env"),
        std::path::PathBuf::from(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

/// Falls back to defaults when the file cannot be used, returning why.
fn load_config(args: &Args) -> (PaperPalConfig, Option<PaperPalError>) {
    let loaded = match &args.config {
        Some(path) => paperpal_config::load_config_from(Path::new(path)),
        None => paperpal_config::load_config(),
    };
    let (mut config, problem) = match loaded {
        Ok(config) => (config, None),
        Err(e) => (PaperPalConfig::default(), Some(e.into())),
    };
    if let Some(url) = &args.backend_url {
        config.backend.base_url = url.clone();
    }
    (config, problem)
}

fn init_logging(args: &Args, config: &PaperPalConfig) {
    let requested = args
        .log_level
        .clone()
        .unwrap_or_else(|| format!("paperpal={}", config.logging.level.as_directive()));
    let directive: Directive = match requested.parse() {
        Ok(directive) => directive,
        Err(_) => {
            eprintln!("invalid log level {requested:?}, using {DEFAULT_LOG_DIRECTIVE}");
            DEFAULT_LOG_DIRECTIVE
                .parse()
                .unwrap_or_else(|_| LevelFilter::INFO.into())
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    load_dotenv();
    install_panic_hook();

    let args = cli::parse();
    let (config, config_problem) = load_config(&args);
    init_logging(&args, &config);

    info!("Paper Pal starting");
    if let Some(problem) = config_problem {
        warn!(error = %problem, "failed to load config, using defaults");
    }
    tracing::debug!(config = %config_to_json(&config), "effective config");

    if let Err(e) = start(config, args) {
        error!(error = %e, "Paper Pal failed to start");
        std::process::exit(1);
    }
    info!("Paper Pal exited");
}

fn start(config: PaperPalConfig, args: Args) -> paperpal_common::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config, args))
}

async fn run(config: PaperPalConfig, args: Args) -> paperpal_common::Result<()> {
    let backend = BackendClient::from_config(&config)
        .map(Arc::new)
        .map_err(|e| PaperPalError::Network(e.to_string()))?;
    info!(base_url = backend.base_url(), "using backend");

    let bus = EventBus::new(EVENT_BUS_CAPACITY);
    let cancel = CancellationToken::new();
    let renderer = tokio::spawn(terminal::render_events(bus.subscribe(), cancel.clone()));

    let companion = Companion::new(&config, backend.clone(), backend.clone(), backend, bus);

    if let (Some(paper_id), Some(abstract_text)) = (&args.paper, &args.abstract_text) {
        if let Err(e) =
            companion.open_direct(paper_id, &args.title, abstract_text, args.pdf_url.clone())
        {
            warn!(paper_id = %paper_id, error = %e, "could not open chat from command line");
        }
    }

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted");
            interrupt.cancel();
        }
    });

    tokio::join!(
        companion.run_notification_poller(cancel.clone()),
        terminal::run(&companion, cancel.clone()),
    );

    companion.shutdown();
    if let Err(e) = renderer.await {
        warn!(error = %e, "renderer task failed");
    }
    Ok(())
}
