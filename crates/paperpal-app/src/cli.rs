use clap::Parser;

/// Paper Pal: a research-paper companion with an avatar, bubble
/// notifications and per-paper chat.
#[derive(Parser, Debug)]
#[command(name = "paperpal", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (debug, info, warn, error), or a full filter
    /// directive such as `paperpal=debug`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Backend base URL override.
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Open a chat on this paper id at startup.
    #[arg(long, requires = "abstract_text")]
    pub paper: Option<String>,

    /// Title of the paper given with `--paper`.
    #[arg(long, default_value = "")]
    pub title: String,

    /// Abstract of the paper given with `--paper`.
    #[arg(long = "abstract", id = "abstract_text")]
    pub abstract_text: Option<String>,

    /// PDF URL of the paper given with `--paper`.
    #[arg(long)]
    pub pdf_url: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
