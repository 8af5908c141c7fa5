//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# Paper Pal Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[avatar]
# Milliseconds the avatar stays active without interaction.
# idle_timeout_ms = 30000          # 1000-3600000

[notifications]
# Milliseconds before the displayed bubble dismisses itself. 0 disables.
# auto_dismiss_ms = 60000          # 0-3600000
# How often to ask the backend for newly scored papers.
# poll_interval_ms = 15000         # 1000-3600000
# Drop notifications scoring below this.
# min_score = 0.0                  # 0-20

[chat]
# Milliseconds between PDF processing status polls.
# pdf_poll_interval_ms = 2000      # 250-60000
# Most recent messages sent along with each question.
# history_limit = 20               # 0-200

[backend]
# base_url = "http://127.0.0.1:8001"
# connect_timeout_secs = 5         # 1-60
# request_timeout_secs = 60        # 1-600

[logging]
# level = "INFO"                   # DEBUG, INFO, WARNING, ERROR
"##
}
