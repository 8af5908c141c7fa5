//! Quick-command shortcuts typed into the chat box.
//!
//! Exactly two literals are recognised. Matching is exact string equality
//! after trimming surrounding whitespace.

mod extract;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use extract::{extract_code_links, extract_formulas, offline_answer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuickCommand {
    #[serde(rename = "看公式")]
    Formula,
    #[serde(rename = "看代码链接")]
    CodeLink,
}

impl QuickCommand {
    pub const ALL: [QuickCommand; 2] = [QuickCommand::Formula, QuickCommand::CodeLink];

    /// The literal the user types.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuickCommand::Formula => "看公式",
            QuickCommand::CodeLink => "看代码链接",
        }
    }
}

impl fmt::Display for QuickCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn match_quick_command(input: &str) -> Option<QuickCommand> {
    let input = input.trim();
    QuickCommand::ALL
        .into_iter()
        .find(|command| command.as_str() == input)
}
