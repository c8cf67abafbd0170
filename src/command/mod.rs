//! Command tokenizer.
//!
//! A command is a single line starting with `#`: a token up to the first
//! space, then pipe-delimited parameters.
//!
//! ```text
//! #removerdogrupo Equipe Vendas|5511999999999
//! ```

pub mod dispatch;

pub use dispatch::{dispatch, known_commands, LinkTarget, Operation, Usage};

use serde::Serialize;

/// Default parameter separator.
pub const PARAM_SEPARATOR: char = '|';

/// A tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCommand {
    /// Lowercase token, including the leading '#'.
    pub command: String,
    pub params: Vec<String>,
}

impl ParsedCommand {
    /// Token without the leading '#'.
    pub fn name(&self) -> &str {
        self.command.trim_start_matches('#')
    }
}

/// Tokenize a line. `None` means the line is a literal message.
pub fn parse_command(line: &str) -> Option<ParsedCommand> {
    parse_with_separator(line, PARAM_SEPARATOR)
}

/// Tokenize a line splitting parameters on `separator`.
pub fn parse_with_separator(line: &str, separator: char) -> Option<ParsedCommand> {
    let line = line.trim();
    if !line.starts_with('#') {
        return None;
    }

    let (token, rest) = match line.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (line, ""),
    };

    let params = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(separator).map(|p| p.trim().to_string()).collect()
    };

    Some(ParsedCommand {
        command: token.to_lowercase(),
        params,
    })
}

/// Rebuild the command line for a parsed command.
pub fn build_command_string(parsed: &ParsedCommand) -> String {
    join_command(&parsed.command, &parsed.params, PARAM_SEPARATOR)
}

pub(crate) fn join_command(token: &str, params: &[String], separator: char) -> String {
    if params.is_empty() {
        token.to_string()
    } else {
        let sep = separator.to_string();
        format!("{} {}", token, params.join(sep.as_str()))
    }
}
