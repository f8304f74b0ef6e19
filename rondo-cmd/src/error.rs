//! Argument and lookup errors
//!
//! Resolution failures during execution are not represented here; they are
//! reported through the execution context and never escape `exec`.

use thiserror::Error;

use crate::entry::CmdEntry;

/// Parse-time error for a single command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    /// Wrong arity or unknown flag
    #[error("usage: {}", usage_line(.name, .usage))]
    Usage {
        name: &'static str,
        usage: &'static str,
    },

    /// A numeric argument failed validation
    #[error("{what} {problem}")]
    Range {
        what: &'static str,
        problem: &'static str,
    },
}

impl ArgError {
    /// Usage error carrying an entry's name and usage template
    pub fn usage(entry: &CmdEntry) -> Self {
        Self::Usage {
            name: entry.name,
            usage: entry.usage,
        }
    }
}

fn usage_line(name: &str, usage: &str) -> String {
    if usage.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, usage)
    }
}

/// Failure to turn an argv into a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CmdError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("no command given")]
    Empty,

    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error(transparent)]
    Args(#[from] ArgError),
}
