// src/error.rs
//
// Every anomaly the scanner detects is fatal: once a delimiter of the embedded
// language is malformed, the position of everything after it is undefined.

use std::fmt;
use std::io;

use thiserror::Error;

/// Lexical region the scanner is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Markup,
    Code,
    Script,
    Style,
    Tag,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Region::Markup => "markup",
            Region::Code => "host code",
            Region::Script => "inline script",
            Region::Style => "inline style",
            Region::Tag => "markup tag",
        })
    }
}

/// Nested constructs a sub-scanner reads through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Construct {
    DoubleQuoted,
    SingleQuoted,
    CharLiteral,
    BlockComment,
    LineComment,
    Macro,
    PrintArgs,
    PrintfArgs,
    MarkupComment,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Construct::DoubleQuoted => "double-quoted string",
            Construct::SingleQuoted => "single-quoted string",
            Construct::CharLiteral => "single-quoted char",
            Construct::BlockComment => "multi-line comment",
            Construct::LineComment => "single-line comment",
            Construct::Macro => "macro",
            Construct::PrintArgs => "print-string arguments",
            Construct::PrintfArgs => "print-formatted arguments",
            Construct::MarkupComment => "html comment",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanError {
    #[error("eof while scanning {construct} ({region})")]
    Unterminated { construct: Construct, region: Region },

    #[error("unexpected newline in {construct} ({region})")]
    NewlineInString { construct: Construct, region: Region },

    #[error("invalid C single-quoted char")]
    InvalidCharLiteral,

    #[error("special char '<' => '&lt;' ?")]
    StrayTagStart,

    #[error("special char '>' => '&gt;' ?")]
    StrayTagEnd,

    #[error("reached maximum input size ({limit})")]
    LineTooLong { limit: usize },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{kind}")]
    Scan { kind: ScanError, line: usize },
}

impl Error {
    /// Line the error was detected on; zero when no line had been read yet.
    pub fn line(&self) -> usize {
        match self {
            Error::Io(_) => 0,
            Error::Scan { line, .. } => *line,
        }
    }

    pub fn scan_kind(&self) -> Option<&ScanError> {
        match self {
            Error::Io(_) => None,
            Error::Scan { kind, .. } => Some(kind),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
