//! Error type for the Jack compiler

use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum JackError {
    UnterminatedBlockComment { line: usize },
    UnterminatedString { line: usize },
    IntegerOutOfRange { line: usize, text: String },
    UnexpectedChar { line: usize, ch: char },
    UnexpectedToken { line: usize, expected: String, found: String },
    UnexpectedEof { expected: String },
    UnresolvedIdentifier { line: usize, name: String },
    InvalidExtension(String),
    Io(String),
}

impl fmt::Display for JackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedBlockComment { line } => {
                write!(f, "line {line}: unterminated block comment")
            }
            Self::UnterminatedString { line } => {
                write!(f, "line {line}: unterminated string constant")
            }
            Self::IntegerOutOfRange { line, text } => {
                write!(f, "line {line}: integer constant out of range: {text}")
            }
            Self::UnexpectedChar { line, ch } => {
                write!(f, "line {line}: unexpected character '{ch}'")
            }
            Self::UnexpectedToken { line, expected, found } => {
                write!(f, "line {line}: expected {expected}, found {found}")
            }
            Self::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            Self::UnresolvedIdentifier { line, name } => {
                write!(f, "line {line}: '{name}' is not a declared variable or class name")
            }
            Self::InvalidExtension(path) => write!(f, "{path}: expected a .jack file"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for JackError {}

impl From<std::io::Error> for JackError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}
