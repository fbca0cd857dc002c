//! Error type for the VM translator

use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum VmError {
    Malformed(String),
    UnknownCommand(String),
    UnknownSegment(String),
    InvalidIndex(String),
    /// `pop constant ...` — constant is a read-only push-only segment.
    ConstantIsNotAssignable,
    Io(String),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(line) => write!(f, "malformed VM command: {line}"),
            Self::UnknownCommand(cmd) => write!(f, "unknown VM command: {cmd}"),
            Self::UnknownSegment(seg) => write!(f, "unknown segment: {seg}"),
            Self::InvalidIndex(text) => write!(f, "invalid index: {text}"),
            Self::ConstantIsNotAssignable => {
                write!(f, "cannot pop into the constant segment")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for VmError {}

impl From<std::io::Error> for VmError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}
