//! Error types for the Hack assembler
//!
//! Unifies parser errors, I/O errors, and address-range violations behind
//! a single enum so `main.rs` has one place to format and exit on.

use std::fmt;

use crate::parser::ParserError;

#[derive(Debug)]
pub enum AssemblerError {
    Parser(ParserError),
    Io(std::io::Error),
    /// A decimal A-instruction operand (or an allocated variable address)
    /// exceeded the 15-bit address space.
    AddressOverflow(String),
    /// Input path did not end in `.asm`.
    InvalidExtension(String),
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parser(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::AddressOverflow(symbol) => {
                write!(f, "address out of range (0..=32767): {symbol}")
            }
            Self::InvalidExtension(path) => {
                write!(f, "expected a .asm file, got: {path}")
            }
        }
    }
}

impl std::error::Error for AssemblerError {}

impl From<ParserError> for AssemblerError {
    fn from(error: ParserError) -> Self {
        Self::Parser(error)
    }
}

impl From<std::io::Error> for AssemblerError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}
