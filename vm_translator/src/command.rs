//! VM command model
//!
//! Mirrors the assembler's approach to instructions: a small tagged
//! enum plus free functions that classify mnemonic strings via PHF,
//! rather than a class hierarchy dispatching on a type tag.

use phf::phf_map;

use crate::error::VmError;

/// The eight addressable VM memory segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Local,
    Argument,
    This,
    That,
    Constant,
    Static,
    Pointer,
    Temp,
}

static SEGMENT_MAP: phf::Map<&'static str, Segment> = phf_map! {
    "local" => Segment::Local,
    "argument" => Segment::Argument,
    "this" => Segment::This,
    "that" => Segment::That,
    "constant" => Segment::Constant,
    "static" => Segment::Static,
    "pointer" => Segment::Pointer,
    "temp" => Segment::Temp,
};

impl Segment {
    #[inline]
    #[must_use]
    pub fn from_str(segment: &str) -> Option<Self> {
        SEGMENT_MAP.get(segment).copied()
    }
}

/// The nine arithmetic/logical VM commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

static ARITHMETIC_MAP: phf::Map<&'static str, ArithmeticOp> = phf_map! {
    "add" => ArithmeticOp::Add,
    "sub" => ArithmeticOp::Sub,
    "neg" => ArithmeticOp::Neg,
    "eq" => ArithmeticOp::Eq,
    "gt" => ArithmeticOp::Gt,
    "lt" => ArithmeticOp::Lt,
    "and" => ArithmeticOp::And,
    "or" => ArithmeticOp::Or,
    "not" => ArithmeticOp::Not,
};

impl ArithmeticOp {
    #[inline]
    #[must_use]
    pub fn from_str(op: &str) -> Option<Self> {
        ARITHMETIC_MAP.get(op).copied()
    }

    /// The label prefix used for comparison ops (`eq_0`, `gt_1`, ...).
    /// Only meaningful for `Eq`/`Gt`/`Lt`.
    #[must_use]
    pub fn label_prefix(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            _ => "",
        }
    }
}

/// One parsed line of VM source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmCommand {
    Arithmetic(ArithmeticOp),
    Push(Segment, u16),
    Pop(Segment, u16),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function(String, u16),
    Call(String, u16),
    Return,
}

/// Parses one already-trimmed, comment-free VM command line.
pub fn parse_line(line: &str) -> Result<VmCommand, VmError> {
    let mut parts = line.split_whitespace();
    let head = parts
        .next()
        .ok_or_else(|| VmError::Malformed(line.to_string()))?;

    match head {
        "push" | "pop" => {
            let segment_str = parts
                .next()
                .ok_or_else(|| VmError::Malformed(line.to_string()))?;
            let index_str = parts
                .next()
                .ok_or_else(|| VmError::Malformed(line.to_string()))?;
            let segment = Segment::from_str(segment_str)
                .ok_or_else(|| VmError::UnknownSegment(segment_str.to_string()))?;
            let index = parse_index(index_str)?;
            if head == "push" {
                Ok(VmCommand::Push(segment, index))
            } else {
                Ok(VmCommand::Pop(segment, index))
            }
        }
        "label" => Ok(VmCommand::Label(expect_name(&mut parts, line)?)),
        "goto" => Ok(VmCommand::Goto(expect_name(&mut parts, line)?)),
        "if-goto" => Ok(VmCommand::IfGoto(expect_name(&mut parts, line)?)),
        "function" => {
            let name = expect_name(&mut parts, line)?;
            let n_locals = parse_index(
                parts
                    .next()
                    .ok_or_else(|| VmError::Malformed(line.to_string()))?,
            )?;
            Ok(VmCommand::Function(name, n_locals))
        }
        "call" => {
            let name = expect_name(&mut parts, line)?;
            let n_args = parse_index(
                parts
                    .next()
                    .ok_or_else(|| VmError::Malformed(line.to_string()))?,
            )?;
            Ok(VmCommand::Call(name, n_args))
        }
        "return" => Ok(VmCommand::Return),
        other => ArithmeticOp::from_str(other)
            .map(VmCommand::Arithmetic)
            .ok_or_else(|| VmError::UnknownCommand(other.to_string())),
    }
}

fn expect_name(parts: &mut std::str::SplitWhitespace<'_>, line: &str) -> Result<String, VmError> {
    parts
        .next()
        .map(str::to_string)
        .ok_or_else(|| VmError::Malformed(line.to_string()))
}

fn parse_index(text: &str) -> Result<u16, VmError> {
    text.parse()
        .map_err(|_| VmError::InvalidIndex(text.to_string()))
}
