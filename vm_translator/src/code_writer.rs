//! Translates VM commands into Hack assembly text
//!
//! One `CodeWriter` spans an entire translation run (all files in a
//! directory, or the single input file). Its counters are never reset
//! between files: comparison labels and call return-labels are unique
//! across the whole emitted assembly, exactly as they would need to be
//! for the later assembler pass to resolve them unambiguously.

use crate::command::{ArithmeticOp, Segment, VmCommand};
use crate::error::VmError;

pub struct CodeWriter {
    lines: Vec<String>,
    file_stem: String,
    current_function: Option<String>,
    compare_counter: u32,
    call_counter: u32,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            file_stem: String::new(),
            current_function: None,
            compare_counter: 0,
            call_counter: 0,
        }
    }

    /// Sets the file basename used to mangle `static` references. Called
    /// once per input file before its commands are written. Also clears any
    /// function scope left over from the previous unit, so that top-level
    /// branch code in this unit scopes to its own file stem rather than the
    /// last function declared in whichever unit came before it.
    pub fn set_file_stem(&mut self, stem: &str) {
        self.file_stem = stem.to_string();
        self.current_function = None;
    }

    /// Emits the bootstrap sequence: `SP = 256; call Sys.init 0`. Must be
    /// called (if at all) before any other command, and at most once.
    pub fn write_bootstrap(&mut self) -> Result<(), VmError> {
        self.emit(["@256", "D=A", "@SP", "M=D"]);
        self.write_command(&VmCommand::Call("Sys.init".to_string(), 0))
    }

    pub fn write_command(&mut self, command: &VmCommand) -> Result<(), VmError> {
        match command {
            VmCommand::Arithmetic(op) => self.write_arithmetic(*op),
            VmCommand::Push(segment, index) => self.write_push(*segment, *index),
            VmCommand::Pop(segment, index) => self.write_pop(*segment, *index)?,
            VmCommand::Label(name) => self.write_label(name),
            VmCommand::Goto(name) => self.write_goto(name),
            VmCommand::IfGoto(name) => self.write_if_goto(name),
            VmCommand::Function(name, n_locals) => self.write_function(name, *n_locals),
            VmCommand::Call(name, n_args) => self.write_call(name, *n_args),
            VmCommand::Return => self.write_return(),
        }
        Ok(())
    }

    /// Consumes the writer, returning the assembled output as one string
    /// with a trailing newline per instruction.
    #[must_use]
    pub fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    #[inline]
    fn emit<const N: usize>(&mut self, instructions: [&str; N]) {
        self.lines
            .extend(instructions.iter().map(|s| (*s).to_string()));
    }

    #[inline]
    fn emit_owned(&mut self, instruction: String) {
        self.lines.push(instruction);
    }

    /// The scope prefix for branch labels: the enclosing function, or (for
    /// top-level code with no enclosing function) the file stem.
    fn scope(&self) -> &str {
        self.current_function.as_deref().unwrap_or(&self.file_stem)
    }

    fn write_arithmetic(&mut self, op: ArithmeticOp) {
        match op {
            ArithmeticOp::Neg => self.emit(["@SP", "A=M-1", "M=-M"]),
            ArithmeticOp::Not => self.emit(["@SP", "A=M-1", "M=!M"]),
            ArithmeticOp::Add => self.emit(["@SP", "AM=M-1", "D=M", "A=A-1", "M=M+D"]),
            ArithmeticOp::Sub => self.emit(["@SP", "AM=M-1", "D=M", "A=A-1", "M=M-D"]),
            ArithmeticOp::And => self.emit(["@SP", "AM=M-1", "D=M", "A=A-1", "M=M&D"]),
            ArithmeticOp::Or => self.emit(["@SP", "AM=M-1", "D=M", "A=A-1", "M=M|D"]),
            ArithmeticOp::Eq | ArithmeticOp::Gt | ArithmeticOp::Lt => {
                self.write_comparison(op);
            }
        }
    }

    fn write_comparison(&mut self, op: ArithmeticOp) {
        let jump = match op {
            ArithmeticOp::Eq => "JEQ",
            ArithmeticOp::Gt => "JGT",
            ArithmeticOp::Lt => "JLT",
            _ => unreachable!("write_comparison only called for eq/gt/lt"),
        };
        let label = format!("{}_{}", op.label_prefix(), self.compare_counter);
        self.compare_counter += 1;

        self.emit(["@SP", "AM=M-1", "D=M", "A=A-1", "D=M-D", "M=-1"]);
        self.emit_owned(format!("@{label}"));
        self.emit_owned(format!("D;{jump}"));
        self.emit(["@SP", "A=M-1", "M=0"]);
        self.emit_owned(format!("({label})"));
    }

    fn write_push(&mut self, segment: Segment, index: u16) {
        match segment {
            Segment::Constant => {
                self.emit_owned(format!("@{index}"));
                self.emit(["D=A"]);
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                self.emit_owned(format!("@{}", segment_symbol(segment)));
                self.emit(["D=M"]);
                self.emit_owned(format!("@{index}"));
                self.emit(["A=D+A", "D=M"]);
            }
            Segment::Temp => {
                self.emit(["@5", "D=A"]);
                self.emit_owned(format!("@{index}"));
                self.emit(["A=D+A", "D=M"]);
            }
            Segment::Pointer => {
                self.emit(["@3", "D=A"]);
                self.emit_owned(format!("@{index}"));
                self.emit(["A=D+A", "D=M"]);
            }
            Segment::Static => {
                self.emit_owned(format!("@{}.{}", self.file_stem, index));
                self.emit(["D=M"]);
            }
        }
        self.push_d();
    }

    fn write_pop(&mut self, segment: Segment, index: u16) -> Result<(), VmError> {
        if segment == Segment::Constant {
            return Err(VmError::ConstantIsNotAssignable);
        }
        if segment == Segment::Static {
            self.pop_to_d();
            self.emit_owned(format!("@{}.{}", self.file_stem, index));
            self.emit(["M=D"]);
            return Ok(());
        }

        match segment {
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                self.emit_owned(format!("@{}", segment_symbol(segment)));
                self.emit(["D=M"]);
            }
            Segment::Temp => self.emit(["@5", "D=A"]),
            Segment::Pointer => self.emit(["@3", "D=A"]),
            Segment::Constant | Segment::Static => unreachable!("handled above"),
        }
        self.emit_owned(format!("@{index}"));
        self.emit(["D=D+A", "@R13", "M=D"]);
        self.pop_to_d();
        self.emit(["@R13", "A=M", "M=D"]);
        Ok(())
    }

    fn write_label(&mut self, name: &str) {
        let scoped = format!("{}${}", self.scope(), name);
        self.emit_owned(format!("({scoped})"));
    }

    fn write_goto(&mut self, name: &str) {
        let scoped = format!("{}${}", self.scope(), name);
        self.emit_owned(format!("@{scoped}"));
        self.emit(["0;JMP"]);
    }

    fn write_if_goto(&mut self, name: &str) {
        let scoped = format!("{}${}", self.scope(), name);
        self.emit(["@SP", "AM=M-1", "D=M"]);
        self.emit_owned(format!("@{scoped}"));
        self.emit(["D;JNE"]);
    }

    fn write_function(&mut self, name: &str, n_locals: u16) {
        self.current_function = Some(name.to_string());
        self.emit_owned(format!("({name})"));
        for _ in 0..n_locals {
            self.write_push(Segment::Constant, 0);
        }
    }

    fn write_call(&mut self, name: &str, n_args: u16) {
        let return_label = format!("{name}$ret{}", self.call_counter);
        self.call_counter += 1;

        self.emit_owned(format!("@{return_label}"));
        self.emit(["D=A"]);
        self.push_d();
        for segment in ["LCL", "ARG", "THIS", "THAT"] {
            self.emit_owned(format!("@{segment}"));
            self.emit(["D=M"]);
            self.push_d();
        }

        self.emit(["@SP", "D=M"]);
        self.emit_owned(format!("@{}", n_args as u32 + 5));
        self.emit(["D=D-A", "@ARG", "M=D"]);
        self.emit(["@SP", "D=M", "@LCL", "M=D"]);
        self.emit_owned(format!("@{name}"));
        self.emit(["0;JMP"]);
        self.emit_owned(format!("({return_label})"));
    }

    fn write_return(&mut self) {
        // frame = LCL, saved in R13.
        self.emit(["@LCL", "D=M", "@R13", "M=D"]);
        // returnAddr = *(frame - 5), saved in R14 before the stack is touched,
        // because when nArgs == 0 the return slot and ARG coincide.
        self.emit(["@5", "A=D-A", "D=M", "@R14", "M=D"]);
        // *ARG = pop()
        self.emit(["@SP", "AM=M-1", "D=M", "@ARG", "A=M", "M=D"]);
        // SP = ARG + 1
        self.emit(["@ARG", "D=M+1", "@SP", "M=D"]);
        // Restore THAT, THIS, ARG, LCL from the frame, walking backward from R13.
        for segment in ["THAT", "THIS", "ARG", "LCL"] {
            self.emit(["@R13", "AM=M-1", "D=M"]);
            self.emit_owned(format!("@{segment}"));
            self.emit(["M=D"]);
        }
        self.emit(["@R14", "A=M", "0;JMP"]);
    }

    fn push_d(&mut self) {
        self.emit(["@SP", "A=M", "M=D", "@SP", "M=M+1"]);
    }

    fn pop_to_d(&mut self) {
        self.emit(["@SP", "AM=M-1", "D=M"]);
    }
}

fn segment_symbol(segment: Segment) -> &'static str {
    match segment {
        Segment::Local => "LCL",
        Segment::Argument => "ARG",
        Segment::This => "THIS",
        Segment::That => "THAT",
        _ => unreachable!("segment_symbol only called for LCL/ARG/THIS/THAT"),
    }
}
