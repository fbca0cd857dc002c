//! Jack language compiler
//!
//! - [`token`] — tokenizer producing a flat [`token::Tokens`] stream.
//! - [`symbol_table`] — dual-scope (`class`/`subroutine`) symbol tables.
//! - [`compiler`] — recursive-descent parser emitting VM commands.
//! - [`error`] — [`error::JackError`].
//!
//! ```
//! use jack_compiler::compile_class;
//!
//! let source = "class Main {\n    function void main() {\n        return;\n    }\n}\n";
//! let vm = compile_class(source).unwrap();
//! assert_eq!(vm, vec!["function Main.main 0", "push constant 0", "return"]);
//! ```

pub mod compiler;
pub mod error;
pub mod symbol_table;
pub mod token;

pub use error::JackError;

pub type Result<T> = std::result::Result<T, JackError>;

/// Tokenizes and compiles one Jack class, returning its VM command lines.
pub fn compile_class(source: &str) -> Result<Vec<String>> {
    let tokens = token::tokenize(source)?;
    let mut engine = compiler::Compiler::new(&tokens);
    engine.compile_class()?;
    Ok(engine.into_output())
}
