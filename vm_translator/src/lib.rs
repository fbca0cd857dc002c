//! Stack VM to Hack assembly translation
//!
//! Mirrors the `assembler` crate's shape: a small set of modules, one
//! public entry point, PHF-backed mnemonic lookups.
//!
//! - [`command`] — the [`command::VmCommand`] model and line-level parsing.
//! - [`parser`] — comment-stripping iterator over VM source lines.
//! - [`code_writer`] — emits Hack assembly for each command.
//! - [`error`] — [`error::VmError`].
//!
//! ```
//! use vm_translator::{translate, TranslationUnit};
//!
//! let unit = TranslationUnit {
//!     file_stem: "Test".to_string(),
//!     source: vec!["push constant 7".to_string(), "push constant 8".to_string(), "add".to_string()],
//! };
//! let asm = translate(&[unit], false).unwrap();
//! assert!(asm.contains("@7"));
//! ```

pub mod code_writer;
pub mod command;
pub mod error;
pub mod parser;

pub use error::VmError;

pub type Result<T> = std::result::Result<T, VmError>;

/// One input file's worth of VM source, paired with the basename used to
/// mangle `static` variables and scope unqualified branch labels.
pub struct TranslationUnit {
    pub file_stem: String,
    pub source: Vec<String>,
}

/// Translates a set of VM source files into one Hack assembly program.
///
/// `bootstrap` should be `true` when translating a directory of files
/// (a whole Jack program, entered via `Sys.init`) and `false` for a
/// single standalone file, matching the convention of the original
/// course tools: a lone `.vm` file is assumed to already contain
/// whatever entry point it needs, while a multi-file program relies on
/// the translator to supply one.
///
/// Label/goto/if-goto commands that appear before any `function`
/// declaration in a unit are scoped under that unit's file stem, not
/// left unscoped, since the Hack assembler has no notion of scope on
/// its own.
pub fn translate(units: &[TranslationUnit], bootstrap: bool) -> Result<String> {
    let mut writer = code_writer::CodeWriter::new();

    if bootstrap {
        writer.write_bootstrap()?;
    }

    for unit in units {
        writer.set_file_stem(&unit.file_stem);
        let commands = parser::parse_lines(&unit.source)?;
        for command in &commands {
            writer.write_command(command)?;
        }
    }

    Ok(writer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn single_file_without_bootstrap_has_no_sys_init_call() {
        let unit = TranslationUnit {
            file_stem: "SimpleAdd".to_string(),
            source: lines("push constant 7\npush constant 8\nadd"),
        };
        let asm = translate(&[unit], false).unwrap();
        assert!(!asm.contains("Sys.init"));
        assert!(asm.contains("@7"));
        assert!(asm.contains("@8"));
    }

    #[test]
    fn bootstrap_emits_sp_init_and_sys_init_call() {
        let unit = TranslationUnit {
            file_stem: "Sys".to_string(),
            source: lines("function Sys.init 0\npush constant 0\nreturn"),
        };
        let asm = translate(&[unit], true).unwrap();
        assert!(asm.starts_with("@256\nD=A\n@SP\nM=D\n"));
        assert!(asm.contains("@Sys.init"));
        assert!(asm.contains("0;JMP"));
    }

    #[test]
    fn multiple_files_share_counters_and_static_scoping() {
        let units = vec![
            TranslationUnit {
                file_stem: "Main".to_string(),
                source: lines("push constant 1\npush constant 1\neq\npop static 0"),
            },
            TranslationUnit {
                file_stem: "Util".to_string(),
                source: lines("push constant 2\npush constant 3\neq\npop static 0"),
            },
        ];
        let asm = translate(&units, false).unwrap();
        // Each file's `static 0` must mangle to its own file stem.
        assert!(asm.contains("@Main.0"));
        assert!(asm.contains("@Util.0"));
        // The comparison counter is shared across files, not reset per file.
        assert!(asm.contains("eq_0"));
        assert!(asm.contains("eq_1"));
        assert!(!asm.contains("eq_2"));
    }

    #[test]
    fn top_level_labels_scope_to_file_stem_per_unit() {
        let units = vec![TranslationUnit {
            file_stem: "Loop".to_string(),
            source: lines("label START\ngoto START"),
        }];
        let asm = translate(&units, false).unwrap();
        assert!(asm.contains("(Loop$START)"));
        assert!(asm.contains("@Loop$START"));
    }

    #[test]
    fn top_level_labels_in_a_later_unit_do_not_inherit_prior_units_function_scope() {
        let units = vec![
            TranslationUnit {
                file_stem: "Main".to_string(),
                source: lines("function Main.run 0\nlabel LOOP\ngoto LOOP"),
            },
            TranslationUnit {
                file_stem: "Util".to_string(),
                source: lines("label LOOP\ngoto LOOP"),
            },
        ];
        let asm = translate(&units, false).unwrap();
        // The second unit has no enclosing function, so its label must
        // scope to its own file stem, not leak "Main.run" from the unit
        // that happened to be translated before it.
        assert_eq!(asm.matches("(Main.run$LOOP)").count(), 1);
        assert_eq!(asm.matches("(Util$LOOP)").count(), 1);
        assert!(!asm.contains("(Main.run$LOOP)\n(Main.run$LOOP)"));
    }

    #[test]
    fn propagates_parse_and_codegen_errors() {
        let unit = TranslationUnit {
            file_stem: "Bad".to_string(),
            source: lines("pop constant 0"),
        };
        assert_eq!(
            translate(&[unit], false),
            Err(VmError::ConstantIsNotAssignable)
        );
    }
}
