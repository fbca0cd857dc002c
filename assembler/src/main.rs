//! Hack Assembler - Main Entry Point
//!
//! A two-pass assembler for the Hack assembly language (`Nand2Tetris` Project 6).
//!
//! # Architecture
//! - **Pass 1**: Builds the symbol table by recording label positions
//! - **Pass 2**: Generates machine code, resolving all symbols
//!
//! # Usage
//! ```bash
//! cargo run <input.asm> [output.hack]
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process;

use assembler::{assemble, AssemblerError, Result};

/// Reads assembly file into memory
fn read_lines(path: &str) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    reader
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(Into::into)
}

/// Determines the output file path
fn output_path(input: &str, explicit_output: Option<&str>) -> String {
    explicit_output.map_or_else(
        || Path::new(input).with_extension("hack").display().to_string(),
        std::string::ToString::to_string,
    )
}

/// Writes the assembled binary lines to `output`. The file handle is local
/// to this function, so it closes via `Drop` on every exit path, including
/// an early `?` return.
fn write_output(output: &str, binary: &[String]) -> Result<()> {
    let output_file = File::create(output)?;
    let mut writer = BufWriter::new(output_file);
    for line in binary {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

fn run(input_path: &str, explicit_output: Option<&str>) -> Result<String> {
    if Path::new(input_path)
        .extension()
        .and_then(|ext| ext.to_str())
        != Some("asm")
    {
        return Err(AssemblerError::InvalidExtension(input_path.to_string()));
    }

    let lines = read_lines(input_path)?;
    let binary = assemble(&lines)?;

    let output = output_path(input_path, explicit_output);
    write_output(&output, &binary)?;
    Ok(output)
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: {} <input.asm> [output.hack]", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} Add.asm", args[0]);
        eprintln!("  {} Add.asm Add.hack", args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    let explicit_output = args.get(2).map(String::as_str);

    match run(input_path, explicit_output) {
        Ok(output) => println!("Assembly completed. Output written to {output}"),
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}
