use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

use vm_translator::{translate, Result, TranslationUnit, VmError};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.vm | directory>", args[0]);
        std::process::exit(1);
    }

    match run(&args[1]) {
        Ok(output_path) => println!("Translation complete: {} -> {}", args[1], output_path),
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn run(input_path: &str) -> Result<String> {
    let path = Path::new(input_path);
    let (units, output_path, bootstrap) = if path.is_dir() {
        (load_directory(path)?, directory_output_path(path), true)
    } else {
        (vec![load_file(path)?], single_file_output_path(path), false)
    };

    let asm = translate(&units, bootstrap)?;
    write_output(&output_path, &asm)?;
    Ok(output_path)
}

fn load_file(path: &Path) -> Result<TranslationUnit> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("vm") {
        return Err(VmError::Malformed(format!(
            "{}: expected a .vm file",
            path.display()
        )));
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| VmError::Malformed(path.display().to_string()))?
        .to_string();
    let source = fs::read_to_string(path)?.lines().map(str::to_string).collect();
    Ok(TranslationUnit {
        file_stem: stem,
        source,
    })
}

/// Collects every `.vm` file directly inside `dir`, sorted by name so the
/// emitted assembly (and its label/call counters) are deterministic across
/// runs regardless of the filesystem's own directory-entry order.
fn load_directory(dir: &Path) -> Result<Vec<TranslationUnit>> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("vm"))
        .collect();
    entries.sort();

    if entries.is_empty() {
        return Err(VmError::Malformed(format!(
            "{}: no .vm files found",
            dir.display()
        )));
    }

    entries.iter().map(|path| load_file(path)).collect()
}

fn single_file_output_path(path: &Path) -> String {
    path.with_extension("asm").to_string_lossy().into_owned()
}

fn directory_output_path(dir: &Path) -> String {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    dir.join(format!("{name}.asm")).to_string_lossy().into_owned()
}

fn write_output(path: &str, asm: &str) -> Result<()> {
    let mut file = std::io::BufWriter::new(fs::File::create(path)?);
    file.write_all(asm.as_bytes())?;
    Ok(())
}
