use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use jack_compiler::{compile_class, JackError, Result};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.jack | directory>", args[0]);
        std::process::exit(1);
    }

    match run(&args[1]) {
        Ok(outputs) => {
            for output in outputs {
                println!("Compiled -> {}", output.display());
            }
        }
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn run(input_path: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(input_path);
    let sources = if path.is_dir() { discover_directory(path)? } else { vec![validate_jack_file(path)?] };

    let mut outputs = Vec::with_capacity(sources.len());
    for source_path in sources {
        let source = fs::read_to_string(&source_path)?;
        let vm = compile_class(&source)?;
        let output_path = source_path.with_extension("vm");
        write_output(&output_path, &vm)?;
        outputs.push(output_path);
    }
    Ok(outputs)
}

fn validate_jack_file(path: &Path) -> Result<PathBuf> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("jack") {
        return Err(JackError::InvalidExtension(path.display().to_string()));
    }
    Ok(path.to_path_buf())
}

/// Every `.jack` file directly inside `dir`, sorted for deterministic
/// output order. Not recursive, matching the VM translator's own
/// directory handling.
fn discover_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("jack"))
        .collect();
    entries.sort();
    Ok(entries)
}

fn write_output(path: &Path, vm: &[String]) -> Result<()> {
    let mut file = std::io::BufWriter::new(fs::File::create(path)?);
    for line in vm {
        writeln!(file, "{line}")?;
    }
    Ok(())
}
