//! Drives the egg-parser pipeline for each CLI command.

use egg_parser::lexer::Lexer;
use egg_parser::{driver, Severity};
use std::fs;
use std::path::Path;

fn read_source(file: &Path) -> Result<(String, String), String> {
    let resource = file.display().to_string();
    let source = fs::read_to_string(file)
        .map_err(|error| format!("{}: {}", resource, error))?;
    Ok((resource, source))
}

/// Parse, promote and prepare; print diagnostics; fail when the worst
/// severity reaches `Error`.
pub fn check_file(file: &Path, json: bool) -> Result<(), String> {
    let (resource, source) = read_source(file)?;
    let compilation = driver::compile(&resource, &source).map_err(|error| error.to_string())?;
    if json {
        let rendered = serde_json::to_string_pretty(&compilation.diagnostics)
            .map_err(|error| error.to_string())?;
        println!("{}", rendered);
    } else {
        for diagnostic in &compilation.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }
    if compilation.severity >= Severity::Error {
        // Diagnostics were already printed.
        return Err(String::new());
    }
    Ok(())
}

/// Print the program-tree dump of the promoted module.
pub fn dump_file(file: &Path) -> Result<(), String> {
    let (resource, source) = read_source(file)?;
    let program =
        driver::parse_module(&resource, &source).map_err(|error| error.to_string())?;
    println!("{}", program.to_dump());
    Ok(())
}

/// Print one token kind and span per line.
pub fn tokens_file(file: &Path) -> Result<(), String> {
    let (resource, source) = read_source(file)?;
    let tokens = Lexer::tokenize(&resource, &source).map_err(|error| error.to_string())?;
    for token in tokens {
        let text = &source[usize::from(token.start())..usize::from(token.end())];
        println!(
            "{:>5}..{:<5} {:?} {:?}",
            u32::from(token.start()),
            u32::from(token.end()),
            token.kind,
            text
        );
    }
    Ok(())
}
