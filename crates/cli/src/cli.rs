//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "egg",
    version,
    about = "Front end for the egg scripting language"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse, promote and prepare a source file, reporting diagnostics
    Check {
        /// Source file to check
        file: PathBuf,
        /// Emit diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the S-expression dump of the promoted program
    Dump {
        /// Source file to dump
        file: PathBuf,
    },
    /// Print the token stream
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}
