mod cli;
mod pipeline;

use clap::Parser;
use cli::{Cli, Command};
use pipeline::{check_file, dump_file, tokens_file};
use std::process;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check { file, json } => check_file(&file, json),
        Command::Dump { file } => dump_file(&file),
        Command::Tokens { file } => tokens_file(&file),
    };

    if let Err(error) = result {
        if !error.is_empty() {
            eprintln!("{}", error);
        }
        process::exit(1);
    }
}
