//! # `drawer` Entry Point
//!
//! Parses the command line and hands off to [`drawer_cli::run`]. Success
//! prints JSON to stdout; failure prints the error envelope to stderr and
//! exits with status 1.

use std::process::ExitCode;

use clap::Parser;

use drawer_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match drawer_cli::run(cli).await {
        Ok(output) => {
            println!("{}", render(&output));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", render(&err));
            ExitCode::FAILURE
        }
    }
}

fn render<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"code":"INTERNAL","message":"{e}"}}"#))
}
