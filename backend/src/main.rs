//! `calc` command-line front end.
//!
//! - `calc execute [PATH]` prints the result of every line
//! - `calc colorize [PATH]` prints the document as highlighted HTML
//! - `calc server [--bind ADDR]` serves both over HTTP
//!
//! Without a path the document is read from stdin.

mod server;

use calc_core::{evaluate_source, render_html, UnitCatalog};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "calc", version, about = "Unit-aware line calculator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a document and print one result per line
    Execute {
        /// Source file (reads stdin if omitted)
        path: Option<PathBuf>,
    },
    /// Render a document as highlighted HTML
    Colorize {
        /// Source file (reads stdin if omitted)
        path: Option<PathBuf>,
    },
    /// Run the HTTP service
    Server {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:7894")]
        bind: SocketAddr,
    },
}

fn read_source(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // logs go to stderr, results to stdout
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let path = match &cli.command {
        Command::Execute { path } | Command::Colorize { path } => path.as_deref(),
        Command::Server { bind } => {
            info!("starting calc server");
            return match server::serve(*bind, UnitCatalog::standard()).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    error!("server failed: {}", err);
                    ExitCode::FAILURE
                }
            };
        }
    };

    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Problems reading the input: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Colorize { .. } => {
            println!("{}", render_html(&source));
            ExitCode::SUCCESS
        }
        _ => match evaluate_source(&source, &UnitCatalog::standard()) {
            Ok(document) => {
                println!("{}", document.execution_result());
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_server_default_bind() {
        let cli = Cli::try_parse_from(["calc", "server"]).unwrap();
        match cli.command {
            Command::Server { bind } => assert_eq!(bind.to_string(), "127.0.0.1:7894"),
            _ => panic!("expected the server command"),
        }
    }

    #[test]
    fn test_execute_path_is_optional() {
        let cli = Cli::try_parse_from(["calc", "execute"]).unwrap();
        assert!(matches!(cli.command, Command::Execute { path: None }));

        let cli = Cli::try_parse_from(["calc", "colorize", "notes.calc"]).unwrap();
        match cli.command {
            Command::Colorize { path } => assert_eq!(path, Some(PathBuf::from("notes.calc"))),
            _ => panic!("expected the colorize command"),
        }
    }
}
