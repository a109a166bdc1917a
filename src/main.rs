//! kvbridge - Interactive Shell
//!
//! Connects to one backend, reads command lines from stdin and prints the
//! replies. Ctrl+C interrupts a running command.

use kvbridge::backends::{BackendType, ConnectionSettings, DriverRegistry};
use kvbridge::driver::{spawn_driver, DriverEvent, DriverHandle, Request};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Shell configuration
struct Config {
    /// Backend to connect to
    backend: String,
    /// Single-line backend config, e.g. `-f ~/data.redb -c`
    backend_config: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendType::Memory.name().to_string(),
            backend_config: String::new(),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--backend" | "-b" => {
                    if i + 1 < args.len() {
                        config.backend = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --backend requires a value");
                        std::process::exit(1);
                    }
                }
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        config.backend_config = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --config requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("kvbridge version {}", kvbridge::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }
}

fn print_help() {
    println!(
        r#"
kvbridge - One command protocol over many key-value backends

USAGE:
    kvbridge [OPTIONS]

OPTIONS:
    -b, --backend <NAME>     Backend to use: memory, redb (default: memory)
    -c, --config <CONFIG>    Backend config line (see below)
    -v, --version            Print version information
        --help               Print this help message

BACKEND CONFIG:
    -f <path-or-name>    redb file path or memory database name
    -d <delimiter>       Delimiter for composite values (default: \n)
    -ns <separator>      Namespace separator for keys (default: :)
    -c                   Create the database if it does not exist

EXAMPLES:
    kvbridge
    kvbridge -b redb -c "-f ~/data.redb -c"
    echo "SET a 1" | kvbridge

LOGGING:
    Set RUST_LOG=debug to see every executed command.
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = ConnectionSettings::parse(&config.backend, &config.backend_config)?;
    let delimiter = settings.config.delimiter.clone();
    let registry = DriverRegistry::new();
    let handle = spawn_driver(registry.create(&settings)?);

    handle.call(Request::Connect).await?.result?;
    info!(backend = %settings.backend, config = %settings.config, "Connected");

    // Ctrl+C interrupts the running command instead of killing the shell
    let interrupter = handle.interrupt_flag().clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            info!("Interrupt requested");
            interrupter.interrupt();
        }
    });

    let prompt = format!("{}> ", settings.backend);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_prompt(&prompt);
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") {
            break;
        }
        if !line.is_empty() {
            run_line(&handle, line, &delimiter).await?;
        }
        print_prompt(&prompt);
    }

    handle.call(Request::Disconnect).await?.result?;
    Ok(())
}

/// Executes one line and prints its outputs as they arrive.
async fn run_line(handle: &DriverHandle, line: &str, delimiter: &str) -> anyhow::Result<()> {
    let mut events = handle.submit(Request::Execute {
        text: line.to_string(),
    })?;

    while let Some(event) = events.recv().await {
        match event {
            DriverEvent::Progress(_) => {}
            DriverEvent::Output(output) => println!("{}", output.to_human_readable(delimiter)),
            DriverEvent::Finished(Err(e)) => println!("(error) {}", e),
            DriverEvent::Finished(Ok(_)) => {}
        }
    }
    Ok(())
}

fn print_prompt(prompt: &str) {
    print!("{}", prompt);
    // A closed stdout only loses the prompt
    let _ = std::io::stdout().flush();
}
