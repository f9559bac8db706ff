//! tcpline - A Line-Oriented TCP Request Dispatcher
//!
//! This is the demo server binary. It registers a few handlers, binds the
//! listener and serves until Ctrl+C.

use anyhow::Context;
use std::time::Duration;
use tcpline::{Server, ServerConfig, ServerError, Shutdown};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Maximum number of simultaneous clients
    max_connections: Option<usize>,
    /// Idle timeout in seconds
    idle_timeout: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: tcpline::DEFAULT_HOST.to_string(),
            port: tcpline::DEFAULT_PORT,
            max_connections: None,
            idle_timeout: None,
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
                "--host" | "-h" => {
                    config.host = value_for(&args, i, "--host").to_string();
                    i += 2;
                }
                "--port" | "-p" => {
                    config.port = parse_value(&args, i, "--port", "invalid port number");
                    i += 2;
                }
                "--max-connections" | "-m" => {
                    config.max_connections = Some(parse_value(
                        &args,
                        i,
                        "--max-connections",
                        "invalid connection limit",
                    ));
                    i += 2;
                }
                "--idle-timeout" | "-t" => {
                    config.idle_timeout = Some(parse_value(
                        &args,
                        i,
                        "--idle-timeout",
                        "invalid timeout",
                    ));
                    i += 2;
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("tcpline version {}", tcpline::VERSION);
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

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            max_connections: self.max_connections,
            idle_timeout: self.idle_timeout.map(Duration::from_secs),
            ..ServerConfig::default()
        }
    }
}

fn value_for<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: {} requires a value", flag);
            std::process::exit(1);
        }
    }
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str, message: &str) -> T {
    value_for(args, i, flag).parse().unwrap_or_else(|_| {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r#"
tcpline - A Line-Oriented TCP Request Dispatcher

USAGE:
    tcpline [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Host to bind to (default: 0.0.0.0)
    -p, --port <PORT>              Port to listen on (default: 8000)
    -m, --max-connections <N>      Reject clients beyond N (default: unlimited)
    -t, --idle-timeout <SECS>      Close connections idle for SECS (default: never)
    -v, --version                  Print version information
        --help                     Print this help message

COMMANDS:
    PING: <anything>     Replies "PONG"
    ECHO: <text>         Replies with <text>
    UPPER: <text>        Replies with <text> in upper case
    LEN: <text>          Replies with the byte length of <text>
    WHOAMI: <anything>   Replies with your address as the server sees it

CONNECTING:
    $ nc 127.0.0.1 8000
    ECHO: hello: world
    hello: world
"#
    );
}

/// Registers the demo handlers.
fn register_handlers(server: &mut Server) -> Result<(), tcpline::RegistryError> {
    server
        .handle_fn("PING:", |resp, _req| async move { resp.write(b"PONG\n").await })?
        .handle_fn("ECHO:", |resp, req| async move {
            resp.write(format!("{}\n", req.data())).await
        })?
        .handle_fn("UPPER:", |resp, req| async move {
            resp.write(format!("{}\n", req.data().to_uppercase())).await
        })?
        .handle_fn("LEN:", |resp, req| async move {
            resp.write(format!("{}\n", req.data().len())).await
        })?
        .handle_fn("WHOAMI:", |resp, _req| async move {
            let peer = resp.peer_addr();
            resp.write(format!("{}\n", peer)).await
        })?;
    Ok(())
}

/// Triggers `shutdown` on Ctrl+C.
fn shutdown_on_ctrl_c(shutdown: Shutdown) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping server...");
                shutdown.trigger();
            }
            Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("tcpline v{} starting", tcpline::VERSION);

    let mut server = Server::with_config(config.server_config());
    register_handlers(&mut server).context("failed to register handlers")?;
    shutdown_on_ctrl_c(server.shutdown_handle());

    match server.listen_and_serve(&config.bind_address()).await {
        Ok(()) | Err(ServerError::Closed) => {
            info!("Server shutdown complete");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
