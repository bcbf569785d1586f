//! cellkv server
//!
//! This is the main entry point for a single cellkv node.
//! It sets up the cells, the metrics reporter and the TCP listener, and
//! handles incoming connections.

use cellkv::apply::{MetricsReporter, ReporterConfig};
use cellkv::cluster::Node;
use cellkv::connection::{handle_connection, ConnectionStats};
use cellkv::response::{ResponsePool, DEFAULT_POOL_CAPACITY};
use cellkv::storage::MemoryEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Number of cells hosted by this node
    cells: usize,
    /// Idle responses kept in the response pool
    pool_capacity: usize,
    /// Interval between metrics reports
    report_interval: Duration,
    /// Default log filter, overridden by RUST_LOG
    log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: cellkv::DEFAULT_HOST.to_string(),
            port: cellkv::DEFAULT_PORT,
            cells: cellkv::DEFAULT_CELLS,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            report_interval: ReporterConfig::default().interval,
            log_level: "info".to_string(),
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
                    config.host = value_of(&args, i).to_string();
                    i += 2;
                }
                "--port" | "-p" => {
                    config.port = parse_value(&args, i, "port number");
                    i += 2;
                }
                "--cells" | "-c" => {
                    config.cells = parse_value(&args, i, "cell count");
                    if config.cells == 0 || config.cells > 256 {
                        eprintln!("Error: --cells must be between 1 and 256");
                        std::process::exit(1);
                    }
                    i += 2;
                }
                "--pool-capacity" => {
                    config.pool_capacity = parse_value(&args, i, "pool capacity");
                    i += 2;
                }
                "--report-interval-ms" => {
                    let ms: u64 = parse_value(&args, i, "report interval");
                    config.report_interval = Duration::from_millis(ms.max(1));
                    i += 2;
                }
                "--log-level" | "-l" => {
                    config.log_level = value_of(&args, i).to_string();
                    i += 2;
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("cellkv version {}", cellkv::VERSION);
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
}

/// Returns the value following the flag at `i`, or exits.
fn value_of(args: &[String], i: usize) -> &str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires a value", args[i]);
            std::process::exit(1);
        }
    }
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, what: &str) -> T {
    value_of(args, i).parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid {}", what);
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r#"
cellkv - Cell-partitioned Redis-style key-value node

USAGE:
    cellkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>               Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>               Port to listen on (default: 6379)
    -c, --cells <N>                 Number of cells, 1 to 256 (default: 16)
        --pool-capacity <N>         Idle responses kept for reuse (default: 1024)
        --report-interval-ms <MS>   Metrics report interval (default: 1000)
    -l, --log-level <FILTER>        Log filter when RUST_LOG is unset (default: info)
    -v, --version                   Print version information
        --help                      Print this help message

EXAMPLES:
    cellkv                          # Start on 127.0.0.1:6379 with 16 cells
    cellkv --cells 4 --port 6380    # 4 cells on port 6380
    RUST_LOG=cellkv=debug cellkv    # Log per-cell metrics reports

CONNECTING:
    $ redis-cli -p 6379
    127.0.0.1:6379> HSET user:1 name demo
    (integer) 1
    127.0.0.1:6379> LPUSH queue a b
    (integer) 2
    127.0.0.1:6379> SMEMBERS tags
    (empty array)
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!(
        version = cellkv::VERSION,
        cells = config.cells,
        pool_capacity = config.pool_capacity,
        "Starting cellkv"
    );

    // Build the node (shared across all connections)
    let pool = Arc::new(ResponsePool::with_capacity(config.pool_capacity));
    let node = Arc::new(Node::new(Arc::new(MemoryEngine::new()), pool, config.cells));

    // Start the background metrics reporter
    let _reporter = MetricsReporter::start(
        Arc::clone(&node),
        ReporterConfig {
            interval: config.report_interval,
        },
    );

    // Create connection statistics
    let stats = Arc::new(ConnectionStats::new());

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, Arc::clone(&node), stats) => {}
        _ = shutdown => {}
    }

    let pool = node.pool().stats();
    info!(
        acquired = pool.acquired,
        reused = pool.reused,
        released = pool.released,
        "Server shutdown complete"
    );
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(listener: TcpListener, node: Arc<Node<MemoryEngine>>, stats: Arc<ConnectionStats>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let node = Arc::clone(&node);
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, node, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
