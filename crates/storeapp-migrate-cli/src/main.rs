//! storeapp-migrate CLI - import legacy SQLite products into the storeapp POS database.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use storeapp_migrate::config::require_source_path;
use storeapp_migrate::{
    health_check, Config, MigrateError, Migrator, MysqlWriter, SourceReader, SqliteReader,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "storeapp-migrate")]
#[command(about = "Import products from a legacy SQLite store into the storeapp POS database")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Legacy SQLite file to import
    source: Option<PathBuf>,

    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dry run: find the product table and column mapping without writing
    #[arg(long)]
    dry_run: bool,

    /// Rows per destination flush [default: 500]
    #[arg(long)]
    batch_size: Option<usize>,

    /// Destination MySQL host
    #[arg(long)]
    host: Option<String>,

    /// Destination MySQL port
    #[arg(long)]
    port: Option<u16>,

    /// Destination database name
    #[arg(long)]
    database: Option<String>,

    /// Destination user
    #[arg(long)]
    user: Option<String>,

    /// Destination password
    #[arg(long, env = "STOREAPP_DB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Test connections to the source file and the destination database
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    config.validate()?;

    match cli.command {
        Some(Commands::HealthCheck) => {
            let result = health_check(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (SQLite): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (MySQL): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::Config("Health check failed".to_string()));
            }
        }

        None => {
            let source_path = require_source_path(&config)?;
            let reader = SqliteReader::open(source_path).await?;
            let outcome = if cli.dry_run {
                dry_run(&reader, &config, cli.output_json).await
            } else {
                migrate(&reader, &config, cli.output_json).await
            };
            reader.close().await;
            outcome?;
        }
    }

    Ok(())
}

async fn dry_run(
    reader: &SqliteReader,
    config: &Config,
    output_json: bool,
) -> Result<(), MigrateError> {
    let plan = Migrator::new(config.migration.clone())
        .inspect(reader)
        .await?;

    if output_json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("\nDry run completed!");
        println!("  Source: {}", reader.path().display());
        println!("  Table: {}", plan.source_table);
        println!("  Columns: {}", plan.columns);
        println!(
            "  Destination: {}:{}/{} (not contacted)",
            config.target.host, config.target.port, config.target.database
        );
    }
    Ok(())
}

async fn migrate(
    reader: &SqliteReader,
    config: &Config,
    output_json: bool,
) -> Result<(), MigrateError> {
    let mut writer = MysqlWriter::connect(&config.target).await?;

    // Setup signal handling for graceful shutdown (SIGINT and SIGTERM)
    let cancel_token = setup_signal_handler();

    let result = Migrator::new(config.migration.clone())
        .with_cancellation(cancel_token)
        .run(reader, &mut writer)
        .await;
    writer.close().await;
    let result = result?;

    if output_json {
        println!("{}", result.to_json()?);
    } else {
        println!("\nMigration completed!");
        println!("  Run ID: {}", result.run_id);
        println!("  Duration: {:.2}s", result.duration_seconds);
        println!("  Table: {}", result.source_table);
        println!("  Columns: {}", result.columns);
        println!("  Rows: {}", result.rows_migrated);
        println!("  Batches: {}", result.batches);
        println!("  Throughput: {} rows/sec", result.rows_per_second);
    }
    Ok(())
}

/// Command-line values win over the configuration file.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref path) = cli.source {
        config.source.path = Some(path.clone());
    }
    if let Some(size) = cli.batch_size {
        config.migration.batch_size = size;
    }
    if let Some(ref host) = cli.host {
        config.target.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.target.port = port;
    }
    if let Some(ref database) = cli.database {
        config.target.database = database.clone();
    }
    if let Some(ref user) = cli.user {
        config.target.user = user.clone();
    }
    if let Some(ref password) = cli.password {
        config.target.password = password.clone();
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so --output-json stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM. The run in progress is rolled
/// back at the next row.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            let mut stream = match signal(kind) {
                Ok(stream) => stream,
                Err(e) => {
                    eprintln!("Failed to setup {} handler: {}", name, e);
                    return;
                }
            };
            stream.recv().await;
            eprintln!("\nReceived {}. Rolling back...", name);
            token.cancel();
        });
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to setup Ctrl-C handler: {}", e);
            return;
        }
        eprintln!("\nReceived Ctrl-C. Rolling back...");
        token.cancel();
    });

    cancel_token
}
