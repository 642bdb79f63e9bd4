//! Home Zenith Dashboard Backend Binary
//!
//! A standalone binary that samples host metrics, persists them to SQLite,
//! and serves them to dashboard clients over HTTP and WebSocket.

use clap::{Args, Parser, Subcommand};
use home_zenith::{
    run_network_sampler, run_system_sampler, AppState, EnvConfig, MetricsStore, NetworkSampler,
    Sampler, SystemSampler, WebConfig, EVENT_CHANNEL_CAPACITY,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "home_zenith")]
#[command(about = "🏠 Home Zenith - Home Server Dashboard Backend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Samples host and network metrics, stores them in SQLite, \
and streams them to dashboard clients")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port (defaults to $PORT or 3000)
    #[arg(short, long)]
    port: Option<u16>,

    /// System sampling interval in milliseconds
    /// (defaults to $SYSTEM_METRICS_INTERVAL or 5000)
    #[arg(long)]
    system_interval: Option<u64>,

    /// Network sampling interval in milliseconds
    /// (defaults to $NETWORK_METRICS_INTERVAL or 10000)
    #[arg(long)]
    network_interval: Option<u64>,

    /// SQLite database path (defaults to $DB_PATH or homezenith.db)
    #[arg(long)]
    db_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the backend server (default)
    Serve(ServeArgs),

    /// Take a single sample of each metric kind and exit
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Static files directory for the dashboard build (optional)
    #[arg(long)]
    static_dir: Option<String>,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Maximum WebSocket connections
    #[arg(long, default_value_t = 100)]
    max_connections: usize,

    /// Days of metric history to keep, 0 keeps everything
    /// (defaults to $METRICS_RETENTION_DAYS or 0)
    #[arg(long)]
    retention_days: Option<u32>,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;
    print_banner();

    match &cli.command {
        Some(Commands::Serve(args)) => {
            serve_command(&cli, args).await?;
        }
        Some(Commands::Snapshot(args)) => {
            snapshot_command(args).await?;
        }
        None => {
            // Default to serve command
            let serve_args = ServeArgs {
                static_dir: None,
                no_cors: false,
                max_connections: 100,
                retention_days: None,
            };
            serve_command(&cli, &serve_args).await?;
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn print_banner() {
    println!("🏠 Home Zenith - Dashboard Backend");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let env = EnvConfig::from_env();

    let db_path = cli.db_path.clone().unwrap_or(env.db_path);
    let system_interval = cli.system_interval.unwrap_or(env.system_interval_ms);
    let network_interval = cli.network_interval.unwrap_or(env.network_interval_ms);
    let port = cli.port.unwrap_or(env.port);
    let retention_days = args.retention_days.unwrap_or(env.retention_days);

    let store = Arc::new(MetricsStore::open(Path::new(&db_path), retention_days)?);
    info!("Metrics store ready at {db_path}");

    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    let system_sampler = SystemSampler::new()?;
    let network_sampler = NetworkSampler::new()?;
    tokio::spawn(run_system_sampler(
        system_sampler,
        system_interval,
        Arc::clone(&store),
        events.clone(),
    ));
    tokio::spawn(run_network_sampler(
        network_sampler,
        network_interval,
        Arc::clone(&store),
        events.clone(),
    ));
    info!("Started samplers: system every {system_interval}ms, network every {network_interval}ms");

    let web_config = WebConfig::new(&cli.host, port)
        .with_cors(!args.no_cors)
        .with_static_path(args.static_dir.clone())
        .with_max_websocket_connections(args.max_connections);

    info!("Web server configuration:");
    info!("  - Bind address: {}:{port}", cli.host);
    info!("  - CORS enabled: {}", !args.no_cors);
    info!("  - Max WebSocket connections: {}", args.max_connections);
    if retention_days > 0 {
        info!("  - Metric retention: {retention_days} days");
    } else {
        info!("  - Metric retention: unlimited");
    }

    let state = AppState::new(store, events, web_config.max_websocket_connections);
    home_zenith::start_web_server(web_config, state).await?;

    Ok(())
}

async fn snapshot_command(args: &SnapshotArgs) -> anyhow::Result<()> {
    let mut system_sampler = SystemSampler::new()?;
    let mut network_sampler = NetworkSampler::new()?;

    let system = system_sampler.sample().await?;
    let network = network_sampler.sample().await?;

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "system": system,
                "network": network,
            }))?;
            println!("{json}");
        }
        "pretty" => {
            println!("⚡ System:");
            println!("  CPU usage: {:.1}%", system.cpu_usage);
            println!(
                "  Memory: {:.1} / {:.1} GB",
                system.memory_used, system.memory_total
            );
            println!(
                "  Disk: {:.1} / {:.1} GB",
                system.disk_used, system.disk_total
            );
            match system.temperature {
                Some(temp) => println!("  Temperature: {temp:.1}°C"),
                None => println!("  Temperature: not available"),
            }
            println!("  Uptime: {} seconds", system.uptime);
            println!();
            println!("🌐 Network ({}):", network.interface_name);
            println!("  Download: {:.1} MB/s", network.download_speed);
            println!("  Upload: {:.1} MB/s", network.upload_speed);
            match network.connected_devices {
                Some(count) => println!("  Connected devices: {count}"),
                None => println!("  Connected devices: not available"),
            }
        }
        _ => {
            error!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["home_zenith", "--port", "9090"]).unwrap();
        assert_eq!(cli.port, Some(9090));
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["home_zenith"]).unwrap();
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, None);
        assert_eq!(cli.system_interval, None);
    }

    #[test]
    fn test_snapshot_subcommand() {
        let cli = Cli::try_parse_from(["home_zenith", "snapshot", "--format", "json"]).unwrap();
        match cli.command {
            Some(Commands::Snapshot(args)) => assert_eq!(args.format, "json"),
            _ => panic!("expected snapshot subcommand"),
        }
    }
}
