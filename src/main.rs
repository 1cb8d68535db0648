//! mortalidad-dashboard CLI
//!
//! Loads the 2019 mortality inputs once and serves the dashboard.
//!
//! Usage:
//!   mortalidad-dashboard [OPTIONS]
//!   mortalidad-dashboard --summary [-o report.txt]

use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use mortalidad_dashboard::{
    DashboardConfig, generate_summary, load_config, load_config_file, load_dashboard,
    web::{ServerConfig, start_server},
};

/// mortalidad-dashboard - Explore 2019 Colombian mortality data
#[derive(Parser, Debug)]
#[command(name = "mortalidad-dashboard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path (default: search for mortalidad.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the input files (overrides [data].dir)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Address to bind (default: 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// Port for web server (default: 8050)
    #[arg(short, long)]
    port: Option<u16>,

    /// Don't open browser automatically when starting web server
    #[arg(long)]
    no_open: bool,

    /// API endpoint URL for frontend (useful for separate deployments)
    #[arg(long)]
    api_endpoint: Option<String>,

    /// Print a load summary instead of serving
    #[arg(short, long)]
    summary: bool,

    /// Output file for the summary (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,mortalidad_dashboard=debug"
    } else {
        "info"
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let total_start = Instant::now();

    // An explicit --config must load; a searched one may be absent
    let mut config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => {
            let cwd = std::env::current_dir()?;
            load_config(&cwd)?
        }
    };
    apply_overrides(&mut config, &args);
    debug!("Configuration: {:?}", config);

    let dashboard = load_dashboard(&config)?;
    info!(
        "Loaded {} records in {:.2?}",
        dashboard.table().len(),
        total_start.elapsed()
    );

    if args.summary {
        let output: Box<dyn Write> = match &args.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(stdout()),
        };
        let mut writer = output;
        generate_summary(&dashboard, &mut writer)?;
        writer.flush()?;

        if let Some(path) = &args.output {
            info!("Summary written to: {}", path.display());
        }
        return Ok(());
    }

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        open_browser: config.server.open_browser,
        api_endpoint: args.api_endpoint.clone(),
    };

    // Run the web server using tokio runtime
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(start_server(dashboard, config.ui, server_config))
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    Ok(())
}

/// CLI args override config, which overrides defaults
fn apply_overrides(config: &mut DashboardConfig, args: &Args) {
    if let Some(dir) = &args.data_dir {
        config.data.dir = dir.clone();
    }
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.no_open {
        config.server.open_browser = false;
    }
}
