mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, EnvFilter};

use ffa_core::{MemoryStore, Scheduler, WorkerConfig};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        // Leak is fine — called once, lives for the program's lifetime.
        Box::leak(VERSION.to_string().into_boxed_str())
    } else {
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Uptime/SSL monitoring worker and log ingestion endpoint.
#[derive(Parser)]
#[command(name = "freeforall", version = version_string(), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Arm the scheduler and serve the ingestion API.
    Serve {
        /// Listen address (e.g. 0.0.0.0:8080). Overrides config file.
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Path to TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Monitor a single URL from the command line (no API server).
    Watch {
        /// URL to probe.
        url: String,

        /// Probe interval in seconds.
        #[arg(long, default_value_t = 10)]
        interval: u64,

        /// Probe timeout in seconds.
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen, config } => {
            run_serve(listen, config).await;
        }
        Commands::Watch {
            url,
            interval,
            timeout,
        } => {
            fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .init();
            run_watch(url, interval, timeout).await;
        }
    }
}

async fn run_serve(listen_override: Option<SocketAddr>, config_path: Option<PathBuf>) {
    let app_config = if let Some(ref path) = config_path {
        match config::AppConfig::load(path) {
            Ok(c) => {
                init_tracing(&c.server.log_format);
                tracing::info!(path = %path.display(), "Loaded config file");
                Some(c)
            }
            Err(e) => {
                init_tracing("pretty");
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
    } else {
        init_tracing("pretty");
        None
    };

    let listen = listen_override
        .or(app_config.as_ref().map(|c| c.server.listen))
        .unwrap_or_else(|| "0.0.0.0:8080".parse().unwrap());

    let worker_config = app_config
        .as_ref()
        .map(|c| c.worker.to_worker_config())
        .unwrap_or_default();

    let store = Arc::new(MemoryStore::new());
    if let Some(ref app_config) = app_config {
        app_config.seed(&store);
        tracing::info!(
            monitors = app_config.monitor.len(),
            applications = app_config.application.len(),
            "Seeded store from config"
        );
    }

    let scheduler = Scheduler::new(store.clone(), worker_config);
    scheduler.start().await;

    let state = ffa_api::state::AppState::new(store).with_stats(scheduler.stats());

    tracing::info!(%listen, "Starting ingestion API server");
    if let Err(e) = ffa_api::serve_with_state(listen, state, ffa_api::shutdown_signal()).await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }

    tracing::info!("Shutdown signal received, stopping worker...");
    scheduler.stop().await;
    tracing::info!("Shutdown complete");
}

async fn run_watch(url: String, interval: u64, timeout: u64) {
    if url::Url::parse(&url).is_err() {
        eprintln!("{} invalid URL: {}", style("error:").red().bold(), url);
        std::process::exit(2);
    }

    let store = Arc::new(MemoryStore::new());
    let monitor = store.add_monitor(url.clone(), interval as u32);

    let worker_config = WorkerConfig::default()
        .with_ping_interval(Duration::from_secs(interval))
        .with_ping_timeout(Duration::from_secs(timeout));

    let scheduler = Scheduler::new(store.clone(), worker_config);

    let multi = MultiProgress::new();
    let msg_style = ProgressStyle::with_template("{wide_msg}").expect("valid template");

    multi
        .println(format!(
            "{} {}",
            style("freeforall").bold(),
            style(env!("CARGO_PKG_VERSION")).dim()
        ))
        .ok();
    multi
        .println(format!("  {} {}", style("url:     ").dim(), style(&url).bold()))
        .ok();
    multi
        .println(format!("  {} {}s", style("interval:").dim(), interval))
        .ok();
    multi
        .println(format!("  {} {}s", style("timeout: ").dim(), timeout))
        .ok();
    multi.println("").ok();
    multi
        .println(format!("{}", style("Press Ctrl+C to stop").dim()))
        .ok();
    multi.println("").ok();

    scheduler.start().await;

    let status_bar = multi.add(ProgressBar::new_spinner().with_style(msg_style));
    status_bar.set_message(format!("  {}", style("Waiting for first probe...").dim()));

    let mut seen = 0usize;

    let shutdown = ffa_api::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(500)) => {}
            _ = &mut shutdown => {
                status_bar.finish_and_clear();
                multi.println(format!("\n{}", style("Monitor stopped.").dim())).ok();
                scheduler.stop().await;
                return;
            }
        }

        let history = store.ping_history(monitor.id);
        for ping in history.iter().skip(seen) {
            let ts = ping.created_at.format("%H:%M:%S");
            if ping.is_up {
                multi
                    .println(format!(
                        "  {}  {}  {}  {}ms",
                        style(ts).dim(),
                        style("UP  ").green().bold(),
                        ping.status_code.unwrap_or(0),
                        ping.response_time_ms.unwrap_or(0),
                    ))
                    .ok();
            } else {
                multi
                    .println(format!(
                        "  {}  {}  {}",
                        style(ts).dim(),
                        style("DOWN").red().bold(),
                        ping.error_message.as_deref().unwrap_or("request failed"),
                    ))
                    .ok();
            }
        }
        seen = history.len();

        if let Some(last) = history.last() {
            let badge = if last.is_up {
                style("up").green().to_string()
            } else {
                style("down").red().to_string()
            };
            status_bar.set_message(format!(
                "  {} {}  checks={}  last status={}",
                style("state:").dim(),
                badge,
                history.len(),
                last.status_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ));
        }
    }
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}
