/// Launcher Mirror - scheduled release mirroring server
use clap::{Parser, Subcommand};
use mirror_core::VersionStore;
use mirror_github::GithubResolver;
use mirror_server::{api, config::ServerConfig, state::AppState};
use mirror_storage::VersionIndex;
use mirror_sync::{DownloadManager, LauncherRegistry, ScanOrchestrator, ScanScheduler};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mirror-server")]
#[command(about = "Mirrors the newest release of each configured launcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server and the periodic scanner
    Serve {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run one scan pass and exit
    Scan {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the latest mirrored version of a launcher
    Latest {
        /// Launcher name
        launcher: String,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List every mirrored version of a launcher
    History {
        /// Launcher name
        launcher: String,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mirror_server=info,mirror_sync=info,mirror_github=info,mirror_storage=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            serve(config.as_deref()).await?;
        }
        Commands::Scan { config } => {
            scan_once(config.as_deref()).await?;
        }
        Commands::Latest { launcher, config } => {
            print_latest(config.as_deref(), &launcher).await?;
        }
        Commands::History { launcher, config } => {
            print_history(config.as_deref(), &launcher).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    let config = ServerConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Open the version index, creating the database file's directory first
async fn open_index(config: &ServerConfig) -> anyhow::Result<Arc<VersionIndex>> {
    if let Some(parent) = sqlite_file(&config.storage.database_url).and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = mirror_storage::create_pool(&config.storage.database_url).await?;
    mirror_storage::run_migrations(&pool).await?;
    tracing::info!("Version index ready");

    Ok(Arc::new(VersionIndex::new(pool)))
}

/// File path of a `sqlite:` URL, `None` for in-memory databases
fn sqlite_file(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}

async fn build_orchestrator(
    config: &ServerConfig,
    index: Arc<VersionIndex>,
) -> anyhow::Result<Arc<ScanOrchestrator>> {
    tokio::fs::create_dir_all(&config.storage.base_path).await?;

    let registry = Arc::new(LauncherRegistry::new(&config.launchers));
    let hydrated = registry.hydrate(index.as_ref()).await;
    tracing::info!(
        "Hydrated {} of {} launchers from the version index",
        hydrated,
        config.launchers.len()
    );

    let resolver = Arc::new(GithubResolver::new(config.github_config())?);
    let mirror = Arc::new(DownloadManager::new(config.download_settings())?);

    let orchestrator = ScanOrchestrator::new(
        config.launchers.clone(),
        resolver,
        mirror,
        index,
        registry,
    )
    .with_launcher_timeout(config.launcher_timeout());

    Ok(Arc::new(orchestrator))
}

async fn serve(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    tracing::info!("Starting Launcher Mirror");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);
    tracing::info!("Mirror root: {}", config.storage.base_path.display());
    tracing::info!("Public download base: {}", config.public_urls().base());

    let index = open_index(&config).await?;
    let orchestrator = build_orchestrator(&config, Arc::clone(&index)).await?;

    let scheduler = ScanScheduler::start(
        Arc::clone(&orchestrator),
        config.scan_interval(),
        config.schedule.scan_on_startup,
    );
    tracing::info!(
        "Scheduler started: every {} minutes (scan on startup: {})",
        config.schedule.interval_minutes,
        config.schedule.scan_on_startup
    );

    let store: Arc<dyn VersionStore> = index;
    let app_state = AppState::new(orchestrator, store);
    let app = api::router(app_state, &config.storage.base_path);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Stopping scheduler");
    scheduler.stop().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn scan_once(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let index = open_index(&config).await?;
    let orchestrator = build_orchestrator(&config, index).await?;

    let summary = orchestrator.scan().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.failed_count() > 0 {
        anyhow::bail!("{} launcher(s) failed", summary.failed_count());
    }
    Ok(())
}

async fn print_latest(config_path: Option<&Path>, launcher: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let index = open_index(&config).await?;

    let version = index.latest_version(launcher).await?.unwrap_or_default();
    println!("{version}");
    Ok(())
}

async fn print_history(config_path: Option<&Path>, launcher: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let index = open_index(&config).await?;

    let entries = index.history(launcher).await?;
    if entries.is_empty() {
        println!("No versions recorded for {launcher}");
        return Ok(());
    }

    println!("Versions of {launcher}:");
    for entry in entries {
        let marker = if entry.is_latest { "*" } else { " " };
        println!(
            "  {} {} ({}) {}",
            marker,
            entry.version,
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.manifest_path.display()
        );
    }

    Ok(())
}
