//! rdap-bootstrap: RDAP bootstrap redirect service
//!
//! Loads the IANA bootstrap registries, keeps them synced, and answers
//! redirect lookups.
//!
//! # Usage
//!
//! ```bash
//! # Sync and keep re-syncing until interrupted
//! ./rdap-bootstrap -c /path/to/config.json
//!
//! # One-shot lookup
//! ./rdap-bootstrap --resolve ip 1.0.0.0/24
//!
//! # Run with environment overrides
//! RDAP_BOOTSTRAP_LOG_LEVEL=debug ./rdap-bootstrap
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use rdap_bootstrap::bootstrap::{
    spawn_periodic_sync, Family, RedirectQuery, RedirectRegistry, Resolver, SyncCoordinator,
    SyncReport,
};
use rdap_bootstrap::config::{load_config_with_env, BootstrapConfig, Config};

/// Command-line arguments
struct Args {
    /// Configuration file path
    config_path: PathBuf,
    /// Generate default configuration
    generate_config: bool,
    /// Check configuration only
    check_config: bool,
    /// Sync once and exit
    once: bool,
    /// Resolve one query (kind, value) and exit
    resolve: Option<(String, String)>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config_path = PathBuf::from("/etc/rdap-bootstrap/config.json");
        let mut generate_config = false;
        let mut check_config = false;
        let mut once = false;
        let mut resolve = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => {
                    if let Some(path) = args.next() {
                        config_path = PathBuf::from(path);
                    }
                }
                "-g" | "--generate-config" => {
                    generate_config = true;
                }
                "--check" => {
                    check_config = true;
                }
                "--once" => {
                    once = true;
                }
                "--resolve" => match (args.next(), args.next()) {
                    (Some(kind), Some(value)) => resolve = Some((kind, value)),
                    _ => {
                        eprintln!("--resolve needs a KIND and a VALUE");
                        print_help();
                        std::process::exit(1);
                    }
                },
                "-h" | "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "-v" | "--version" => {
                    println!("rdap-bootstrap v{}", rdap_bootstrap::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {arg}");
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        Self {
            config_path,
            generate_config,
            check_config,
            once,
            resolve,
        }
    }
}

fn print_help() {
    println!(
        r"rdap-bootstrap v{}

RDAP bootstrap redirect resolution service.

USAGE:
    rdap-bootstrap [OPTIONS]

OPTIONS:
    -c, --config <PATH>        Configuration file path [default: /etc/rdap-bootstrap/config.json]
    -g, --generate-config      Generate default configuration and exit
    --check                    Check configuration and exit
    --once                     Sync all bootstrap files once and exit
    --resolve <KIND> <VALUE>   Sync, resolve one query and exit
                               KIND is one of: ip, domain, autnum, entity
    -h, --help                 Print help information
    -v, --version              Print version information

ENVIRONMENT:
    RDAP_BOOTSTRAP_DIR             Override the bootstrap file directory
    RDAP_BOOTSTRAP_LOG_LEVEL       Override log level (trace, debug, info, warn, error)
    RDAP_BOOTSTRAP_SYNC_INTERVAL   Override sync interval in seconds

EXAMPLE:
    # Fetch the IANA registries
    for f in ipv4 ipv6 dns asn object-tags; do
        curl -o /etc/rdap-bootstrap/$f.json https://data.iana.org/rdap/$f.json
    done

    rdap-bootstrap --resolve ip 1.0.0.0/24
",
        rdap_bootstrap::VERSION
    );
}

/// Initialize logging
fn init_logging(config: &Config) {
    let level = match config.log.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.log.target)
        .with_writer(std::io::stderr);

    if config.log.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Run one full sync pass on the blocking pool
async fn sync_once(coordinator: &Arc<SyncCoordinator>, config: &BootstrapConfig) -> Result<SyncReport> {
    let coordinator = Arc::clone(coordinator);
    let config = config.clone();
    Ok(tokio::task::spawn_blocking(move || coordinator.sync_all(&config)).await?)
}

/// Main application entry point
#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Instant::now();

    let args = Args::parse();

    if args.generate_config {
        rdap_bootstrap::config::create_default_config(&args.config_path)?;
        println!("Generated default configuration at {:?}", args.config_path);
        return Ok(());
    }

    let config = load_config_with_env(&args.config_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration from {:?}: {}",
            args.config_path,
            e
        )
    })?;

    if args.check_config {
        println!("Configuration is valid");
        return Ok(());
    }

    init_logging(&config);

    info!("rdap-bootstrap v{}", rdap_bootstrap::VERSION);
    info!("Configuration loaded from {:?}", args.config_path);

    let registry = Arc::new(RedirectRegistry::new());
    let coordinator = Arc::new(SyncCoordinator::new(Arc::clone(&registry)));

    let report = sync_once(&coordinator, &config.bootstrap).await?;
    info!(
        "Initial sync: {report}, {} delegations loaded in {:.2}ms",
        registry.total_records(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );

    if let Some((kind, value)) = &args.resolve {
        let Some(query) = RedirectQuery::from_parts(kind, value) else {
            bail!("Unknown query kind '{kind}' (expected ip, domain, autnum or entity)");
        };
        let resolver = Resolver::with_options(Arc::clone(&registry), config.resolver);
        match resolver.resolve(&query) {
            Some(target) => {
                let location = target.location(&query)?;
                println!("{location}");
                println!("  matched {} via {}", target.matched_key, target.url);
            }
            None => println!("no redirect"),
        }
        return Ok(());
    }

    if args.once {
        for family in Family::ALL {
            let info = registry.snapshot_info(family);
            println!("{family}: v{} ({} records)", info.version, info.records);
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let sync_handle = spawn_periodic_sync(
        Arc::clone(&coordinator),
        config.bootstrap.clone(),
        config.bootstrap.sync_interval(),
        shutdown_rx,
    );
    info!(
        "Periodic sync every {}s",
        config.bootstrap.sync_interval_secs
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, initiating shutdown...");
        }
        () = wait_for_sigterm() => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    let _ = shutdown_tx.send(());
    if tokio::time::timeout(Duration::from_secs(5), sync_handle)
        .await
        .is_err()
    {
        warn!("Periodic sync did not stop within 5s");
    }

    let stats = registry.stats().snapshot();
    info!("Served {} lookups", stats.total_lookups());
    for family in stats.families() {
        info!(
            family = %family.family,
            hits = family.hits,
            misses = family.misses,
            replaces = family.replaces,
            rejected = family.rejected,
            "Final registry stats"
        );
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGTERM signal
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "Failed to register SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    // On non-Unix platforms, just wait forever
    std::future::pending::<()>().await
}
