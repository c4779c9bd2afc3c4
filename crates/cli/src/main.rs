use clap::{Parser, Subcommand};
use sniproxy_dns_domain::{CliOverrides, Config};
use sniproxy_dns_infrastructure::dns::ListenerManager;
use std::net::{Ipv4Addr, SocketAddr};
use tracing::{info, warn};

mod bootstrap;
mod di;
mod stats;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "sniproxy-dns")]
#[command(version)]
#[command(about = "DNS front end that steers clients to an SNI proxy")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Upstream resolver (udp://HOST:PORT, tcp://HOST:PORT, tls://HOST:PORT)
    #[arg(long, value_name = "URL")]
    upstream: Option<String>,

    /// UDP listener bind address
    #[arg(long, value_name = "ADDR")]
    bind_udp: Option<SocketAddr>,

    /// Public IPv4 address of the SNI proxy
    #[arg(long, value_name = "IP")]
    public_ipv4: Option<Ipv4Addr>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve DOMAIN to one IPv4 address through the upstream resolver
    Lookup {
        domain: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        upstream: cli.upstream.clone(),
        public_ipv4: cli.public_ipv4,
        bind_udp: cli.bind_udp,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    match cli.command {
        Some(Command::Lookup { domain }) => run_lookup(&config, &domain).await,
        None => run_server(&config).await,
    }
}

async fn run_lookup(config: &Config, domain: &str) -> anyhow::Result<()> {
    let services = di::DnsServices::new(config).await?;
    let address = services.lookup.execute(domain).await?;
    println!("{}", address);
    Ok(())
}

async fn run_server(config: &Config) -> anyhow::Result<()> {
    bootstrap::log_startup(config);

    let services = di::DnsServices::new(config).await?;
    let listeners = ListenerManager::new(
        config.listeners.clone(),
        &config.tls,
        services.handler(),
        services.query_timeout,
    )?;
    let mut running = listeners.start().await?;

    if running.is_empty() {
        anyhow::bail!("No DNS listener could be started");
    }

    let reporter = stats::spawn_reporter(services.counters.clone(), config.logging.stats_interval);

    info!(upstream = %services.upstream.server(), "DNS server ready");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        }
        _ = running.wait() => {
            warn!("All DNS listeners stopped");
        }
    }

    if let Some(reporter) = reporter {
        reporter.abort();
    }
    running.shutdown().await;

    info!(counters = %services.counters.snapshot(), "Server shutdown complete");
    Ok(())
}
