use sniproxy_dns_domain::{CliOverrides, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` wins over `logging.level` when set.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if config.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

pub fn log_startup(config: &Config) {
    info!("Starting sniproxy-dns v{}", env!("CARGO_PKG_VERSION"));
    info!(
        upstream = %config.dns.upstream,
        query_timeout_ms = config.dns.query_timeout,
        default_decision = %config.policy.default,
        "Configuration loaded"
    );

    if let Some(ipv4) = config.dns.public_ipv4 {
        info!(public_ipv4 = %ipv4, public_ipv6 = ?config.dns.public_ipv6, "Proxied names resolve to the public address");
    }
}
