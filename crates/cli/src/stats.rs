use sniproxy_dns_infrastructure::metrics::AtomicQueryCounters;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Logs a counter snapshot every `interval_secs`; 0 disables the reporter.
pub fn spawn_reporter(counters: AtomicQueryCounters, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let snapshot = counters.snapshot();
            info!(
                received = snapshot.received,
                proxied = snapshot.proxied,
                "Query counters"
            );
        }
    }))
}
