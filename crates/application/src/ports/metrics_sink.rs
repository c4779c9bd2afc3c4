use sniproxy_dns_domain::QueryCounter;

/// Write-only sink for the process-wide query counters.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, counter: QueryCounter);
}
