use sniproxy_dns_application::ports::MetricsSink;
use sniproxy_dns_domain::QueryCounter;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide query counters backed by relaxed atomics.
#[derive(Clone, Default)]
pub struct AtomicQueryCounters {
    received: Arc<AtomicU64>,

    proxied: Arc<AtomicU64>,
}

impl AtomicQueryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, counter: QueryCounter) -> u64 {
        self.cell(counter).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            received: self.get(QueryCounter::Received),
            proxied: self.get(QueryCounter::Proxied),
        }
    }

    fn cell(&self, counter: QueryCounter) -> &AtomicU64 {
        match counter {
            QueryCounter::Received => &self.received,
            QueryCounter::Proxied => &self.proxied,
        }
    }
}

impl MetricsSink for AtomicQueryCounters {
    fn increment(&self, counter: QueryCounter) {
        self.cell(counter).fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountersSnapshot {
    pub received: u64,
    pub proxied: u64,
}

impl fmt::Display for CountersSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} {}={}",
            QueryCounter::Received.as_str(),
            self.received,
            QueryCounter::Proxied.as_str(),
            self.proxied
        )
    }
}
