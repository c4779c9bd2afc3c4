#![allow(dead_code)]

use async_trait::async_trait;
use hickory_proto::op::Query;
use hickory_proto::rr::rdata::{A, CNAME};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use sniproxy_dns_application::ports::{
    MetricsSink, PolicyEngine, UpstreamAnswer, UpstreamResolver,
};
use sniproxy_dns_domain::{ConnInfo, Decision, DomainError, QueryCounter};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type UpstreamKey = (String, RecordType);

#[derive(Clone, Default)]
pub struct MockUpstreamResolver {
    responses: Arc<Mutex<HashMap<UpstreamKey, Vec<Record>>>>,
    errors: Arc<Mutex<HashMap<UpstreamKey, DomainError>>>,
    calls: Arc<Mutex<Vec<UpstreamKey>>>,
}

impl MockUpstreamResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_records(&self, name: &str, record_type: RecordType, records: Vec<Record>) {
        self.responses
            .lock()
            .unwrap()
            .insert((name.to_string(), record_type), records);
    }

    pub fn set_error(&self, name: &str, record_type: RecordType, error: DomainError) {
        self.errors
            .lock()
            .unwrap()
            .insert((name.to_string(), record_type), error);
    }

    pub fn calls(&self) -> Vec<UpstreamKey> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl UpstreamResolver for MockUpstreamResolver {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<UpstreamAnswer, DomainError> {
        let key = (name.to_string(), record_type);
        self.calls.lock().unwrap().push(key.clone());

        if let Some(err) = self.errors.lock().unwrap().get(&key).cloned() {
            return Err(err);
        }

        let records = self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default();
        Ok(UpstreamAnswer::new(records, Duration::from_millis(3)))
    }
}

#[derive(Default)]
pub struct RecordingMetrics {
    received: AtomicU64,
    proxied: AtomicU64,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn proxied(&self) -> u64 {
        self.proxied.load(Ordering::Relaxed)
    }
}

impl MetricsSink for RecordingMetrics {
    fn increment(&self, counter: QueryCounter) {
        match counter {
            QueryCounter::Received => self.received.fetch_add(1, Ordering::Relaxed),
            QueryCounter::Proxied => self.proxied.fetch_add(1, Ordering::Relaxed),
        };
    }
}

/// Policy keyed by the exact FQDN seen by the handler.
#[derive(Default)]
pub struct MockPolicyEngine {
    decisions: Mutex<HashMap<String, Decision>>,
    seen: Mutex<Vec<ConnInfo>>,
}

impl MockPolicyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, domain: &str, decision: Decision) {
        self.decisions
            .lock()
            .unwrap()
            .insert(domain.to_string(), decision);
    }

    pub fn seen(&self) -> Vec<ConnInfo> {
        self.seen.lock().unwrap().clone()
    }
}

impl PolicyEngine for MockPolicyEngine {
    fn decide(&self, conn: &ConnInfo) -> Decision {
        self.seen.lock().unwrap().push(conn.clone());
        self.decisions
            .lock()
            .unwrap()
            .get(conn.domain.as_ref())
            .copied()
            .unwrap_or_default()
    }
}

pub fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

pub fn question(s: &str, record_type: RecordType) -> Query {
    Query::query(name(s), record_type)
}

pub fn a_record(owner: &str, ip: Ipv4Addr) -> Record {
    Record::from_rdata(name(owner), 300, RData::A(A(ip)))
}

pub fn cname_record(owner: &str, target: &str) -> Record {
    Record::from_rdata(name(owner), 300, RData::CNAME(CNAME(name(target))))
}
