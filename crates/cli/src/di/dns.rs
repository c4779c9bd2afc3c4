use sniproxy_dns_application::use_cases::{
    HandleDnsMessageUseCase, LookupAddressUseCase, ProxyAnswers, ResolveQuestionUseCase,
};
use sniproxy_dns_domain::{Config, UpstreamProtocol};
use sniproxy_dns_infrastructure::dns::transport;
use sniproxy_dns_infrastructure::dns::{DnsServerHandler, UpstreamClient};
use sniproxy_dns_infrastructure::metrics::AtomicQueryCounters;
use sniproxy_dns_infrastructure::policy::DomainListPolicy;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const UPSTREAM_RETRY_INTERVAL: Duration = Duration::from_secs(5);

pub struct DnsServices {
    pub upstream: Arc<UpstreamClient>,
    pub counters: AtomicQueryCounters,
    pub handler_use_case: Arc<HandleDnsMessageUseCase>,
    pub lookup: Arc<LookupAddressUseCase>,
    pub query_timeout: Duration,
}

impl DnsServices {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        info!("Initializing DNS services");

        let protocol = config.upstream_protocol()?;
        let query_timeout = Duration::from_millis(config.dns.query_timeout);
        let upstream = Self::setup_upstream(protocol, query_timeout).await;

        let counters = AtomicQueryCounters::new();
        let policy = Arc::new(DomainListPolicy::from_config(&config.policy));

        let resolver = Arc::new(ResolveQuestionUseCase::new(
            upstream.clone(),
            Arc::new(counters.clone()),
            ProxyAnswers {
                ipv4: config.dns.public_ipv4,
                ipv6: config.dns.public_ipv6,
                ttl: config.dns.answer_ttl,
            },
        ));

        let handler_use_case = Arc::new(HandleDnsMessageUseCase::new(policy, resolver));
        let lookup = Arc::new(LookupAddressUseCase::new(
            upstream.clone(),
            config.dns.max_cname_chain,
        ));

        Ok(Self {
            upstream,
            counters,
            handler_use_case,
            lookup,
            query_timeout,
        })
    }

    pub fn handler(&self) -> DnsServerHandler {
        DnsServerHandler::new(self.handler_use_case.clone())
    }

    /// The client starts without a connection. If the first connect fails,
    /// a background task keeps retrying and installs the connection once
    /// the upstream is reachable; forwarded queries fail until then.
    async fn setup_upstream(protocol: UpstreamProtocol, timeout: Duration) -> Arc<UpstreamClient> {
        let client = Arc::new(UpstreamClient::disconnected(protocol.to_string(), timeout));

        match transport::connect(&protocol, timeout).await {
            Ok(connection) => {
                info!(upstream = %protocol, protocol = connection.protocol_name(), "Connected to upstream resolver");
                client.install(connection).await;
            }
            Err(e) => {
                warn!(upstream = %protocol, error = %e, "Upstream resolver unreachable, retrying in background");
                Self::start_reconnect_task(client.clone(), protocol, timeout);
            }
        }

        client
    }

    fn start_reconnect_task(client: Arc<UpstreamClient>, protocol: UpstreamProtocol, timeout: Duration) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(UPSTREAM_RETRY_INTERVAL).await;
                match transport::connect(&protocol, timeout).await {
                    Ok(connection) => {
                        client.install(connection).await;
                        info!(upstream = %protocol, "Connected to upstream resolver");
                        break;
                    }
                    Err(e) => {
                        warn!(upstream = %protocol, error = %e, "Upstream resolver still unreachable");
                    }
                }
            }
        });
    }
}
