use super::doq::DoqRelay;
use super::server::DnsServerHandler;
use crate::tls::{TlsError, TlsMaterial};
use hickory_server::ServerFuture;
use sniproxy_dns_domain::config::{ListenersConfig, TlsConfig};
use socket2::{Domain, Protocol, Socket, Type};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Handshake timeout for DNS-over-TLS clients.
const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTransport {
    Udp,
    Tcp,
    Tls,
    Quic,
}

impl fmt::Display for ListenerTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
            Self::Tls => "TLS",
            Self::Quic => "QUIC",
        })
    }
}

/// What a failed bind does to start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindFailurePolicy {
    /// Abort start-up with an error.
    Fatal,
    /// Log and continue without the listener.
    LogOnly,
}

impl BindFailurePolicy {
    pub fn for_transport(transport: ListenerTransport) -> Self {
        match transport {
            ListenerTransport::Udp | ListenerTransport::Tls => Self::Fatal,
            ListenerTransport::Tcp | ListenerTransport::Quic => Self::LogOnly,
        }
    }
}

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Failed to bind {transport} listener on {addr}: {source}")]
    Bind {
        transport: ListenerTransport,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("{transport} listener on {addr} requires tls.cert and tls.key")]
    MissingCertificate {
        transport: ListenerTransport,
        addr: SocketAddr,
    },

    #[error("QUIC configuration error: {0}")]
    Quic(String),
}

/// Starts every configured listener; all of them share one handler.
pub struct ListenerManager {
    listeners: ListenersConfig,
    tls: Option<TlsMaterial>,
    handler: DnsServerHandler,
    upstream_timeout: Duration,
}

impl ListenerManager {
    /// Certificate material is loaded here, once, when a TLS or QUIC
    /// listener is configured. Failing to load it is fatal.
    pub fn new(
        listeners: ListenersConfig,
        tls_config: &TlsConfig,
        handler: DnsServerHandler,
        upstream_timeout: Duration,
    ) -> Result<Self, ListenerError> {
        let needs_cert = [
            (ListenerTransport::Tls, listeners.tls),
            (ListenerTransport::Quic, listeners.quic),
        ]
        .into_iter()
        .find_map(|(transport, addr)| addr.map(|addr| (transport, addr)));

        let tls = match needs_cert {
            None => None,
            Some((transport, addr)) => {
                let (cert, key) = tls_config
                    .paths()
                    .ok_or(ListenerError::MissingCertificate { transport, addr })?;
                let material = TlsMaterial::load(cert, key)?;
                info!(cert, certificates = material.cert_count(), "TLS certificate loaded");
                Some(material)
            }
        };

        Ok(Self {
            listeners,
            tls,
            handler,
            upstream_timeout,
        })
    }

    pub async fn start(self) -> Result<RunningListeners, ListenerError> {
        let mut running = RunningListeners::default();
        let mut server = ServerFuture::new(self.handler.clone());
        let mut registered = 0usize;

        if let Some(addr) = self.listeners.udp {
            match bind_udp(addr) {
                Ok(socket) => {
                    running.udp = socket.local_addr().ok();
                    server.register_socket(socket);
                    registered += 1;
                    info!(bind_address = %addr, "UDP DNS listener started");
                }
                Err(e) => bind_failed(ListenerTransport::Udp, addr, e)?,
            }
        }

        let tcp_timeout = Duration::from_secs(self.listeners.tcp_timeout);

        if let Some(addr) = self.listeners.tcp {
            match bind_tcp(addr) {
                Ok(listener) => {
                    running.tcp = listener.local_addr().ok();
                    server.register_listener(listener, tcp_timeout);
                    registered += 1;
                    info!(bind_address = %addr, "TCP DNS listener started");
                }
                Err(e) => bind_failed(ListenerTransport::Tcp, addr, e)?,
            }
        }

        if let (Some(addr), Some(material)) = (self.listeners.tls, &self.tls) {
            let tls_config = material.server_config(&[])?;
            match bind_tcp(addr) {
                Ok(listener) => {
                    running.tls = listener.local_addr().ok();
                    server
                        .register_tls_listener_with_tls_config(
                            listener,
                            TLS_HANDSHAKE_TIMEOUT,
                            tls_config,
                        )
                        .map_err(|source| ListenerError::Bind {
                            transport: ListenerTransport::Tls,
                            addr,
                            source,
                        })?;
                    registered += 1;
                    info!(bind_address = %addr, "DNS-over-TLS listener started");
                }
                Err(e) => bind_failed(ListenerTransport::Tls, addr, e)?,
            }
        }

        if registered > 0 {
            running.join_set.spawn(async move {
                if let Err(e) = server.block_until_done().await {
                    error!(error = %e, "DNS server error");
                }
            });
        }

        if let (Some(addr), Some(material)) = (self.listeners.quic, &self.tls) {
            match running.udp {
                None => {
                    warn!(bind_address = %addr, "DNS-over-QUIC requires the UDP listener; not starting it");
                }
                Some(udp_addr) => {
                    match DoqRelay::bind(addr, material, udp_addr, self.upstream_timeout) {
                        Ok(relay) => {
                            running.quic = relay.local_addr().ok();
                            info!(bind_address = %addr, backend = %relay.backend(), "DNS-over-QUIC listener started");
                            running.join_set.spawn(relay.run());
                        }
                        Err(ListenerError::Bind { source, .. }) => {
                            bind_failed(ListenerTransport::Quic, addr, source)?
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        Ok(running)
    }
}

fn bind_failed(
    transport: ListenerTransport,
    addr: SocketAddr,
    source: io::Error,
) -> Result<(), ListenerError> {
    error!(transport = %transport, bind_address = %addr, error = %source, "Failed to bind DNS listener");
    info!("You can run `sudo ss -pltun` to see what else is listening on that port");

    match BindFailurePolicy::for_transport(transport) {
        BindFailurePolicy::Fatal => Err(ListenerError::Bind {
            transport,
            addr,
            source,
        }),
        BindFailurePolicy::LogOnly => Ok(()),
    }
}

/// Handles to the spawned listener tasks and their bound addresses.
#[derive(Default)]
pub struct RunningListeners {
    pub udp: Option<SocketAddr>,
    pub tcp: Option<SocketAddr>,
    pub tls: Option<SocketAddr>,
    pub quic: Option<SocketAddr>,
    join_set: JoinSet<()>,
}

impl RunningListeners {
    pub fn is_empty(&self) -> bool {
        self.join_set.is_empty()
    }

    /// Waits until every listener task has exited.
    pub async fn wait(&mut self) {
        while let Some(result) = self.join_set.join_next().await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    error!(error = %e, "DNS listener task failed");
                }
            }
        }
    }

    pub async fn shutdown(mut self) {
        self.join_set.abort_all();
        self.wait().await;
    }
}

fn bind_udp(addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

fn bind_tcp(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
