#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::BinEncodable;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// Answers A questions from a fixed table; unknown names get an empty answer.
#[derive(Clone, Default)]
pub struct MockZone {
    addresses: HashMap<String, Ipv4Addr>,
}

impl MockZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_a(mut self, fqdn: &str, ip: Ipv4Addr) -> Self {
        self.addresses.insert(fqdn.to_string(), ip);
        self
    }

    pub fn respond(&self, query_bytes: &[u8]) -> Option<Vec<u8>> {
        let request = Message::from_vec(query_bytes).ok()?;
        Some(self.respond_with_id(&request, request.id()))
    }

    pub fn respond_with_id(&self, request: &Message, id: u16) -> Vec<u8> {
        let mut response = Message::new();
        response
            .set_id(id)
            .set_message_type(MessageType::Response)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(request.recursion_desired())
            .set_recursion_available(true);

        for query in request.queries() {
            response.add_query(query.clone());
            if query.query_type() == RecordType::A {
                if let Some(ip) = self.addresses.get(&query.name().to_ascii()) {
                    response.add_answer(Record::from_rdata(
                        query.name().clone(),
                        60,
                        RData::A(A(*ip)),
                    ));
                }
            }
        }

        response.to_vec().unwrap()
    }
}

pub fn a_query(name: &str) -> Message {
    let mut message = Message::new();
    message
        .set_id(fastrand::u16(..))
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(Name::from_str(name).unwrap(), RecordType::A));
    message
}

pub struct MockDnsServer {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    /// UDP resolver on an ephemeral loopback port.
    pub async fn start(zone: MockZone) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let queries = Arc::new(AtomicUsize::new(0));
        let counter = queries.clone();

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            counter.fetch_add(1, Ordering::SeqCst);
                            if let Some(response) = zone.respond(&buf[..len]) {
                                let _ = socket.send_to(&response, peer).await;
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// TCP resolver that closes every connection after answering
/// `answers_per_connection` messages. With a stall set, the very first
/// reply is split: the length prefix goes out, the body follows after the
/// stall.
pub struct MockTcpUpstream {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockTcpUpstream {
    pub async fn start(zone: MockZone, answers_per_connection: usize) -> Result<Self, std::io::Error> {
        Self::spawn(zone, answers_per_connection, None).await
    }

    pub async fn start_stalling_first(zone: MockZone, stall: Duration) -> Result<Self, std::io::Error> {
        Self::spawn(zone, usize::MAX, Some(stall)).await
    }

    async fn spawn(
        zone: MockZone,
        answers_per_connection: usize,
        stall: Option<Duration>,
    ) -> Result<Self, std::io::Error> {
        let stalled = Arc::new(AtomicBool::new(stall.is_none()));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    accepted = listener.accept() => {
                        let Ok((mut stream, _)) = accepted else { continue };
                        counter.fetch_add(1, Ordering::SeqCst);
                        let zone = zone.clone();
                        let stalled = stalled.clone();
                        tokio::spawn(async move {
                            for _ in 0..answers_per_connection {
                                let mut len_buf = [0u8; 2];
                                if stream.read_exact(&mut len_buf).await.is_err() {
                                    return;
                                }
                                let mut query = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                                if stream.read_exact(&mut query).await.is_err() {
                                    return;
                                }
                                let Some(response) = zone.respond(&query) else { return };
                                let prefix = (response.len() as u16).to_be_bytes();
                                if let (Some(stall), false) = (stall, stalled.swap(true, Ordering::SeqCst)) {
                                    if stream.write_all(&prefix).await.is_err() {
                                        return;
                                    }
                                    let _ = stream.flush().await;
                                    tokio::time::sleep(stall).await;
                                    if stream.write_all(&response).await.is_err() {
                                        return;
                                    }
                                    continue;
                                }
                                let mut framed = prefix.to_vec();
                                framed.extend_from_slice(&response);
                                if stream.write_all(&framed).await.is_err() {
                                    return;
                                }
                            }
                            let _ = stream.shutdown().await;
                        });
                    }
                }
            }
        });

        Ok(Self {
            addr,
            connections,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockTcpUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
