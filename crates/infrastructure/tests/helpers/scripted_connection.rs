#![allow(dead_code)]
use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode};
use hickory_proto::rr::Record;
use hickory_proto::serialize::binary::BinEncodable;
use sniproxy_dns_domain::DomainError;
use sniproxy_dns_infrastructure::dns::transport::UpstreamConnection;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted outcome of `recv`.
pub enum Step {
    /// A response to the last request carrying these answers.
    Answer(Vec<Record>),
    /// A response whose id does not match the last request.
    WrongId(Vec<Record>),
    Fail(DomainError),
    /// Never completes.
    Hang,
}

#[derive(Default)]
struct Shared {
    steps: Mutex<VecDeque<Step>>,
    sent: Mutex<Vec<Vec<u8>>>,
    reconnects: AtomicUsize,
    reconnect_error: Mutex<Option<DomainError>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    stream: AtomicBool,
}

/// In-memory `UpstreamConnection` that replays a script. Clones share state,
/// so a test keeps one handle and gives the other to the client.
#[derive(Clone, Default)]
pub struct ScriptedConnection {
    shared: Arc<Shared>,
}

impl ScriptedConnection {
    pub fn new(steps: Vec<Step>) -> Self {
        let connection = Self::default();
        connection.shared.steps.lock().unwrap().extend(steps);
        connection
    }

    /// Behaves like a length-framed stream transport.
    pub fn stream(steps: Vec<Step>) -> Self {
        let connection = Self::new(steps);
        connection.shared.stream.store(true, Ordering::SeqCst);
        connection
    }

    pub fn push(&self, step: Step) {
        self.shared.steps.lock().unwrap().push_back(step);
    }

    pub fn fail_reconnect(&self, error: DomainError) {
        *self.shared.reconnect_error.lock().unwrap() = Some(error);
    }

    pub fn reconnects(&self) -> usize {
        self.shared.reconnects.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.shared.sent.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn boxed(&self) -> Box<dyn UpstreamConnection> {
        Box::new(self.clone())
    }

    fn last_request(&self) -> Message {
        let sent = self.shared.sent.lock().unwrap();
        Message::from_vec(sent.last().expect("no request sent")).unwrap()
    }

    fn response(&self, id_offset: u16, answers: Vec<Record>) -> Vec<u8> {
        let request = self.last_request();
        let mut response = Message::new();
        response
            .set_id(request.id().wrapping_add(id_offset))
            .set_message_type(MessageType::Response)
            .set_op_code(OpCode::Query)
            .add_queries(request.queries().to_vec())
            .add_answers(answers);
        response.to_vec().unwrap()
    }
}

#[async_trait]
impl UpstreamConnection for ScriptedConnection {
    async fn send(&mut self, message_bytes: &[u8]) -> Result<(), DomainError> {
        let now = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.shared.sent.lock().unwrap().push(message_bytes.to_vec());
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>, DomainError> {
        let step = self.shared.steps.lock().unwrap().pop_front();
        let result = match step {
            Some(Step::Answer(answers)) => Ok(self.response(0, answers)),
            // Stays in flight: the client keeps reading for the right id.
            Some(Step::WrongId(answers)) => return Ok(self.response(1, answers)),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Hang) | None => std::future::pending().await,
        };
        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn reconnect(&mut self) -> Result<(), DomainError> {
        self.shared.reconnects.fetch_add(1, Ordering::SeqCst);
        match self.shared.reconnect_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn protocol_name(&self) -> &'static str {
        "SCRIPTED"
    }

    fn is_stream(&self) -> bool {
        self.shared.stream.load(Ordering::SeqCst)
    }
}
