use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::Record;
use sniproxy_dns_domain::DomainError;

#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub rcode: ResponseCode,

    pub truncated: bool,

    pub answers: Vec<Record>,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Message id from the wire header, without decoding the rest.
    pub fn peek_id(response_bytes: &[u8]) -> Option<u16> {
        match response_bytes {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    pub fn parse(response_bytes: &[u8]) -> Result<DnsResponse, DomainError> {
        let mut message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        Ok(DnsResponse {
            rcode: message.response_code(),
            truncated: message.truncated(),
            answers: message.take_answers(),
        })
    }
}
