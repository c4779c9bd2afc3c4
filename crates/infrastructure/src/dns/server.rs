use hickory_proto::op::{Header, Query, ResponseCode};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use sniproxy_dns_application::use_cases::HandleDnsMessageUseCase;
use std::sync::Arc;
use tracing::{debug, error};

/// Adapter from hickory-server requests to the message handling use case.
/// Every listener (UDP, TCP, TLS) shares one handler.
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsMessageUseCase>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsMessageUseCase>) -> Self {
        Self { use_case }
    }
}

#[async_trait::async_trait]
impl RequestHandler for DnsServerHandler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        let queries: Vec<Query> = request
            .queries()
            .iter()
            .map(|query| query.original().clone())
            .collect();

        debug!(client = %request.src(), questions = queries.len(), "DNS message received");

        let reply = self
            .use_case
            .execute(request.src(), request.header().op_code(), &queries)
            .await;

        send_reply(request, &mut response_handle, reply.response_code, &reply.answers).await
    }
}

async fn send_reply<R: ResponseHandler>(
    request: &Request,
    response_handle: &mut R,
    code: ResponseCode,
    answers: &[hickory_proto::rr::Record],
) -> ResponseInfo {
    let builder = MessageResponseBuilder::from_message_request(request);
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(code);
    header.set_recursion_available(true);
    let response = builder.build(header, answers.iter(), &[], &[], &[]);

    match response_handle.send_response(response).await {
        Ok(info) => info,
        Err(e) => {
            error!(error = %e, "Failed to send response");
            ResponseInfo::from(*request.header())
        }
    }
}
