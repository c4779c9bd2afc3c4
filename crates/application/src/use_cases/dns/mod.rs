mod handle_dns_message;
mod lookup_address;
mod resolve_question;

pub use handle_dns_message::{DnsReply, HandleDnsMessageUseCase};
pub use lookup_address::LookupAddressUseCase;
pub use resolve_question::{ProxyAnswers, ResolveQuestionUseCase};
