pub mod dns;

pub use dns::{
    DnsReply, HandleDnsMessageUseCase, LookupAddressUseCase, ProxyAnswers,
    ResolveQuestionUseCase,
};
