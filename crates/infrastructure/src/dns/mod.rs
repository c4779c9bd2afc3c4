pub mod doq;
pub mod forwarding;
pub mod listener;
pub mod server;
pub mod transport;
pub mod upstream_client;

pub use doq::DoqRelay;
pub use listener::{BindFailurePolicy, ListenerError, ListenerManager, ListenerTransport, RunningListeners};
pub use server::DnsServerHandler;
pub use upstream_client::UpstreamClient;
