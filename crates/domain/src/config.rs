pub mod dns;
pub mod errors;
pub mod listeners;
pub mod logging;
pub mod policy;
pub mod root;
pub mod tls;

pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use listeners::ListenersConfig;
pub use logging::LoggingConfig;
pub use policy::PolicyConfig;
pub use root::{CliOverrides, Config};
pub use tls::TlsConfig;
