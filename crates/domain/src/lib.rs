//! SNI proxy DNS domain layer
pub mod config;
pub mod conn_info;
pub mod decision;
pub mod errors;
pub mod fqdn;
pub mod metrics;
pub mod upstream_protocol;

pub use config::{CliOverrides, Config, ConfigError};
pub use conn_info::ConnInfo;
pub use decision::Decision;
pub use errors::DomainError;
pub use fqdn::to_fqdn;
pub use metrics::QueryCounter;
pub use upstream_protocol::{UpstreamAddr, UpstreamProtocol};
