pub mod dns;
pub mod metrics;
pub mod policy;
pub mod tls;
