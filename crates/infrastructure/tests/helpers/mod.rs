mod dns_server_mock;
mod scripted_connection;
mod tls_fixtures;

pub use dns_server_mock::*;
pub use scripted_connection::*;
pub use tls_fixtures::*;
