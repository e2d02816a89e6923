// Meili Infrastructure - HTTP Adapter
// Implements: Transport (reqwest)

mod connection;
mod http_transport;

pub use connection::{AuthScheme, HttpTransportConfig};
pub use http_transport::HttpTransport;

// Note: reqwest::Error conversion is handled by `map_reqwest_error`
// due to Rust's orphan rules (cannot implement From<reqwest::Error> for TransportError here)
