// Port Layer - Interfaces for external dependencies

pub mod transport;

// Re-exports
pub use transport::{
    ApiError, HttpMethod, Transport, TransportError, TransportRequest, TransportResponse,
};

pub mod mocks {
    pub use super::transport::mocks::*;
}
