// labmend-api: Async Rust client for GNS3-class lab controller REST APIs

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::ControllerClient;
pub use error::Error;
pub use transport::{BasicCredentials, TlsMode, TransportConfig};
