pub mod baseline;
pub mod cache;
pub mod client;
pub mod error;
pub mod host_identity;
pub mod transport;

pub use baseline::{BaselineReport, HostMetadata, RemoteConfigResponse};
pub use client::RemoteConfigClient;
pub use error::RemoteConfigError;
pub use host_identity::{hostname, load_or_create_host_id};
pub use transport::{HttpRemoteConfigTransport, RemoteConfigTransport};
