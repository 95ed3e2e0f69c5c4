pub mod error;
pub mod generated_config;
pub mod generator;
pub mod signer;
pub mod templates;

pub use error::GeneratorError;
pub use generated_config::GeneratedConfig;
pub use generator::ConfigGenerator;
pub use signer::{ConfigSigner, P256Signer};
