use base64::Engine as _;
use ecdsa::signature::{Signer as _, Verifier as _};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use sha2::{Digest, Sha256};

use crate::generator::error::GeneratorError;

/// Signs rendered configuration bytes and computes their content hash.
/// Exists as a trait so [`crate::generator::generator::ConfigGenerator`]
/// doesn't hard-wire a key source — production uses [`P256Signer`], tests
/// can substitute a fixed key.
pub trait ConfigSigner: Send + Sync {
    fn sign(&self, content: &[u8]) -> Result<String, GeneratorError>;
}

/// P-256 ECDSA signer backed by a PKCS#8 PEM private key loaded from disk.
pub struct P256Signer {
    key: SigningKey,
}

impl P256Signer {
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, GeneratorError> {
        let key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|err| GeneratorError::KeyUnavailable(err.to_string()))?;
        Ok(Self { key })
    }

    /// Generates a fresh key pair and returns its PKCS#8 PEM encoding, for
    /// first-run bootstrap when no signing key exists yet on disk.
    pub fn generate_pkcs8_pem() -> Result<String, GeneratorError> {
        let key = SigningKey::random(&mut rand_core::OsRng);
        key.to_pkcs8_pem(p256::pkcs8::LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|err| GeneratorError::KeyUnavailable(err.to_string()))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        *self.key.verifying_key()
    }
}

impl ConfigSigner for P256Signer {
    fn sign(&self, content: &[u8]) -> Result<String, GeneratorError> {
        let signature: Signature = self.key.sign(content);
        Ok(base64::engine::general_purpose::STANDARD.encode(signature.to_der().as_bytes()))
    }
}

/// SHA-256 hash of `content`, hex-encoded.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Verifies a base64 DER-encoded signature against `content`, used by tests
/// and by operators validating a generated config out-of-band.
pub fn verify(verifying_key: &VerifyingKey, content: &[u8], signature_b64: &str) -> bool {
    let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(signature_b64) else {
        return false;
    };
    let Ok(signature) = Signature::from_der(&bytes) else {
        return false;
    };
    verifying_key.verify(content, &signature).is_ok()
}
