//! Source-profile credential encryption.
//!
//! Connection configurations are stored AES-256-GCM encrypted; the key is
//! resolved from `encryption.key_ref` once at process start and plaintext
//! never leaves the remediation orchestrator.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use privguard_core::{Error, Result};
use sha2::{Digest, Sha256};

/// Length of the GCM nonce prepended to every ciphertext
const NONCE_LEN: usize = 12;

/// Symmetric cipher over source-profile configuration blobs
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    /// Resolve the key reference to key material. The reference is run
    /// through SHA-256 to produce the 256-bit key; resolving against an
    /// external vault is the deployment's concern.
    pub fn from_key_ref(key_ref: &str) -> Result<Self> {
        if key_ref.is_empty() {
            return Err(Error::configuration(
                "encryption.key_ref must be set for credential encryption",
            ));
        }
        let digest = Sha256::digest(key_ref.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypt a plaintext config. Wire form: base64(nonce || ciphertext).
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| Error::crypto("config encryption failed"))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(blob))
    }

    /// Decrypt a stored config blob
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let blob = BASE64
            .decode(encoded)
            .map_err(|e| Error::crypto(format!("config blob is not valid base64: {e}")))?;
        if blob.len() <= NONCE_LEN {
            return Err(Error::crypto("config blob too short"));
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::crypto("config decryption failed; wrong key?"))?;
        String::from_utf8(plaintext).map_err(|e| Error::crypto(format!("config not utf-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cipher = CredentialCipher::from_key_ref("unit-test-key").unwrap();
        let plaintext = r#"{"dsn":"postgresql://u:p@db-01/billing"}"#;
        let blob = cipher.encrypt(plaintext).unwrap();
        assert_ne!(blob, plaintext);
        assert_eq!(cipher.decrypt(&blob).unwrap(), plaintext);
    }

    #[test]
    fn test_nonce_makes_ciphertexts_differ() {
        let cipher = CredentialCipher::from_key_ref("unit-test-key").unwrap();
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = CredentialCipher::from_key_ref("key-a").unwrap();
        let b = CredentialCipher::from_key_ref("key-b").unwrap();
        let blob = a.encrypt("secret").unwrap();
        assert!(b.decrypt(&blob).is_err());
    }

    #[test]
    fn test_empty_key_ref_rejected() {
        assert!(CredentialCipher::from_key_ref("").is_err());
    }
}
