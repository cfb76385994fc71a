//! Credential hashing and verification.
//!
//! Secrets are hashed with a random per-user salt and compared in
//! constant time. The stored form is opaque to the rest of the crate:
//! `"<salt-hex>$<digest-hex>"`. Plaintext secrets are wrapped in a
//! zeroizing type so they are wiped from memory on drop.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// A plaintext secret, wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Wraps a plaintext secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// A salted credential hash in its stored form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Derives a hash from a secret with a fresh random salt.
    #[must_use]
    pub fn derive(secret: &Secret) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::derive_with_salt(&salt, secret)
    }

    fn derive_with_salt(salt: &[u8], secret: &Secret) -> Self {
        let digest = Self::digest(salt, secret);
        Self(format!("{}${}", hex::encode(salt), hex::encode(digest)))
    }

    fn digest(salt: &[u8], secret: &Secret) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(secret.as_bytes());
        hasher.finalize().into()
    }

    /// Verifies a secret against this hash in constant time.
    ///
    /// A malformed stored value never verifies.
    #[must_use]
    pub fn verify(&self, secret: &Secret) -> bool {
        let Some((salt_hex, digest_hex)) = self.0.split_once('$') else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        let Ok(expected) = hex::decode(digest_hex) else {
            return false;
        };

        let actual = Self::digest(&salt, secret);
        actual.ct_eq(expected.as_slice()).into()
    }

    /// Returns the stored string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reconstructs a hash from its stored form.
    #[must_use]
    pub fn from_stored(stored: impl Into<String>) -> Self {
        Self(stored.into())
    }
}
