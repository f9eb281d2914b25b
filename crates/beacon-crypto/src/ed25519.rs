//! Ed25519 signing and verification (RFC 8032).
//!
//! Reporters sign observation digests with Ed25519. A reporter's identity
//! on the oracle is the 32 raw bytes of its verifying key, so "recovering"
//! the signer of a digest amounts to verifying the signature against the
//! claimed identity.
//!
//! This module wraps `ed25519-dalek` with beacon-specific types.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// Length in bytes of an encoded Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// An Ed25519 signing key (private key).
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl Clone for SigningKey {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// An Ed25519 verification key (public key).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

/// An Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

/// An Ed25519 keypair held by a reporter.
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            inner: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a signing key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    /// Get the raw bytes of this signing key.
    ///
    /// The returned copy is wiped when dropped.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.inner.to_bytes())
    }

    /// Get the corresponding verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            inner: self.inner.sign(message),
        }
    }
}

impl VerifyingKey {
    /// Create a verifying key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Get the raw bytes of this verifying key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Get the raw bytes as a slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.inner.as_bytes()
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        self.inner
            .verify(message, &signature.inner)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self {
            inner: ed25519_dalek::Signature::from_bytes(bytes),
        }
    }

    /// Parse a signature from an untrusted byte slice.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidSignatureEncoding`] if the slice is not exactly
    /// [`SIGNATURE_LENGTH`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; SIGNATURE_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureEncoding {
                    expected: SIGNATURE_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self::from_bytes(&array))
    }

    /// Get the raw bytes of this signature.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }
}

impl KeyPair {
    /// Generate a new random Ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate();
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create a keypair from a signing key's raw bytes.
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// The reporter identity of this keypair (raw verifying key bytes).
    pub fn identity(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }
}

/// Check that `signature` over `digest` was produced by `signer`.
///
/// `signer` is a reporter identity: the raw bytes of an Ed25519 verifying key.
///
/// # Errors
///
/// - [`CryptoError::InvalidSignatureEncoding`] if `signature` is malformed
/// - [`CryptoError::InvalidKey`] if `signer` is not a valid public key
/// - [`CryptoError::SignatureVerification`] if the signature does not verify
pub fn verify_signer(signer: &[u8; 32], digest: &[u8; 32], signature: &[u8]) -> Result<()> {
    let signature = Signature::from_slice(signature)?;
    let key = VerifyingKey::from_bytes(signer)?;
    key.verify(digest, &signature)
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.verifying_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let msg = b"beacon observation";
        let sig = kp.signing_key.sign(msg);
        assert!(kp.verifying_key.verify(msg, &sig).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign(b"correct message");
        assert!(kp.verifying_key.verify(b"wrong message", &sig).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let sig = kp1.signing_key.sign(b"test");
        assert!(kp2.verifying_key.verify(b"test", &sig).is_err());
    }

    #[test]
    fn test_secret_bytes_restore_same_identity() {
        let kp = KeyPair::generate();
        let secret = kp.signing_key.to_bytes();
        assert_eq!(KeyPair::from_bytes(&secret).identity(), kp.identity());

        let cloned = kp.signing_key.clone();
        assert_eq!(cloned.verifying_key(), kp.verifying_key);
        assert_eq!(*cloned.to_bytes(), *secret);
    }

    #[test]
    fn test_deterministic_key_derivation() {
        let kp1 = KeyPair::from_bytes(&[42u8; 32]);
        let kp2 = KeyPair::from_bytes(&[42u8; 32]);
        assert_eq!(kp1.identity(), kp2.identity());

        let kp3 = KeyPair::from_bytes(&[43u8; 32]);
        assert_ne!(kp1.identity(), kp3.identity());
    }

    #[test]
    fn test_verify_signer_accepts_digest_signature() {
        let kp = KeyPair::from_bytes(&[7u8; 32]);
        let digest = crate::blake3::hash(b"digest");
        let sig = kp.signing_key.sign(&digest);
        verify_signer(&kp.identity(), &digest, &sig.to_bytes()).expect("valid signature");
    }

    #[test]
    fn test_verify_signer_rejects_other_signer() {
        let kp = KeyPair::from_bytes(&[7u8; 32]);
        let other = KeyPair::from_bytes(&[8u8; 32]);
        let digest = crate::blake3::hash(b"digest");
        let sig = kp.signing_key.sign(&digest);
        let err = verify_signer(&other.identity(), &digest, &sig.to_bytes()).unwrap_err();
        assert!(matches!(err, CryptoError::SignatureVerification));
    }

    #[test]
    fn test_verify_signer_rejects_short_signature() {
        let kp = KeyPair::from_bytes(&[7u8; 32]);
        let digest = crate::blake3::hash(b"digest");
        let err = verify_signer(&kp.identity(), &digest, &[0u8; 63]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidSignatureEncoding { expected: 64, actual: 63 }
        ));
    }

    #[test]
    fn test_signature_from_slice() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign(b"test");
        let restored = Signature::from_slice(&sig.to_bytes()).expect("64 bytes");
        assert_eq!(sig, restored);
        assert!(Signature::from_slice(&[]).is_err());
    }
}
