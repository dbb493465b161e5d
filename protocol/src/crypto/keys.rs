//! # Key Management
//!
//! Ed25519 keypairs, public keys and signatures for registry entries.
//!
//! Registry keys are almost never generated at random: they are derived
//! from the user's root seed plus a tag (see [`crate::registry::keys`]).
//! This module only wraps ed25519-dalek so the rest of the crate never has
//! to touch raw scalars.
//!
//! ## Security considerations
//!
//! - Secret keys are zeroized on drop (ed25519-dalek does this for us).
//! - Key bytes are never logged. `Debug` prints the public half only.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing key material.
///
/// Deliberately vague, since the input is usually something a portal sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,
}

/// An Ed25519 keypair owning a registry entry.
///
/// Intentionally not `Serialize`: exporting secret material should be an
/// explicit call to [`SkyKeypair::secret_key_bytes`], never a side effect of
/// putting a struct into a JSON response.
pub struct SkyKeypair {
    signing_key: SigningKey,
}

/// The public half of a registry keypair. Appears in entry IDs and in every
/// registry request sent to a portal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkyPublicKey {
    bytes: [u8; 32],
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkySignature {
    bytes: Vec<u8>,
}

impl SkyKeypair {
    /// Construct a keypair deterministically from a 32-byte seed. The seed is
    /// the Ed25519 secret key, so the same seed always yields the same
    /// public key.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key(&self) -> SkyPublicKey {
        SkyPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign an arbitrary message. Registry code signs a 32-byte digest,
    /// not the raw entry.
    pub fn sign(&self, message: &[u8]) -> SkySignature {
        SkySignature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    pub fn verify(&self, message: &[u8], signature: &SkySignature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// Exports the 32-byte secret seed.
    ///
    /// **Handle with care.** Anyone holding these bytes can overwrite every
    /// registry entry owned by this key.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for SkyKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for SkyKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SkyKeypair(pub={})", self.public_key().to_hex())
    }
}

impl PartialEq for SkyKeypair {
    /// Compare public halves only. Secret material doesn't get compared in
    /// variable time.
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for SkyKeypair {}

// ---------------------------------------------------------------------------
// SkyPublicKey
// ---------------------------------------------------------------------------

impl SkyPublicKey {
    /// Wrap raw bytes without checking that they are a curve point. Use
    /// [`SkyPublicKey::try_from_slice`] for anything off the wire.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Parse untrusted bytes, checking both length and curve membership.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature. Returns a plain boolean: the reason a signature
    /// didn't check out is nobody's business, least of all a portal's.
    pub fn verify(&self, message: &[u8], signature: &SkySignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Some(dalek_sig) = signature.to_dalek_signature() else {
            return false;
        };
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for SkyPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SkyPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SkyPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// SkySignature
// ---------------------------------------------------------------------------

impl SkySignature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Parse untrusted signature bytes.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        if slice.len() != 64 {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self {
            bytes: slice.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn to_dalek_signature(&self) -> Option<DalekSignature> {
        let arr: [u8; 64] = self.bytes.as_slice().try_into().ok()?;
        Some(DalekSignature::from_bytes(&arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Display for SkySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SkySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "SkySignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "SkySignature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair(byte: u8) -> SkyKeypair {
        SkyKeypair::from_seed(&[byte; 32])
    }

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = keypair(7);
        let sig = kp.sign(b"registry digest");
        assert!(kp.verify(b"registry digest", &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = keypair(7);
        let sig = kp.sign(b"correct");
        assert!(!kp.verify(b"wrong", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let sig = keypair(1).sign(b"message");
        assert!(!keypair(2).verify(b"message", &sig));
    }

    #[test]
    fn deterministic_from_seed() {
        assert_eq!(keypair(42).public_key(), keypair(42).public_key());
        assert_ne!(keypair(42).public_key(), keypair(43).public_key());
    }

    #[test]
    fn test_public_key_try_from_slice() {
        let kp = keypair(3);
        let pk = SkyPublicKey::try_from_slice(kp.public_key().as_bytes()).unwrap();
        assert_eq!(pk, kp.public_key());
        assert_eq!(
            SkyPublicKey::try_from_slice(&[0u8; 16]),
            Err(KeyError::InvalidPublicKey)
        );
    }

    #[test]
    fn test_signature_length_is_checked() {
        assert_eq!(
            SkySignature::try_from_slice(&[0u8; 63]),
            Err(KeyError::InvalidSignature)
        );
        let sig = keypair(5).sign(b"x");
        assert_eq!(SkySignature::try_from_slice(sig.as_bytes()).unwrap(), sig);
    }

    #[test]
    fn truncated_signature_verifies_false() {
        let kp = keypair(9);
        let sig = kp.sign(b"m");
        let short = SkySignature {
            bytes: sig.as_bytes()[..32].to_vec(),
        };
        assert!(!kp.verify(b"m", &short));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = keypair(11);
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("SkyKeypair(pub="));
        assert!(!debug_str.contains(&hex::encode(kp.secret_key_bytes())));
    }

    #[test]
    fn test_clone_preserves_identity() {
        let kp = keypair(13);
        let cloned = kp.clone();
        assert_eq!(kp, cloned);
        assert_eq!(kp.secret_key_bytes(), cloned.secret_key_bytes());
    }
}
