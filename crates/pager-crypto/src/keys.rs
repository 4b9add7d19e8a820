//! Key material types produced by the bootstrap sequence.
//!
//! All secret-bearing types store the *serialized* byte form the engine
//! hands back, so that scrubbing can overwrite every live buffer without
//! reaching into engine internals. Public keys carry the one-byte curve
//! type prefix and are 33 bytes; private scalars are 32 bytes.

use zeroize::Zeroize;

use crate::error::EngineError;

/// Curve type prefix on serialized public keys (DJB-type Curve25519).
pub const KEY_TYPE_DJB: u8 = 0x05;

/// Serialized public key length: type prefix + 32 key bytes.
pub const PUBLIC_KEY_LEN: usize = 33;

/// Serialized private scalar length.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Ed25519 signature length.
pub const SIGNATURE_LEN: usize = 64;

/// Upper bound of the engine's documented registration id range.
pub const MAX_REGISTRATION_ID: u32 = 0x3FFF;

/// The long-term identity keypair, in serialized form.
///
/// Generated exactly once per bootstrap and immutable afterwards. The
/// enclosing aggregate owns it exclusively until scrubbed.
pub struct IdentityKeyPair {
    public: [u8; PUBLIC_KEY_LEN],
    secret: [u8; PRIVATE_KEY_LEN],
}

impl IdentityKeyPair {
    pub(crate) fn from_parts(
        public: [u8; PUBLIC_KEY_LEN],
        secret: [u8; PRIVATE_KEY_LEN],
    ) -> Self {
        Self { public, secret }
    }

    /// Serialized public key (type prefix + key bytes).
    pub fn public_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public
    }

    /// Serialized private scalar. Handle with care.
    pub fn secret_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.secret
    }

    /// Compute a human-readable hex fingerprint of the public key.
    ///
    /// SHA-256 of the serialized public key, formatted as colon-separated
    /// hex pairs.
    pub fn fingerprint(&self) -> String {
        fingerprint_of(&self.public)
    }

    pub(crate) fn wipe(&mut self) {
        self.public.zeroize();
        self.secret.zeroize();
    }
}

impl Drop for IdentityKeyPair {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKeyPair")
            .field("public", &hex::encode(self.public))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Random positive integer disambiguating installations of one identity.
///
/// No local uniqueness check is performed; collisions are resolved by the
/// remote protocol, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationId(u32);

impl RegistrationId {
    /// Wrap a raw registration id, rejecting values outside `1..=0x3FFF`.
    pub fn new(raw: u32) -> Result<Self, EngineError> {
        if raw == 0 || raw > MAX_REGISTRATION_ID {
            return Err(EngineError::KeyGeneration(format!(
                "registration id {raw} outside 1..={MAX_REGISTRATION_ID}"
            )));
        }
        Ok(Self(raw))
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// A single-use ephemeral keypair consumed during session establishment.
pub struct PreKeyRecord {
    id: u32,
    public: [u8; PUBLIC_KEY_LEN],
    secret: [u8; PRIVATE_KEY_LEN],
}

impl PreKeyRecord {
    pub(crate) fn from_parts(
        id: u32,
        public: [u8; PUBLIC_KEY_LEN],
        secret: [u8; PRIVATE_KEY_LEN],
    ) -> Self {
        Self { id, public, secret }
    }

    pub const fn id(&self) -> u32 {
        self.id
    }

    pub fn public_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public
    }

    pub(crate) fn wipe(&mut self) {
        self.public.zeroize();
        self.secret.zeroize();
    }
}

impl Drop for PreKeyRecord {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl std::fmt::Debug for PreKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreKeyRecord")
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Medium-term keypair signed by the identity private key.
pub struct SignedPreKeyRecord {
    id: u32,
    public: [u8; PUBLIC_KEY_LEN],
    secret: [u8; PRIVATE_KEY_LEN],
    signature: [u8; SIGNATURE_LEN],
    /// Creation time, unix seconds.
    timestamp: u64,
}

impl SignedPreKeyRecord {
    pub(crate) fn from_parts(
        id: u32,
        public: [u8; PUBLIC_KEY_LEN],
        secret: [u8; PRIVATE_KEY_LEN],
        signature: [u8; SIGNATURE_LEN],
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            public,
            secret,
            signature,
            timestamp,
        }
    }

    pub const fn id(&self) -> u32 {
        self.id
    }

    pub fn public_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public
    }

    /// Signature over the serialized public prekey, by the identity key.
    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }

    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub(crate) fn wipe(&mut self) {
        self.public.zeroize();
        self.secret.zeroize();
        self.signature.zeroize();
        self.timestamp = 0;
    }
}

impl Drop for SignedPreKeyRecord {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl std::fmt::Debug for SignedPreKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedPreKeyRecord")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Compute a colon-separated hex fingerprint from serialized public key bytes.
pub fn fingerprint_of(pubkey_bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(pubkey_bytes);
    hash.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Check a serialized public key against an expected fingerprint in
/// constant time.
pub fn verify_fingerprint(pubkey_bytes: &[u8], expected_fingerprint: &str) -> bool {
    use subtle::ConstantTimeEq;
    fingerprint_of(pubkey_bytes)
        .as_bytes()
        .ct_eq(expected_fingerprint.as_bytes())
        .into()
}
