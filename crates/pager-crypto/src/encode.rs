//! Display encodings of key material.
//!
//! Pure functions from already-serialized key bytes to hex and Base64
//! strings. Nothing here regenerates or reserializes keys; the encoder
//! only reads the bytes the aggregate already owns.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::keys::fingerprint_of;
use crate::user::UserContext;

/// Lowercase hex, two digits per byte.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Standard-alphabet Base64 with padding.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// The display strings derived from one identity keypair.
///
/// Owned by whoever called [`encode`]; zeroized on drop, and scrubbed
/// with the aggregate once attached to it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DisplayStrings {
    public_hex: String,
    public_base64: String,
    secret_hex: String,
    secret_base64: String,
    fingerprint: String,
}

impl DisplayStrings {
    /// Hex of the 33-byte serialized public key (66 chars).
    pub fn public_hex(&self) -> &str {
        &self.public_hex
    }

    /// Base64 of the 33-byte serialized public key.
    pub fn public_base64(&self) -> &str {
        &self.public_base64
    }

    /// Hex of the 32-byte private scalar (64 chars).
    pub fn secret_hex(&self) -> &str {
        &self.secret_hex
    }

    /// Base64 of the 32-byte private scalar.
    pub fn secret_base64(&self) -> &str {
        &self.secret_base64
    }

    /// Colon-separated hex fingerprint of the public key.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl std::fmt::Debug for DisplayStrings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayStrings")
            .field("public_hex", &self.public_hex)
            .field("secret_hex", &"[REDACTED]")
            .finish()
    }
}

/// Derive the display strings from the aggregate's key bytes.
///
/// Deterministic and side-effect-free apart from the allocations. The
/// fingerprint is computed here, from the serialized public key, so
/// consumers never have to decode a display string to get it back.
pub fn encode(user: &UserContext) -> DisplayStrings {
    let public = user.identity().public_bytes();
    let secret = user.identity().secret_bytes();
    DisplayStrings {
        public_hex: encode_hex(public),
        public_base64: encode_base64(public),
        secret_hex: encode_hex(secret),
        secret_base64: encode_base64(secret),
        fingerprint: fingerprint_of(public),
    }
}
