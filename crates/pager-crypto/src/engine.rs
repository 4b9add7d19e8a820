//! Capability interface to the underlying elliptic-curve engine.
//!
//! The bootstrap core never touches curve arithmetic directly; it drives
//! an engine through [`CryptoEngine`]. The production implementation
//! ([`DalekEngine`]) is backed by the dalek crates: the identity is an
//! Ed25519 signing key whose public half serializes in Montgomery form
//! behind the curve type prefix, prekeys are X25519 keypairs, and the
//! signed prekey carries an Ed25519 signature over its serialized public
//! key.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::EngineError;
use crate::keys::{
    IdentityKeyPair, KEY_TYPE_DJB, MAX_REGISTRATION_ID, PUBLIC_KEY_LEN, PreKeyRecord,
    RegistrationId, SignedPreKeyRecord,
};

/// Prefix raw public key bytes with the curve type byte.
pub fn serialize_public_key(raw: &[u8; 32]) -> [u8; PUBLIC_KEY_LEN] {
    let mut out = [0u8; PUBLIC_KEY_LEN];
    out[0] = KEY_TYPE_DJB;
    out[1..].copy_from_slice(raw);
    out
}

/// The fixed capability surface the bootstrap core consumes.
///
/// Implementations must be safe to call from behind the crypto context's
/// critical section; they hold no caller-visible mutable state.
pub trait CryptoEngine: Send + Sync {
    /// Generate the long-term identity keypair.
    fn generate_identity_key_pair(&self) -> Result<IdentityKeyPair, EngineError>;

    /// Generate a random registration id in the documented range.
    fn generate_registration_id(&self) -> Result<RegistrationId, EngineError>;

    /// Generate `count` one-time prekeys with sequential ids from `start_id`.
    fn generate_pre_keys(&self, start_id: u32, count: u32)
    -> Result<Vec<PreKeyRecord>, EngineError>;

    /// Generate one signed prekey, signed by the identity private key.
    fn generate_signed_pre_key(
        &self,
        identity: &IdentityKeyPair,
        id: u32,
        timestamp: u64,
    ) -> Result<SignedPreKeyRecord, EngineError>;

    /// Rehydrate an identity keypair from a persisted 32-byte seed.
    fn identity_key_pair_from_seed(&self, seed: &[u8; 32])
    -> Result<IdentityKeyPair, EngineError>;
}

fn identity_from_signing_key(signing_key: &SigningKey) -> IdentityKeyPair {
    let public = serialize_public_key(&signing_key.verifying_key().to_montgomery().to_bytes());
    IdentityKeyPair::from_parts(public, signing_key.to_bytes())
}

fn generate_identity<R: RngCore + CryptoRng>(rng: &mut R) -> IdentityKeyPair {
    let signing_key = SigningKey::generate(rng);
    identity_from_signing_key(&signing_key)
}

fn generate_pre_key<R: RngCore + CryptoRng>(rng: &mut R, id: u32) -> PreKeyRecord {
    let secret = StaticSecret::random_from_rng(&mut *rng);
    let public = serialize_public_key(PublicKey::from(&secret).as_bytes());
    let mut secret_bytes = secret.to_bytes();
    let record = PreKeyRecord::from_parts(id, public, secret_bytes);
    secret_bytes.zeroize();
    record
}

fn generate_pre_key_batch<R: RngCore + CryptoRng>(
    rng: &mut R,
    start_id: u32,
    count: u32,
) -> Result<Vec<PreKeyRecord>, EngineError> {
    let mut records = Vec::new();
    records
        .try_reserve_exact(count as usize)
        .map_err(|e| EngineError::Allocation(e.to_string()))?;
    for id in start_id..start_id.saturating_add(count) {
        records.push(generate_pre_key(rng, id));
    }
    Ok(records)
}

fn generate_signed_pre_key_with<R: RngCore + CryptoRng>(
    rng: &mut R,
    identity: &IdentityKeyPair,
    id: u32,
    timestamp: u64,
) -> Result<SignedPreKeyRecord, EngineError> {
    let secret = StaticSecret::random_from_rng(&mut *rng);
    let public = serialize_public_key(PublicKey::from(&secret).as_bytes());

    let signing_key = SigningKey::from_bytes(identity.secret_bytes());
    let signature = signing_key.sign(&public);

    let mut secret_bytes = secret.to_bytes();
    let record =
        SignedPreKeyRecord::from_parts(id, public, secret_bytes, signature.to_bytes(), timestamp);
    secret_bytes.zeroize();
    Ok(record)
}

/// Production engine over the dalek crates, sourcing randomness from the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct DalekEngine;

impl DalekEngine {
    pub const fn new() -> Self {
        Self
    }
}

impl CryptoEngine for DalekEngine {
    fn generate_identity_key_pair(&self) -> Result<IdentityKeyPair, EngineError> {
        Ok(generate_identity(&mut OsRng))
    }

    fn generate_registration_id(&self) -> Result<RegistrationId, EngineError> {
        RegistrationId::new(OsRng.gen_range(1..=MAX_REGISTRATION_ID))
    }

    fn generate_pre_keys(
        &self,
        start_id: u32,
        count: u32,
    ) -> Result<Vec<PreKeyRecord>, EngineError> {
        generate_pre_key_batch(&mut OsRng, start_id, count)
    }

    fn generate_signed_pre_key(
        &self,
        identity: &IdentityKeyPair,
        id: u32,
        timestamp: u64,
    ) -> Result<SignedPreKeyRecord, EngineError> {
        generate_signed_pre_key_with(&mut OsRng, identity, id, timestamp)
    }

    fn identity_key_pair_from_seed(
        &self,
        seed: &[u8; 32],
    ) -> Result<IdentityKeyPair, EngineError> {
        let signing_key = SigningKey::from_bytes(seed);
        Ok(identity_from_signing_key(&signing_key))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use seeded::SeededEngine;

#[cfg(any(test, feature = "test-utils"))]
mod seeded {
    use parking_lot::Mutex;
    use rand::{CryptoRng, Error, Rng, RngCore};
    use sha2::{Digest, Sha256};

    use super::{
        CryptoEngine, DalekEngine, EngineError, IdentityKeyPair, MAX_REGISTRATION_ID,
        PreKeyRecord, RegistrationId, SignedPreKeyRecord,
    };

    /// Deterministic counter-mode RNG over SHA-256, for reproducible tests.
    struct SeededRng {
        seed: [u8; 32],
        counter: u64,
        block: [u8; 32],
        used: usize,
    }

    impl SeededRng {
        fn new(seed: [u8; 32]) -> Self {
            Self {
                seed,
                counter: 0,
                block: [0u8; 32],
                used: 32,
            }
        }

        fn refill(&mut self) {
            let mut hasher = Sha256::new();
            hasher.update(self.seed);
            hasher.update(self.counter.to_le_bytes());
            self.block = hasher.finalize().into();
            self.counter += 1;
            self.used = 0;
        }
    }

    impl RngCore for SeededRng {
        fn next_u32(&mut self) -> u32 {
            let mut buf = [0u8; 4];
            self.fill_bytes(&mut buf);
            u32::from_le_bytes(buf)
        }

        fn next_u64(&mut self) -> u64 {
            let mut buf = [0u8; 8];
            self.fill_bytes(&mut buf);
            u64::from_le_bytes(buf)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for byte in dest {
                if self.used == 32 {
                    self.refill();
                }
                *byte = self.block[self.used];
                self.used += 1;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for SeededRng {}

    /// Engine driven by a fixed seed: same seed, same keys, every run.
    ///
    /// Test-only. Never wire this into a production context.
    pub struct SeededEngine {
        rng: Mutex<SeededRng>,
    }

    impl SeededEngine {
        pub fn new(seed: [u8; 32]) -> Self {
            Self {
                rng: Mutex::new(SeededRng::new(seed)),
            }
        }
    }

    impl CryptoEngine for SeededEngine {
        fn generate_identity_key_pair(&self) -> Result<IdentityKeyPair, EngineError> {
            Ok(super::generate_identity(&mut *self.rng.lock()))
        }

        fn generate_registration_id(&self) -> Result<RegistrationId, EngineError> {
            RegistrationId::new(self.rng.lock().gen_range(1..=MAX_REGISTRATION_ID))
        }

        fn generate_pre_keys(
            &self,
            start_id: u32,
            count: u32,
        ) -> Result<Vec<PreKeyRecord>, EngineError> {
            super::generate_pre_key_batch(&mut *self.rng.lock(), start_id, count)
        }

        fn generate_signed_pre_key(
            &self,
            identity: &IdentityKeyPair,
            id: u32,
            timestamp: u64,
        ) -> Result<SignedPreKeyRecord, EngineError> {
            super::generate_signed_pre_key_with(&mut *self.rng.lock(), identity, id, timestamp)
        }

        fn identity_key_pair_from_seed(
            &self,
            seed: &[u8; 32],
        ) -> Result<IdentityKeyPair, EngineError> {
            DalekEngine::new().identity_key_pair_from_seed(seed)
        }
    }
}
