//! The bootstrapped user aggregate and its scrubbing.
//!
//! A [`UserContext`] exclusively owns every piece of key material one
//! bootstrap produced. It is only ever observable fully populated: the
//! bootstrapper returns it complete or not at all. [`UserContext::scrub`]
//! consumes the aggregate, so a scrubbed handle cannot be reused and a
//! second scrub does not compile; dropping an unscrubbed aggregate wipes
//! it as a backstop, so every exit path erases the material.

use zeroize::Zeroize;

use crate::encode::DisplayStrings;
use crate::keys::{IdentityKeyPair, PreKeyRecord, RegistrationId, SignedPreKeyRecord};

/// Aggregate owning one identity's freshly generated key material.
pub struct UserContext {
    identity: IdentityKeyPair,
    registration_id: RegistrationId,
    pre_keys: Vec<PreKeyRecord>,
    signed_pre_key: SignedPreKeyRecord,
    display: Option<DisplayStrings>,
}

impl UserContext {
    pub(crate) fn new(
        identity: IdentityKeyPair,
        registration_id: RegistrationId,
        pre_keys: Vec<PreKeyRecord>,
        signed_pre_key: SignedPreKeyRecord,
    ) -> Self {
        Self {
            identity,
            registration_id,
            pre_keys,
            signed_pre_key,
            display: None,
        }
    }

    pub fn identity(&self) -> &IdentityKeyPair {
        &self.identity
    }

    pub const fn registration_id(&self) -> RegistrationId {
        self.registration_id
    }

    pub fn pre_keys(&self) -> &[PreKeyRecord] {
        &self.pre_keys
    }

    pub fn signed_pre_key(&self) -> &SignedPreKeyRecord {
        &self.signed_pre_key
    }

    /// Display strings, present once the encoder has run.
    pub fn display(&self) -> Option<&DisplayStrings> {
        self.display.as_ref()
    }

    /// Attach the encoder's output; the aggregate owns it from here on
    /// and scrubs it together with the raw key bytes.
    pub fn attach_display(&mut self, display: DisplayStrings) -> &DisplayStrings {
        &*self.display.insert(display)
    }

    /// Zero every sensitive buffer and release the aggregate.
    ///
    /// Consuming `self` makes reuse and double-scrubbing unrepresentable.
    pub fn scrub(mut self) {
        self.wipe();
    }

    pub(crate) fn wipe(&mut self) {
        self.identity.wipe();
        for pre_key in &mut self.pre_keys {
            pre_key.wipe();
        }
        self.signed_pre_key.wipe();
        if let Some(display) = &mut self.display {
            display.zeroize();
        }
        self.display = None;
    }
}

impl Drop for UserContext {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl std::fmt::Debug for UserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserContext")
            .field("registration_id", &self.registration_id.get())
            .field("pre_keys", &self.pre_keys.len())
            .field("signed_pre_key_id", &self.signed_pre_key.id())
            .field("display", &self.display.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encode;
    use crate::engine::{CryptoEngine, SeededEngine};

    fn seeded_user() -> UserContext {
        let engine = SeededEngine::new([9u8; 32]);
        let identity = engine.generate_identity_key_pair().unwrap();
        let registration_id = engine.generate_registration_id().unwrap();
        let pre_keys = engine.generate_pre_keys(1, 3).unwrap();
        let signed = engine
            .generate_signed_pre_key(&identity, 5, 1_700_000_000)
            .unwrap();
        UserContext::new(identity, registration_id, pre_keys, signed)
    }

    #[test]
    fn wipe_zeroes_all_key_buffers() {
        let mut user = seeded_user();
        let display = encode::encode(&user);
        user.attach_display(display);

        user.wipe();

        assert!(user.identity().public_bytes().iter().all(|&b| b == 0));
        assert!(user.identity().secret_bytes().iter().all(|&b| b == 0));
        for pre_key in user.pre_keys() {
            assert!(pre_key.public_bytes().iter().all(|&b| b == 0));
        }
        assert!(user.signed_pre_key().public_bytes().iter().all(|&b| b == 0));
        assert!(user.signed_pre_key().signature().iter().all(|&b| b == 0));
        assert_eq!(user.signed_pre_key().timestamp(), 0);
        assert!(user.display().is_none());
    }

    #[test]
    fn display_is_absent_until_attached() {
        let mut user = seeded_user();
        assert!(user.display().is_none());

        let display = encode::encode(&user);
        let attached = user.attach_display(display);
        assert_eq!(attached.public_hex().len(), 66);
        assert!(user.display().is_some());
    }

    #[test]
    fn debug_shows_no_key_material() {
        let user = seeded_user();
        let output = format!("{user:?}");
        assert!(!output.contains(&hex::encode(user.identity().secret_bytes())));
        user.scrub();
    }
}
