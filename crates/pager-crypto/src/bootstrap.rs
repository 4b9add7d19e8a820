//! The identity bootstrap sequence.
//!
//! Drives the engine through the ordered generation steps and assembles
//! the results into one [`UserContext`]. The first failing step aborts
//! the whole sequence; partially built key material is wiped by its drop
//! before the error propagates, so callers never observe a partial
//! aggregate. There are no retries: a failed generation step may mean a
//! degraded random source, and the right response is a process restart.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{BootstrapError, EngineError};
use crate::provider::{CryptoContext, LogLevel};
use crate::user::UserContext;

/// Number of one-time prekeys generated per bootstrap.
pub const PRE_KEY_COUNT: u32 = 100;

/// First one-time prekey id.
pub const PRE_KEY_START_ID: u32 = 1;

/// Fixed id of the signed prekey.
pub const SIGNED_PRE_KEY_ID: u32 = 5;

/// Largest prekey batch a single bootstrap will request.
pub const MAX_PRE_KEY_COUNT: u32 = 10_000;

/// Tunable parameters for one bootstrap run.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapParams {
    pub pre_key_count: u32,
    pub pre_key_start_id: u32,
    pub signed_pre_key_id: u32,
}

impl Default for BootstrapParams {
    fn default() -> Self {
        Self {
            pre_key_count: PRE_KEY_COUNT,
            pre_key_start_id: PRE_KEY_START_ID,
            signed_pre_key_id: SIGNED_PRE_KEY_ID,
        }
    }
}

/// Validate ranges up front instead of forwarding bad ids to the engine.
fn validate(params: &BootstrapParams) -> Result<(), BootstrapError> {
    if params.pre_key_count == 0 || params.pre_key_count > MAX_PRE_KEY_COUNT {
        return Err(BootstrapError::InvalidParameter(format!(
            "pre-key count {} outside 1..={MAX_PRE_KEY_COUNT}",
            params.pre_key_count
        )));
    }
    if params.pre_key_start_id == 0 {
        return Err(BootstrapError::InvalidParameter(
            "pre-key start id must be positive".into(),
        ));
    }
    if params
        .pre_key_start_id
        .checked_add(params.pre_key_count - 1)
        .is_none()
    {
        return Err(BootstrapError::InvalidParameter(format!(
            "pre-key ids overflow from start {} with count {}",
            params.pre_key_start_id, params.pre_key_count
        )));
    }
    if params.signed_pre_key_id == 0 {
        return Err(BootstrapError::InvalidParameter(
            "signed pre-key id must be positive".into(),
        ));
    }
    Ok(())
}

fn step_error(step: &'static str, err: EngineError) -> BootstrapError {
    match err {
        EngineError::Allocation(reason) => BootstrapError::AllocationFailed(reason),
        other => BootstrapError::KeyGenFailed {
            step,
            reason: other.to_string(),
        },
    }
}

fn unix_timestamp() -> Result<u64, BootstrapError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| BootstrapError::KeyGenFailed {
            step: "timestamp",
            reason: "system clock is before the unix epoch".into(),
        })
}

/// Run the full bootstrap with default parameters.
pub fn boot(ctx: &CryptoContext) -> Result<UserContext, BootstrapError> {
    boot_with_params(ctx, &BootstrapParams::default())
}

/// Run the full bootstrap: identity keypair, registration id, one-time
/// prekeys, signed prekey.
///
/// Synchronous and non-interruptible: there is no cancellation point
/// between the first and last generation step.
pub fn boot_with_params(
    ctx: &CryptoContext,
    params: &BootstrapParams,
) -> Result<UserContext, BootstrapError> {
    validate(params)?;
    let _cs = ctx.lock();

    ctx.log(LogLevel::Debug, "generating identity key pair");
    let identity = ctx
        .engine()
        .generate_identity_key_pair()
        .map_err(|e| step_error("identity key pair", e))?;

    finish_bootstrap(ctx, identity, params)
}

/// Rebuild an aggregate from a persisted 32-byte identity seed.
///
/// The identity keypair is rehydrated; registration id, one-time prekeys
/// and signed prekey are generated fresh, since one-time prekeys are not
/// persisted and must be republished after a restore.
pub fn rehydrate(
    ctx: &CryptoContext,
    seed: &[u8; 32],
    params: &BootstrapParams,
) -> Result<UserContext, BootstrapError> {
    validate(params)?;
    let _cs = ctx.lock();

    ctx.log(LogLevel::Debug, "rehydrating identity key pair from seed");
    let identity = ctx
        .engine()
        .identity_key_pair_from_seed(seed)
        .map_err(|e| step_error("identity rehydration", e))?;

    finish_bootstrap(ctx, identity, params)
}

fn finish_bootstrap(
    ctx: &CryptoContext,
    identity: crate::keys::IdentityKeyPair,
    params: &BootstrapParams,
) -> Result<UserContext, BootstrapError> {
    let engine = ctx.engine();

    let registration_id = engine
        .generate_registration_id()
        .map_err(|e| step_error("registration id", e))?;

    ctx.log(LogLevel::Debug, "generating one-time pre-keys");
    let pre_keys = engine
        .generate_pre_keys(params.pre_key_start_id, params.pre_key_count)
        .map_err(|e| step_error("one-time pre-keys", e))?;

    // The engine's return code is not trusted blindly: the batch must be
    // exactly the requested sequential ids.
    let expected_ids = (params.pre_key_start_id..).take(params.pre_key_count as usize);
    if pre_keys.len() != params.pre_key_count as usize
        || !pre_keys
            .iter()
            .map(crate::keys::PreKeyRecord::id)
            .eq(expected_ids)
    {
        return Err(BootstrapError::KeyGenFailed {
            step: "one-time pre-keys",
            reason: "engine returned a batch with wrong length or ids".into(),
        });
    }

    let timestamp = unix_timestamp()?;
    ctx.log(LogLevel::Debug, "generating signed pre-key");
    let signed_pre_key = engine
        .generate_signed_pre_key(&identity, params.signed_pre_key_id, timestamp)
        .map_err(|e| step_error("signed pre-key", e))?;

    ctx.log(LogLevel::Info, "identity bootstrap complete");
    Ok(UserContext::new(
        identity,
        registration_id,
        pre_keys,
        signed_pre_key,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::{CryptoEngine, SeededEngine};
    use crate::error::EngineError;
    use crate::keys::{IdentityKeyPair, PreKeyRecord, RegistrationId, SignedPreKeyRecord};
    use crate::test_support;
    use std::sync::Arc;

    /// Engine double that fails at one numbered generation step.
    struct FailingEngine {
        inner: SeededEngine,
        fail_at: u32,
    }

    impl FailingEngine {
        fn new(fail_at: u32) -> Self {
            Self {
                inner: SeededEngine::new([3u8; 32]),
                fail_at,
            }
        }

        fn trip(&self, step: u32) -> Result<(), EngineError> {
            if self.fail_at == step {
                return Err(EngineError::KeyGeneration(format!(
                    "injected failure at step {step}"
                )));
            }
            Ok(())
        }
    }

    impl CryptoEngine for FailingEngine {
        fn generate_identity_key_pair(&self) -> Result<IdentityKeyPair, EngineError> {
            self.trip(2)?;
            self.inner.generate_identity_key_pair()
        }

        fn generate_registration_id(&self) -> Result<RegistrationId, EngineError> {
            self.trip(3)?;
            self.inner.generate_registration_id()
        }

        fn generate_pre_keys(
            &self,
            start_id: u32,
            count: u32,
        ) -> Result<Vec<PreKeyRecord>, EngineError> {
            if self.fail_at == 1 {
                return Err(EngineError::Allocation("injected allocation failure".into()));
            }
            self.trip(4)?;
            self.inner.generate_pre_keys(start_id, count)
        }

        fn generate_signed_pre_key(
            &self,
            identity: &IdentityKeyPair,
            id: u32,
            timestamp: u64,
        ) -> Result<SignedPreKeyRecord, EngineError> {
            self.trip(5)?;
            self.inner.generate_signed_pre_key(identity, id, timestamp)
        }

        fn identity_key_pair_from_seed(
            &self,
            seed: &[u8; 32],
        ) -> Result<IdentityKeyPair, EngineError> {
            self.inner.identity_key_pair_from_seed(seed)
        }
    }

    #[test]
    fn boot_produces_a_fully_populated_aggregate() {
        let _serial = test_support::serialize_context_tests();
        let ctx = test_support::context_with_engine(Arc::new(SeededEngine::new([1u8; 32])));

        let user = boot(&ctx).unwrap();
        assert_eq!(user.identity().public_bytes().len(), 33);
        assert_eq!(user.identity().secret_bytes().len(), 32);
        assert!(user.registration_id().get() >= 1);
        assert_eq!(user.pre_keys().len(), 100);
        assert_eq!(user.signed_pre_key().id(), SIGNED_PRE_KEY_ID);
        assert!(user.signed_pre_key().timestamp() > 0);
        assert!(user.display().is_none());

        user.scrub();
        ctx.shutdown();
    }

    #[test]
    fn pre_key_ids_are_strictly_increasing_with_no_gaps() {
        let _serial = test_support::serialize_context_tests();
        let ctx = test_support::context_with_engine(Arc::new(SeededEngine::new([2u8; 32])));

        let user = boot(&ctx).unwrap();
        let ids: Vec<u32> = user.pre_keys().iter().map(PreKeyRecord::id).collect();
        let expected: Vec<u32> = (1..=100).collect();
        assert_eq!(ids, expected);

        user.scrub();
        ctx.shutdown();
    }

    #[test]
    fn failure_at_each_step_yields_no_user_context() {
        let _serial = test_support::serialize_context_tests();

        for fail_at in 1..=5 {
            let ctx =
                test_support::context_with_engine(Arc::new(FailingEngine::new(fail_at)));
            let result = boot(&ctx);
            match fail_at {
                1 => assert!(matches!(result, Err(BootstrapError::AllocationFailed(_)))),
                _ => assert!(matches!(result, Err(BootstrapError::KeyGenFailed { .. }))),
            }
            ctx.shutdown();
        }
    }

    #[test]
    fn invalid_parameters_are_rejected_before_generation() {
        let _serial = test_support::serialize_context_tests();
        let ctx = test_support::context_with_engine(Arc::new(SeededEngine::new([4u8; 32])));

        let zero_count = BootstrapParams {
            pre_key_count: 0,
            ..BootstrapParams::default()
        };
        assert!(matches!(
            boot_with_params(&ctx, &zero_count),
            Err(BootstrapError::InvalidParameter(_))
        ));

        let oversized = BootstrapParams {
            pre_key_count: MAX_PRE_KEY_COUNT + 1,
            ..BootstrapParams::default()
        };
        assert!(matches!(
            boot_with_params(&ctx, &oversized),
            Err(BootstrapError::InvalidParameter(_))
        ));

        let zero_start = BootstrapParams {
            pre_key_start_id: 0,
            ..BootstrapParams::default()
        };
        assert!(matches!(
            boot_with_params(&ctx, &zero_start),
            Err(BootstrapError::InvalidParameter(_))
        ));

        let overflowing = BootstrapParams {
            pre_key_start_id: u32::MAX,
            pre_key_count: 2,
            ..BootstrapParams::default()
        };
        assert!(matches!(
            boot_with_params(&ctx, &overflowing),
            Err(BootstrapError::InvalidParameter(_))
        ));

        let zero_signed = BootstrapParams {
            signed_pre_key_id: 0,
            ..BootstrapParams::default()
        };
        assert!(matches!(
            boot_with_params(&ctx, &zero_signed),
            Err(BootstrapError::InvalidParameter(_))
        ));

        ctx.shutdown();
    }

    #[test]
    fn rehydrate_restores_the_same_identity_with_fresh_pre_keys() {
        let _serial = test_support::serialize_context_tests();
        let ctx = test_support::context_with_engine(Arc::new(SeededEngine::new([10u8; 32])));

        let original = boot(&ctx).unwrap();
        let seed = *original.identity().secret_bytes();
        let public = *original.identity().public_bytes();
        original.scrub();

        let restored = rehydrate(&ctx, &seed, &BootstrapParams::default()).unwrap();
        assert_eq!(*restored.identity().public_bytes(), public);
        assert_eq!(*restored.identity().secret_bytes(), seed);
        assert_eq!(restored.pre_keys().len(), 100);

        restored.scrub();
        ctx.shutdown();
    }

    #[test]
    fn seeded_boot_is_reproducible() {
        let _serial = test_support::serialize_context_tests();

        let ctx_a = test_support::context_with_engine(Arc::new(SeededEngine::new([7u8; 32])));
        let user_a = boot(&ctx_a).unwrap();
        let public_a = *user_a.identity().public_bytes();
        let secret_a = *user_a.identity().secret_bytes();
        user_a.scrub();
        ctx_a.shutdown();

        let ctx_b = test_support::context_with_engine(Arc::new(SeededEngine::new([7u8; 32])));
        let user_b = boot(&ctx_b).unwrap();
        assert_eq!(*user_b.identity().public_bytes(), public_a);
        assert_eq!(*user_b.identity().secret_bytes(), secret_a);
        user_b.scrub();
        ctx_b.shutdown();
    }
}
