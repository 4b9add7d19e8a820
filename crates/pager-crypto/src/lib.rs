//! Pager identity bootstrap core.
//!
//! Secure lifecycle of a client's long-term cryptographic identity:
//! generate it through the engine capability interface, derive the
//! display encodings, and guarantee every sensitive buffer is erased
//! before the process exits.
//!
//! ## Components
//!
//! - **Provider binding** ([`provider`]): wires an engine, a lock
//!   abstraction, and a log hook into the single process-wide
//!   [`CryptoContext`].
//! - **Bootstrap** ([`bootstrap`]): identity keypair, registration id,
//!   100 one-time prekeys, one signed prekey — all or nothing.
//! - **Encoder** ([`encode`]): hex and Base64 display strings, pure
//!   functions of the serialized key bytes.
//! - **Scrubbing** ([`user`]): the aggregate zeroizes every buffer on
//!   every exit path; `scrub` consumes the handle so it cannot be reused.
//! - **Lifecycle** ([`lifecycle`]): restore-or-create state machine over
//!   the persistence signal and the user's choice.

pub mod bootstrap;
pub mod encode;
pub mod engine;
pub mod error;
pub mod keys;
pub mod lifecycle;
pub mod provider;
pub mod user;

pub use bootstrap::{BootstrapParams, boot, boot_with_params, rehydrate};
pub use encode::{DisplayStrings, encode, encode_base64, encode_hex};
#[cfg(any(test, feature = "test-utils"))]
pub use engine::SeededEngine;
pub use engine::{CryptoEngine, DalekEngine};
pub use error::{BootstrapError, EngineError, InitError, LifecycleError};
pub use keys::{
    IdentityKeyPair, PreKeyRecord, RegistrationId, SignedPreKeyRecord, fingerprint_of,
    verify_fingerprint,
};
pub use lifecycle::{Outcome, SeedStore, UserChoice, decide, run};
pub use provider::{
    CryptoContext, LockHooks, LogHook, LogLevel, ProviderCapabilities, tracing_log_hook,
};
pub use user::UserContext;
