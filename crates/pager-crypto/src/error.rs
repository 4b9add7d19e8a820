//! Crypto core error types.

/// Errors from wiring the crypto provider into the engine.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Required capability missing: {0}")]
    MissingCapability(&'static str),

    #[error("A crypto context is already live in this process")]
    AlreadyInitialized,
}

/// Errors from the engine capability layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Key serialization failed: {0}")]
    Serialization(String),

    #[error("Allocation failed: {0}")]
    Allocation(String),

    #[error("Invalid key material: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

/// Errors from the identity bootstrap sequence.
///
/// All variants are fatal: the bootstrap never retries, since a failed
/// generation step may indicate a degraded random source. Partial key
/// material is scrubbed before any of these propagate.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Key generation failed at {step}: {reason}")]
    KeyGenFailed { step: &'static str, reason: String },

    #[error("Allocation failed: {0}")]
    AllocationFailed(String),

    #[error("Invalid bootstrap parameter: {0}")]
    InvalidParameter(String),
}

impl From<EngineError> for BootstrapError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Allocation(reason) => Self::AllocationFailed(reason),
            other => Self::KeyGenFailed {
                step: "engine",
                reason: other.to_string(),
            },
        }
    }
}

/// Errors from the seed lifecycle controller.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error("Seed restore failed: {0}")]
    Restore(String),

    #[error("Seed confirmation failed: {0}")]
    Confirmation(String),

    #[error("Seed store unavailable: {0}")]
    Store(String),
}
