//! Provider wiring for the crypto engine.
//!
//! [`CryptoContext`] binds an engine implementation, a lock abstraction,
//! and a log hook into one process-wide handle. There is at most one live
//! context per process; `init` fails if one already exists, and teardown
//! happens exactly once, either through [`CryptoContext::shutdown`] or as
//! a drop backstop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::engine::CryptoEngine;
use crate::error::InitError;

/// One live context per process.
static CONTEXT_LIVE: AtomicBool = AtomicBool::new(false);

/// Severity levels the engine log hook distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// Callback receiving engine-internal log lines.
pub type LogHook = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

/// A log hook that forwards engine log lines onto `tracing`.
pub fn tracing_log_hook() -> LogHook {
    Arc::new(|level, message| match level {
        LogLevel::Error => tracing::error!(target: "pager_engine", "{message}"),
        LogLevel::Warn => tracing::warn!(target: "pager_engine", "{message}"),
        LogLevel::Info => tracing::info!(target: "pager_engine", "{message}"),
        LogLevel::Debug => tracing::debug!(target: "pager_engine", "{message}"),
    })
}

/// Cross-platform critical-section abstraction for engine-internal state.
///
/// Reentrant, so nested `enter` calls from the same thread are safe; the
/// same init/teardown semantics apply on every platform.
#[derive(Clone, Default)]
pub struct LockHooks {
    inner: Arc<ReentrantMutex<()>>,
}

impl LockHooks {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&self) -> ReentrantMutexGuard<'_, ()> {
        self.inner.lock()
    }
}

/// Guard holding the engine critical section until dropped.
pub struct CriticalSection<'a> {
    _guard: ReentrantMutexGuard<'a, ()>,
}

/// The capabilities a caller supplies when wiring up the engine.
///
/// Every capability is required; `CryptoContext::init` rejects a partial
/// set rather than running with a missing primitive.
#[derive(Default)]
pub struct ProviderCapabilities {
    engine: Option<Arc<dyn CryptoEngine>>,
    locking: Option<LockHooks>,
    logging: Option<LogHook>,
}

impl ProviderCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(mut self, engine: Arc<dyn CryptoEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn locking(mut self, hooks: LockHooks) -> Self {
        self.locking = Some(hooks);
        self
    }

    pub fn logging(mut self, hook: LogHook) -> Self {
        self.logging = Some(hook);
        self
    }
}

/// Process-wide handle binding engine, locking, and logging together.
///
/// Deliberately not `Clone`: components borrow it for the duration of an
/// operation instead of sharing ownership.
pub struct CryptoContext {
    engine: Arc<dyn CryptoEngine>,
    locks: LockHooks,
    log: LogHook,
    released: bool,
}

impl CryptoContext {
    /// Wire the supplied capabilities into a live context.
    ///
    /// Fails with [`InitError::MissingCapability`] when any primitive is
    /// absent and [`InitError::AlreadyInitialized`] when a context is
    /// already live in this process.
    pub fn init(capabilities: ProviderCapabilities) -> Result<Self, InitError> {
        let engine = capabilities
            .engine
            .ok_or(InitError::MissingCapability("crypto engine"))?;
        let locks = capabilities
            .locking
            .ok_or(InitError::MissingCapability("locking hooks"))?;
        let log = capabilities
            .logging
            .ok_or(InitError::MissingCapability("log hook"))?;

        if CONTEXT_LIVE.swap(true, Ordering::SeqCst) {
            return Err(InitError::AlreadyInitialized);
        }

        (*log)(LogLevel::Debug, "crypto context initialized");
        Ok(Self {
            engine,
            locks,
            log,
            released: false,
        })
    }

    /// The bound engine.
    pub fn engine(&self) -> &dyn CryptoEngine {
        self.engine.as_ref()
    }

    /// Enter the engine critical section for the returned guard's lifetime.
    ///
    /// Safe to call repeatedly, including nested on the same thread.
    pub fn lock(&self) -> CriticalSection<'_> {
        CriticalSection {
            _guard: self.locks.enter(),
        }
    }

    /// Emit a line through the engine log hook.
    pub fn log(&self, level: LogLevel, message: &str) {
        (*self.log)(level, message);
    }

    /// Tear the context down. Idempotence is by construction: the context
    /// is consumed, and the drop backstop skips an already-released one.
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            (*self.log)(LogLevel::Debug, "crypto context torn down");
            CONTEXT_LIVE.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for CryptoContext {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::DalekEngine;
    use crate::test_support;

    fn full_capabilities() -> ProviderCapabilities {
        ProviderCapabilities::new()
            .engine(Arc::new(DalekEngine::new()))
            .locking(LockHooks::new())
            .logging(tracing_log_hook())
    }

    #[test]
    fn init_requires_every_capability() {
        let _serial = test_support::serialize_context_tests();

        let missing_engine = ProviderCapabilities::new()
            .locking(LockHooks::new())
            .logging(tracing_log_hook());
        assert!(matches!(
            CryptoContext::init(missing_engine),
            Err(InitError::MissingCapability("crypto engine"))
        ));

        let missing_locks = ProviderCapabilities::new()
            .engine(Arc::new(DalekEngine::new()))
            .logging(tracing_log_hook());
        assert!(matches!(
            CryptoContext::init(missing_locks),
            Err(InitError::MissingCapability("locking hooks"))
        ));

        let missing_log = ProviderCapabilities::new()
            .engine(Arc::new(DalekEngine::new()))
            .locking(LockHooks::new());
        assert!(matches!(
            CryptoContext::init(missing_log),
            Err(InitError::MissingCapability("log hook"))
        ));
    }

    #[test]
    fn second_live_context_is_rejected() {
        let _serial = test_support::serialize_context_tests();

        let first = CryptoContext::init(full_capabilities()).unwrap();
        assert!(matches!(
            CryptoContext::init(full_capabilities()),
            Err(InitError::AlreadyInitialized)
        ));
        first.shutdown();

        // Teardown frees the slot for a new context.
        let second = CryptoContext::init(full_capabilities()).unwrap();
        second.shutdown();
    }

    #[test]
    fn drop_releases_the_context_slot() {
        let _serial = test_support::serialize_context_tests();

        {
            let _ctx = CryptoContext::init(full_capabilities()).unwrap();
        }
        let ctx = CryptoContext::init(full_capabilities()).unwrap();
        ctx.shutdown();
    }

    #[test]
    fn critical_section_is_reentrant() {
        let _serial = test_support::serialize_context_tests();

        let ctx = CryptoContext::init(full_capabilities()).unwrap();
        let outer = ctx.lock();
        let inner = ctx.lock();
        drop(inner);
        drop(outer);
        ctx.shutdown();
    }
}
