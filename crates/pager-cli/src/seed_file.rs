//! File-backed seed store.
//!
//! Persists nothing itself; it reports whether a seed file exists and
//! rehydrates the identity from it. On Unix the file must be owner-only
//! (0600) before it is read, and the seed is read into a fixed-size
//! buffer that is zeroized as soon as the aggregate is built.

use std::path::PathBuf;

use zeroize::Zeroize;

use pager_crypto::{BootstrapParams, CryptoContext, LifecycleError, SeedStore, UserContext};

/// Seed store over a single seed file on disk.
pub struct FileSeedStore {
    path: PathBuf,
    params: BootstrapParams,
}

impl FileSeedStore {
    pub const fn new(path: PathBuf, params: BootstrapParams) -> Self {
        Self { path, params }
    }
}

impl SeedStore for FileSeedStore {
    fn has_existing_seed(&self) -> Result<bool, LifecycleError> {
        Ok(self.path.exists())
    }

    fn restore(&self, ctx: &CryptoContext) -> Result<UserContext, LifecycleError> {
        use std::io::Read;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(&self.path)
                .map_err(|e| LifecycleError::Store(e.to_string()))?;
            let mode = metadata.permissions().mode() & 0o777;
            if mode != 0o600 {
                return Err(LifecycleError::Store(format!(
                    "seed file has insecure permissions: {mode:o} (expected 600)"
                )));
            }
        }

        let mut file =
            std::fs::File::open(&self.path).map_err(|e| LifecycleError::Store(e.to_string()))?;
        let mut seed = [0u8; 32];
        if let Err(e) = file.read_exact(&mut seed) {
            seed.zeroize();
            return Err(LifecycleError::Store(format!(
                "seed file is truncated or unreadable: {e}"
            )));
        }

        let result = pager_crypto::rehydrate(ctx, &seed, &self.params)
            .map_err(|e| LifecycleError::Restore(e.to_string()));
        seed.zeroize();
        result
    }
}
