//! Pager client front end.
//!
//! Thin orchestration over the `pager-crypto` bootstrap core: resolve
//! configuration, wire the crypto provider, ask the user whether to
//! restore or create an identity, and drive the seed lifecycle.

pub mod config;
pub mod prompt;
pub mod seed_file;

pub use config::Config;
pub use seed_file::FileSeedStore;
