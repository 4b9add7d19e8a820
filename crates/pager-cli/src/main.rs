//! Pager text-mode client entry point.
//!
//! Startup order mirrors the client's boot sequence: logging first, then
//! configuration, then the crypto context, then the seed lifecycle. The
//! context is torn down exactly once on the way out, whatever the
//! lifecycle decided.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pager_cli::FileSeedStore;
use pager_cli::config;
use pager_cli::prompt;
use pager_crypto::{
    CryptoContext, DalekEngine, LifecycleError, LockHooks, Outcome, ProviderCapabilities,
    SeedStore as _, lifecycle, tracing_log_hook,
};

/// Pager text-mode client.
#[derive(Debug, Parser)]
#[command(name = "pager", version, about)]
struct Cli {
    /// Run without interactive prompts (requires --create or --restore)
    #[arg(long)]
    non_interactive: bool,

    /// Create a new identity without asking
    #[arg(long, conflicts_with = "restore")]
    create: bool,

    /// Restore the existing seed without asking
    #[arg(long)]
    restore: bool,

    /// Expected identity fingerprint; a restored identity must match it
    #[arg(long)]
    fingerprint: Option<String>,

    /// Path to the settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the identity seed file (overrides the settings file)
    #[arg(long)]
    seed_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(seed_file) = cli.seed_file.clone() {
        config.seed_file = Some(seed_file);
    }
    let params = config.bootstrap_params();

    let ctx = CryptoContext::init(
        ProviderCapabilities::new()
            .engine(Arc::new(DalekEngine::new()))
            .locking(LockHooks::new())
            .logging(tracing_log_hook()),
    )?;

    let store = FileSeedStore::new(config.seed_path()?, params);

    let choice = prompt::resolve_choice(
        cli.create,
        cli.restore,
        cli.non_interactive,
        store.has_existing_seed()?,
    )?;

    let outcome = lifecycle::run(
        &ctx,
        &store,
        choice,
        &params,
        |display| {
            prompt::confirm_new_seed(cli.non_interactive, display)
                .map_err(|e| LifecycleError::Confirmation(e.to_string()))
        },
        |user| {
            prompt::check_restored_fingerprint(
                cli.fingerprint.as_deref(),
                user.identity().public_bytes(),
            )
            .map_err(|e| LifecycleError::Restore(e.to_string()))?;
            info!(
                registration_id = user.registration_id().get(),
                fingerprint = %user.identity().fingerprint(),
                "identity restored from seed"
            );
            Ok(())
        },
    )?;

    match outcome {
        Outcome::RestoreExisting => info!("seed lifecycle finished: restored existing identity"),
        Outcome::CreateNew => info!("seed lifecycle finished: new identity created"),
        Outcome::Cancelled => info!("seed lifecycle cancelled"),
    }

    ctx.shutdown();
    Ok(())
}
