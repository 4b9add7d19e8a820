//! Seed lifecycle control: restore an existing identity or create a new one.
//!
//! [`decide`] is a pure function from the persistence signal and the
//! user's choice to a terminal outcome. [`run`] sequences the chosen
//! path and guarantees the scrub contract on every exit: a created or
//! restored aggregate never outlives the call, even when the
//! confirmation step fails or the user aborts mid-display. The only
//! cancellation point is before bootstrap begins; once `CreateNew`
//! starts generating there is no way to stop short of completion.

use crate::bootstrap::{self, BootstrapParams};
use crate::encode::{self, DisplayStrings};
use crate::error::LifecycleError;
use crate::provider::{CryptoContext, LogLevel};
use crate::user::UserContext;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChoice {
    UseExistingSeed,
    CreateNewSeed,
    Cancel,
}

/// Terminal outcome of the seed lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    RestoreExisting,
    CreateNew,
    Cancelled,
}

/// Reports whether a persisted seed exists and rehydrates from it.
///
/// The storage format and location are the implementor's concern; this
/// core only consumes the signal and the rehydrated aggregate.
pub trait SeedStore {
    fn has_existing_seed(&self) -> Result<bool, LifecycleError>;

    fn restore(&self, ctx: &CryptoContext) -> Result<UserContext, LifecycleError>;
}

/// Select the terminal outcome. Pure: identical inputs, identical outcome.
///
/// Restoring requires both an existing seed and the user asking for it;
/// creating requires an explicit request; everything else cancels.
pub const fn decide(has_existing_seed: bool, choice: UserChoice) -> Outcome {
    match choice {
        UserChoice::UseExistingSeed if has_existing_seed => Outcome::RestoreExisting,
        UserChoice::CreateNewSeed => Outcome::CreateNew,
        UserChoice::UseExistingSeed | UserChoice::Cancel => Outcome::Cancelled,
    }
}

/// Run the seed lifecycle to its terminal outcome.
///
/// * `CreateNew`: bootstrap, encode, hand the display strings to
///   `on_display` (the external confirmation step), then scrub —
///   unconditionally, whatever `on_display` returned.
/// * `RestoreExisting`: rehydrate through the store, hand the aggregate
///   to `on_restored`, then scrub.
/// * `Cancelled`: no key material is generated or touched.
pub fn run(
    ctx: &CryptoContext,
    store: &dyn SeedStore,
    choice: UserChoice,
    params: &BootstrapParams,
    on_display: impl FnOnce(&DisplayStrings) -> Result<(), LifecycleError>,
    on_restored: impl FnOnce(&UserContext) -> Result<(), LifecycleError>,
) -> Result<Outcome, LifecycleError> {
    let outcome = decide(store.has_existing_seed()?, choice);
    match outcome {
        Outcome::RestoreExisting => {
            ctx.log(LogLevel::Info, "restoring identity from existing seed");
            let user = store.restore(ctx)?;
            let result = on_restored(&user);
            user.scrub();
            result?;
        }
        Outcome::CreateNew => {
            ctx.log(LogLevel::Info, "creating a new identity");
            let mut user = bootstrap::boot_with_params(ctx, params)?;
            let display = user.attach_display(encode::encode(&user));
            let result = on_display(display);
            user.scrub();
            result?;
        }
        Outcome::Cancelled => {
            ctx.log(LogLevel::Info, "seed lifecycle cancelled, nothing generated");
        }
    }
    Ok(outcome)
}
