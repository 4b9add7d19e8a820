//! Interactive prompts for the seed lifecycle.

use anyhow::Result;
use dialoguer::{Confirm, Select};

use pager_crypto::{DisplayStrings, UserChoice, verify_fingerprint};

/// Resolve the lifecycle choice from the command line flags, falling back
/// to the interactive prompt when neither flag was given.
///
/// An explicit `--restore` with no saved seed is an error, not a silent
/// cancellation; the user asked for something that cannot happen.
pub fn resolve_choice(
    create: bool,
    restore: bool,
    non_interactive: bool,
    has_existing_seed: bool,
) -> Result<UserChoice> {
    if create {
        return Ok(UserChoice::CreateNewSeed);
    }
    if restore {
        anyhow::ensure!(
            has_existing_seed,
            "--restore was given but no saved seed exists"
        );
        return Ok(UserChoice::UseExistingSeed);
    }
    prompt_seed_choice(non_interactive, has_existing_seed)
}

/// Ask whether to restore the existing seed, create a new identity, or quit.
pub fn prompt_seed_choice(non_interactive: bool, has_existing_seed: bool) -> Result<UserChoice> {
    if non_interactive {
        anyhow::bail!("--create or --restore is required in non-interactive mode");
    }

    if has_existing_seed {
        let items = &[
            "Restore the existing seed",
            "Create a new identity",
            "Quit",
        ];
        let selection = Select::new()
            .with_prompt("A saved seed was found. What would you like to do?")
            .items(items)
            .default(0)
            .interact()?;
        Ok(match selection {
            0 => UserChoice::UseExistingSeed,
            1 => UserChoice::CreateNewSeed,
            _ => UserChoice::Cancel,
        })
    } else {
        let items = &["Create a new identity", "Quit"];
        let selection = Select::new()
            .with_prompt("No saved seed was found. What would you like to do?")
            .items(items)
            .default(0)
            .interact()?;
        Ok(match selection {
            0 => UserChoice::CreateNewSeed,
            _ => UserChoice::Cancel,
        })
    }
}

/// Show the freshly generated keys and wait for the user to confirm they
/// recorded them. Refusing (or EOF) is an error, which the lifecycle
/// treats as an aborted confirmation; the keys are scrubbed either way.
#[allow(clippy::print_stdout)]
pub fn confirm_new_seed(non_interactive: bool, display: &DisplayStrings) -> Result<()> {
    println!();
    println!("This build may be subject to export regulations on cryptography.");
    println!("Your new identity keys are shown ONCE and then erased from memory.");
    println!();
    println!("  fingerprint:     {}", display.fingerprint());
    println!("  public (hex):    {}", display.public_hex());
    println!("  public (base64): {}", display.public_base64());
    println!("  secret (hex):    {}", display.secret_hex());
    println!("  secret (base64): {}", display.secret_base64());
    println!();

    if non_interactive {
        return Ok(());
    }

    let recorded = Confirm::new()
        .with_prompt("Have you recorded your identity keys somewhere safe?")
        .default(false)
        .interact()?;
    if !recorded {
        anyhow::bail!("identity keys were not confirmed as recorded");
    }
    Ok(())
}

/// Check a restored identity against an expected fingerprint, when the
/// user supplied one on the command line. The comparison is constant-time.
pub fn check_restored_fingerprint(expected: Option<&str>, public_key: &[u8]) -> Result<()> {
    if let Some(expected) = expected {
        anyhow::ensure!(
            verify_fingerprint(public_key, expected),
            "restored identity fingerprint does not match the expected value"
        );
    }
    Ok(())
}
