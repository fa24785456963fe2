use std::io::Write;

use color_eyre::{eyre::bail, Result};
use keystash_core::credentials::Credentials;

use crate::{
    bridge::KeychainBridge,
    cli::{Command, CredentialsCommand},
};

const PROBE_KEY: &str = "keystash.health/probe";
const PROBE_VALUE: &str = "ok";

/// Execute a store subcommand against `bridge`, writing user output to `out`.
pub async fn handle(cmd: Command, bridge: &dyn KeychainBridge, out: &mut impl Write) -> Result<()> {
    match cmd {
        Command::Put { key, value } => {
            bridge.protect(key.clone(), value).await?;
            writeln!(out, "Stored {key}")?;
        }
        Command::Get { key } => match bridge.unprotect(key.clone()).await? {
            Some(value) => writeln!(out, "{value}")?,
            None => bail!("no value stored for key {key:?}"),
        },
        Command::Remove { key } => {
            bridge.remove(key.clone()).await?;
            writeln!(out, "Removed {key}")?;
        }
        Command::Credentials(cmd) => handle_credentials(cmd, bridge, out).await?,
        Command::Health => {
            run_store_health(bridge).await?;
            writeln!(out, "Storage: ok")?;
        }
        Command::Version | Command::Config(_) => {
            bail!("command does not operate on the store")
        }
    }
    Ok(())
}

async fn handle_credentials(
    cmd: CredentialsCommand,
    bridge: &dyn KeychainBridge,
    out: &mut impl Write,
) -> Result<()> {
    match cmd {
        CredentialsCommand::Set {
            username,
            password,
            slot,
        } => {
            let slot = slot.slot();
            let key = slot.storage_key();
            bridge
                .save_credentials(slot, Credentials::new(username, password))
                .await?;
            writeln!(out, "Saved credentials in {key}")?;
        }
        CredentialsCommand::Get { slot } => {
            let slot = slot.slot();
            let Some(credentials) = bridge.load_credentials(slot.clone()).await? else {
                bail!("no credentials stored in {}", slot.storage_key());
            };
            writeln!(out, "username: {}", credentials.username)?;
            writeln!(out, "password: {}", credentials.password)?;
        }
        CredentialsCommand::Reset { slot } => {
            let slot = slot.slot();
            let key = slot.storage_key();
            bridge.reset_credentials(slot).await?;
            writeln!(out, "Reset {key}")?;
        }
    }
    Ok(())
}

/// Round-trips a probe entry through the store and removes it again.
/// Refuses to run if the probe key already holds a value.
pub async fn run_store_health(bridge: &dyn KeychainBridge) -> Result<()> {
    if bridge.unprotect(PROBE_KEY.to_string()).await?.is_some() {
        bail!("{PROBE_KEY} already holds a value; refusing to overwrite it");
    }
    bridge
        .protect(PROBE_KEY.to_string(), PROBE_VALUE.to_string())
        .await?;
    let round_trip = bridge.unprotect(PROBE_KEY.to_string()).await?;
    bridge.remove(PROBE_KEY.to_string()).await?;

    if round_trip.as_deref() != Some(PROBE_VALUE) {
        bail!("storage round-trip failed");
    }
    if bridge.unprotect(PROBE_KEY.to_string()).await?.is_some() {
        bail!("probe entry survived removal");
    }
    Ok(())
}
