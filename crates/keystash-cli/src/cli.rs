use clap::{Args, Parser, Subcommand};
use keystash_core::credentials::CredentialSlot;

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "keystash",
    about = "Namespaced secure key/value store",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a value under a key, replacing any previous value.
    Put { key: String, value: String },
    /// Print the value stored under a key.
    Get { key: String },
    /// Remove a key (succeeds if it is already absent).
    Remove { key: String },
    /// Manage stored usernames and passwords.
    #[command(subcommand)]
    Credentials(CredentialsCommand),
    /// Run a put/get/remove round trip against the configured backend.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsCommand {
    /// Save a username/password pair.
    Set {
        username: String,
        password: String,
        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Print the stored username/password pair.
    Get {
        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Delete the stored pair.
    Reset {
        #[command(flatten)]
        slot: SlotArgs,
    },
}

/// Selects generic (per service) or internet (per server) credentials.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotArgs {
    /// Service for a generic password; `default` when omitted.
    #[arg(long, conflicts_with = "server")]
    pub service: Option<String>,
    /// Server for internet credentials.
    #[arg(long)]
    pub server: Option<String>,
}

impl SlotArgs {
    pub fn slot(&self) -> CredentialSlot {
        match &self.server {
            Some(server) => CredentialSlot::internet(server.clone()),
            None => CredentialSlot::generic(self.service.clone()),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_put_subcommand() {
        let cli = Cli::try_parse_from(["keystash", "put", "token", "abc123"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Command::Put {
                key: "token".into(),
                value: "abc123".into()
            }
        );
    }

    #[test]
    fn accepts_empty_value() {
        let cli = Cli::try_parse_from(["keystash", "put", "token", ""]).expect("parse");
        assert!(matches!(cli.command, Command::Put { value, .. } if value.is_empty()));
    }

    #[test]
    fn requires_subcommand() {
        assert!(Cli::try_parse_from(["keystash"]).is_err());
    }

    #[test]
    fn parses_health_subcommand() {
        let cli = Cli::try_parse_from(["keystash", "health"]).expect("parse should succeed");
        assert_eq!(cli.command, Command::Health);
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli =
            Cli::try_parse_from(["keystash", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Command::Config(ConfigCommand::Init));
    }

    #[test]
    fn credentials_slot_selection() {
        let cli = Cli::try_parse_from(["keystash", "credentials", "get"]).expect("parse");
        let Command::Credentials(CredentialsCommand::Get { slot }) = cli.command else {
            panic!("unexpected command");
        };
        assert_eq!(slot.slot(), CredentialSlot::Generic { service: None });

        let cli = Cli::try_parse_from([
            "keystash",
            "credentials",
            "set",
            "sam",
            "pw",
            "--server",
            "example.com",
        ])
        .expect("parse");
        let Command::Credentials(CredentialsCommand::Set { slot, .. }) = cli.command else {
            panic!("unexpected command");
        };
        assert_eq!(slot.slot(), CredentialSlot::internet("example.com"));
    }

    #[test]
    fn service_and_server_conflict() {
        let result = Cli::try_parse_from([
            "keystash",
            "credentials",
            "get",
            "--service",
            "mail",
            "--server",
            "example.com",
        ]);
        assert!(result.is_err());
    }
}
