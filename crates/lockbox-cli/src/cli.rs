use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

use lockbox_core::VERSION;

/// Lockbox - A local, encrypted credential store
#[derive(Parser)]
#[command(name = "lockbox")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the encrypted store file
    #[arg(short, long, global = true, env = "LOCKBOX_STORE")]
    pub store: Option<String>,

    /// Path to the config file holding store and key settings
    #[arg(long, global = true, env = "LOCKBOX_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Secret name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Secret value (falls back to LOCKBOX_VALUE, a hidden prompt, then stdin)
    #[arg(value_name = "VALUE")]
    pub value: Option<String>,
}

/// Arguments for the `get` command
#[derive(Args)]
pub struct GetArgs {
    /// Secret name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Print the decrypted value instead of the ciphertext
    #[arg(long)]
    pub reveal: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Include decrypted values
    #[arg(long)]
    pub reveal: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `remove` command
#[derive(Args)]
pub struct RemoveArgs {
    /// Secret name
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Arguments for the `import` command
#[derive(Args)]
pub struct ImportArgs {
    /// CSV export with a header row: name,url,username,password,note
    #[arg(value_name = "CSV")]
    pub file: String,
}

/// Arguments for the `search` command
#[derive(Args)]
pub struct SearchArgs {
    /// Case-insensitive substring matched against secret names
    #[arg(value_name = "KEYWORD")]
    pub keyword: String,

    /// Split decrypted values into username and password columns
    #[arg(long)]
    pub reveal: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `status` command
#[derive(Args)]
pub struct StatusArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `backup` command
#[derive(Args)]
pub struct BackupArgs {
    /// Destination path for the encrypted copy
    #[arg(value_name = "DEST")]
    pub destination: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt and store a secret
    Add(AddArgs),

    /// Show a stored secret
    Get(GetArgs),

    /// List secret names
    #[command(alias = "ls")]
    List(ListArgs),

    /// Delete a secret
    #[command(alias = "rm")]
    Remove(RemoveArgs),

    /// Import rows from a password-manager CSV export
    Import(ImportArgs),

    /// Search secret names
    Search(SearchArgs),

    /// Replace the master key and re-encrypt every secret
    Rotate,

    /// Show key version, expiry and store health
    Status(StatusArgs),

    /// Copy the encrypted store file
    Backup(BackupArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::try_parse_from(["lockbox", "-vv", "rotate"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Rotate));
    }

    #[test]
    fn test_add_value_is_optional() {
        let cli = Cli::try_parse_from(["lockbox", "add", "mail"]).unwrap();
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.name, "mail");
                assert!(args.value.is_none());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_global_store_after_subcommand() {
        let cli =
            Cli::try_parse_from(["lockbox", "list", "--store", "/tmp/x.llk", "--json"]).unwrap();
        assert_eq!(cli.store.as_deref(), Some("/tmp/x.llk"));
        assert!(matches!(cli.command, Commands::List(ListArgs { json: true, .. })));
    }
}
