use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wb", about = "Warchief Ledger CLI", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding genesis.json and tx.db
    #[arg(long, global = true, default_value = "database")]
    pub data_dir: PathBuf,

    /// TOML ledger config; overrides --data-dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Describes version
    Version,
    /// Interact with balances (list...)
    #[command(subcommand)]
    Balances(BalancesCommand),
    /// Interact with transactions (add...)
    #[command(subcommand)]
    Tx(TxCommand),
    /// Show the latest log snapshot
    Snapshot(SnapshotArgs),
}

#[derive(Subcommand)]
pub enum BalancesCommand {
    /// Lists all balances
    List,
}

#[derive(Subcommand)]
pub enum TxCommand {
    /// Adds a new transaction and persists it
    Add(TxAddArgs),
}

#[derive(Args)]
pub struct TxAddArgs {
    #[arg(long)]
    pub from: String,
    #[arg(long)]
    pub to: String,
    #[arg(long)]
    pub value: u64,
    /// Possible values: 'reward'
    #[arg(long, default_value = "")]
    pub data: String,
}

#[derive(Args)]
pub struct SnapshotArgs {
    /// Re-hash the log and compare it against the loaded snapshot
    #[arg(long)]
    pub verify: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_version() {
        let cli = Cli::try_parse_from(["wb", "version"]).unwrap();
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_balances_list() {
        let cli = Cli::try_parse_from(["wb", "balances", "list"]).unwrap();
        assert!(matches!(cli.command, Command::Balances(BalancesCommand::List)));
        assert_eq!(cli.data_dir, PathBuf::from("database"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn balances_requires_subcommand() {
        assert!(Cli::try_parse_from(["wb", "balances"]).is_err());
    }

    #[test]
    fn parse_tx_add() {
        let cli = Cli::try_parse_from([
            "wb", "tx", "add", "--from", "andrej", "--to", "babayaga", "--value", "100",
        ])
        .unwrap();
        let Command::Tx(TxCommand::Add(args)) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(args.from, "andrej");
        assert_eq!(args.to, "babayaga");
        assert_eq!(args.value, 100);
        assert_eq!(args.data, "");
    }

    #[test]
    fn parse_tx_add_reward() {
        let cli = Cli::try_parse_from([
            "wb", "tx", "add", "--from", "andrej", "--to", "andrej", "--value", "700", "--data",
            "reward",
        ])
        .unwrap();
        let Command::Tx(TxCommand::Add(args)) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(args.data, "reward");
    }

    #[test]
    fn tx_add_rejects_negative_value() {
        let result = Cli::try_parse_from([
            "wb", "tx", "add", "--from", "a", "--to", "b", "--value", "-1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_snapshot_verify() {
        let cli = Cli::try_parse_from(["wb", "snapshot", "--verify"]).unwrap();
        let Command::Snapshot(args) = cli.command else {
            panic!("wrong command");
        };
        assert!(args.verify);
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "wb",
            "--data-dir",
            "/tmp/ledger",
            "--format",
            "json",
            "-v",
            "balances",
            "list",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/ledger"));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::try_parse_from(["wb", "snapshot", "--config", "ledger.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ledger.toml")));
    }
}
