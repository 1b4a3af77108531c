use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use wb_ledger::{Account, Balances, LedgerConfig, Snapshot, State, Tx};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Version => cmd_version(&cli.format),
        Command::Balances(BalancesCommand::List) => cmd_balances_list(&cli),
        Command::Tx(TxCommand::Add(args)) => cmd_tx_add(&cli, args),
        Command::Snapshot(args) => cmd_snapshot(&cli, args),
    }
}

fn ledger_config(cli: &Cli) -> anyhow::Result<LedgerConfig> {
    match &cli.config {
        Some(path) => LedgerConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(LedgerConfig::from_data_dir(&cli.data_dir)),
    }
}

fn load_state(cli: &Cli) -> anyhow::Result<State> {
    let config = ledger_config(cli)?;
    State::load(&config).with_context(|| {
        format!(
            "loading ledger from {} and {}",
            config.genesis_path.display(),
            config.log_path.display()
        )
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_version(format: &OutputFormat) -> anyhow::Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "version": version })),
        OutputFormat::Text => {
            println!("Version: {}", version.bold());
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct BalancesReport<'a> {
    snapshot: String,
    balances: &'a Balances,
}

fn cmd_balances_list(cli: &Cli) -> anyhow::Result<()> {
    let state = load_state(cli)?;
    let snapshot = state.latest_snapshot();

    match cli.format {
        OutputFormat::Json => print_json(&BalancesReport {
            snapshot: snapshot.to_hex(),
            balances: state.balances(),
        })?,
        OutputFormat::Text => {
            println!("Accounts balances at {}:", snapshot.to_hex().cyan());
            println!("{}", "__________________".dimmed());
            println!();
            for (account, balance) in state.balances() {
                println!("{}: {}", account.to_string().bold(), balance);
            }
        }
    }

    state.close()?;
    Ok(())
}

fn cmd_tx_add(cli: &Cli, args: &TxAddArgs) -> anyhow::Result<()> {
    let from: Account = args.from.parse().context("invalid --from account")?;
    let to: Account = args.to.parse().context("invalid --to account")?;
    let tx = Tx::new(from, to, args.value).with_data(args.data.as_str());

    let mut state = load_state(cli)?;
    state.add(tx).context("transaction rejected")?;
    let snapshot = state.persist().context("persisting transaction")?;
    state.close()?;

    match cli.format {
        OutputFormat::Json => print_json(&serde_json::json!({ "snapshot": snapshot.to_hex() })),
        OutputFormat::Text => {
            println!("{} TX successfully added to the ledger.", "✓".green().bold());
            print_snapshot(&snapshot);
            Ok(())
        }
    }
}

fn cmd_snapshot(cli: &Cli, args: &SnapshotArgs) -> anyhow::Result<()> {
    let mut state = load_state(cli)?;
    let snapshot = state.latest_snapshot();
    let verified = if args.verify {
        Some(state.verify_snapshot()?)
    } else {
        None
    };
    state.close()?;

    match cli.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "snapshot": snapshot.to_hex(),
            "verified": verified,
        }))?,
        OutputFormat::Text => {
            print_snapshot(&snapshot);
            match verified {
                Some(true) => println!("  Log: {}", "matches".green()),
                Some(false) => println!("  Log: {}", "changed since load".red()),
                None => {}
            }
        }
    }

    if verified == Some(false) {
        anyhow::bail!("log content does not match snapshot {}", snapshot.short_hex());
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("Snapshot: {}", snapshot.to_hex().cyan());
}
