mod print;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ledger_core::{
    chain::genesis_previous_hash, pow::search_nonce, Block, CancelToken, Hash, Ledger,
    LedgerConfig, Transaction,
};
use std::{fs, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Drive the proof-of-work ledger core from the command line")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// JSON file with any subset of the ledger configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Leading hex zeros required of a block hash
    #[arg(long)]
    difficulty: Option<u32>,
    /// Reward paid to the owner per mined block
    #[arg(long)]
    reward: Option<f64>,
    /// Sender id stamped on reward transactions
    #[arg(long)]
    reward_sender: Option<String>,
    /// Reject empty identifiers and non-positive values
    #[arg(long)]
    validate: bool,
    /// Search nonces on all cores
    #[arg(long)]
    parallel: bool,
}

impl ConfigArgs {
    fn load(&self) -> Result<LedgerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => LedgerConfig::default(),
        };
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(reward) = self.reward {
            config.mining_reward = reward;
        }
        if let Some(sender) = &self.reward_sender {
            config.reward_sender_id = sender.clone();
        }
        config.validate_transactions |= self.validate;
        config.parallel_search |= self.parallel;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a small chain, dump it, and print balances
    Demo {
        /// Ledger owner and reward recipient
        #[arg(long, default_value = "my_blockchain_address")]
        owner: String,
        /// Dump blocks as JSON instead of text
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Search for a nonce; Ctrl-C aborts the search
    Pow {
        /// Previous block hash as 64 hex characters (default: genesis previous hash)
        #[arg(long)]
        previous_hash: Option<String>,
        /// Transaction as sender:recipient:value, repeatable
        #[arg(long = "tx", value_parser = parse_tx)]
        txs: Vec<Transaction>,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the default block's canonical encoding and hash
    Hash,
}

fn parse_tx(s: &str) -> std::result::Result<Transaction, String> {
    let mut parts = s.rsplitn(2, ':');
    let value = parts.next().ok_or("missing value")?;
    let rest = parts.next().ok_or("expected sender:recipient:value")?;
    let (sender, recipient) = rest
        .split_once(':')
        .ok_or("expected sender:recipient:value")?;
    let value: f64 = value
        .parse()
        .map_err(|e| format!("bad value {value:?}: {e}"))?;
    Ok(Transaction::new(sender, recipient, value))
}

fn parse_hash(s: &str) -> Result<Hash> {
    let mut out = [0u8; 32];
    hex::decode_to_slice(s, &mut out).map_err(|e| anyhow!("bad previous hash {s:?}: {e}"))?;
    Ok(out)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn dump(ledger: &Ledger, json: bool) -> Result<()> {
    if json {
        println!("{}", print::ledger_json(ledger)?);
    } else {
        print!("{}", print::ledger(ledger));
    }
    Ok(())
}

fn run_demo(owner: String, json: bool, config: LedgerConfig) -> Result<()> {
    let mut ledger = Ledger::with_config(owner, config)?;
    dump(&ledger, json)?;

    ledger.add_transaction("A", "B", 1.0)?;
    ledger.mine()?;
    dump(&ledger, json)?;

    ledger.add_transaction("C", "D", 2.0)?;
    ledger.add_transaction("X", "Y", 3.0)?;
    ledger.mine()?;
    dump(&ledger, json)?;

    println!();
    println!("Mine: {:.1}", ledger.compute_balance(ledger.owner()));
    println!("C   : {:.1}", ledger.compute_balance("C"));
    println!("D   : {:.1}", ledger.compute_balance("D"));

    ledger.validate_chain().context("chain audit failed")?;
    info!(blocks = ledger.block_count(), "chain audit passed");
    Ok(())
}

async fn run_pow(previous_hash: Hash, txs: Vec<Transaction>, config: LedgerConfig) -> Result<()> {
    let cancel = CancelToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling search");
                cancel.cancel();
            }
        })
    };

    let search = {
        let cancel = cancel.clone();
        let txs = txs.clone();
        tokio::task::spawn_blocking(move || {
            search_nonce(
                &previous_hash,
                &txs,
                config.difficulty,
                config.parallel_search,
                &cancel,
            )
        })
    };
    let result = search.await.context("nonce search task failed")?;
    watcher.abort();

    let nonce = result?;
    let candidate = Block::with_timestamp(0, nonce, previous_hash, txs);
    println!("nonce: {nonce}");
    println!("hash:  {}", candidate.hash_hex());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Command::Demo {
            owner,
            json,
            config,
        } => run_demo(owner, json, config.load()?)?,
        Command::Pow {
            previous_hash,
            txs,
            config,
        } => {
            let previous_hash = match previous_hash {
                Some(s) => parse_hash(&s)?,
                None => genesis_previous_hash(),
            };
            let config = config.load()?;
            for tx in &txs {
                tx.check_encodable()?;
                if config.validate_transactions {
                    tx.validate()?;
                }
            }
            run_pow(previous_hash, txs, config).await?
        }
        Command::Hash => {
            let block = Block::default();
            println!("{}", String::from_utf8(block.canonical_bytes())?);
            println!("{}", block.hash_hex());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tx_accepts_three_fields() {
        let tx = parse_tx("alice:bob:2.5").unwrap();
        assert_eq!(tx, Transaction::new("alice", "bob", 2.5));
    }

    #[test]
    fn parse_tx_rejects_garbage() {
        assert!(parse_tx("alice:bob").is_err());
        assert!(parse_tx("alice:bob:lots").is_err());
        assert!(parse_tx("nothing").is_err());
    }

    #[test]
    fn parse_hash_requires_32_bytes() {
        assert_eq!(parse_hash(&"00".repeat(32)).unwrap(), [0u8; 32]);
        assert!(parse_hash("abcd").is_err());
    }

    #[test]
    fn config_flags_override_file_defaults() {
        let args = ConfigArgs {
            config: None,
            difficulty: Some(1),
            reward: Some(5.0),
            reward_sender: Some("MINT".into()),
            validate: true,
            parallel: false,
        };
        let config = args.load().unwrap();
        assert_eq!(config.difficulty, 1);
        assert_eq!(config.mining_reward, 5.0);
        assert_eq!(config.reward_sender_id, "MINT");
        assert!(config.validate_transactions);
    }

    #[test]
    fn config_load_rejects_unreachable_difficulty() {
        let args = ConfigArgs {
            config: None,
            difficulty: Some(65),
            reward: None,
            reward_sender: None,
            validate: false,
            parallel: false,
        };
        assert!(args.load().is_err());
    }

    #[test]
    fn cli_parses_demo_and_pow() {
        let cli = Cli::try_parse_from(["ledger-cli", "demo", "--difficulty", "2"]).unwrap();
        assert!(matches!(cli.cmd, Command::Demo { .. }));

        let cli = Cli::try_parse_from([
            "ledger-cli",
            "pow",
            "--tx",
            "A:B:1",
            "--tx",
            "C:D:2.5",
            "--parallel",
        ])
        .unwrap();
        match cli.cmd {
            Command::Pow { txs, config, .. } => {
                assert_eq!(txs.len(), 2);
                assert!(config.parallel);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn demo_runs_end_to_end() {
        let config = LedgerConfig {
            difficulty: 1,
            ..LedgerConfig::default()
        };
        run_demo("M".into(), true, config).unwrap();
    }
}
