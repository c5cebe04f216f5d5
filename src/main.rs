use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use ed25519_dalek::SigningKey;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use chainseal::block::{build_block, BlockEnvelope, BlockType};
use chainseal::config::AppConfig;
use chainseal::crypto::did::encode_did;
use chainseal::crypto::keys::{generate_keypair, public_key_bytes};
use chainseal::ledger::{FileLedgerStore, Ledger};

#[derive(Parser)]
#[command(name = "chainseal", about = "Signed hash-chain ledger with quorum-gated sealing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a keypair, write the seed to the key file, print the DID
    Keygen,
    /// Build, sign and append an event block
    Append {
        /// Action name recorded on the block
        action: String,
        /// JSON payload (defaults to null)
        #[arg(long)]
        data: Option<String>,
    },
    /// Verify the full chain: linkage, replay, hashes, signatures
    Verify,
    /// Print the epoch root digest over the whole sequence
    Root,
    /// Print the ledger as a JSON array of blocks
    Export,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chainseal=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().map_err(|e| anyhow!("configuration error: {}", e))?;
    let cli = Cli::parse();

    match cli.command {
        Command::Keygen => keygen(&config),
        Command::Append { action, data } => append(&config, &action, data.as_deref()),
        Command::Verify => {
            let ledger = open_ledger(&config)?;
            ledger.verify_chain()?;
            println!("chain valid ({} blocks)", ledger.len());
            Ok(())
        }
        Command::Root => {
            let ledger = open_ledger(&config)?;
            println!("{}", ledger.epoch_root()?);
            Ok(())
        }
        Command::Export => {
            let ledger = open_ledger(&config)?;
            println!("{}", ledger.export_json()?);
            Ok(())
        }
    }
}

fn open_ledger(config: &AppConfig) -> Result<Ledger> {
    let store = FileLedgerStore::open(&config.ledger_path)?;
    Ok(Ledger::open(Box::new(store))?)
}

fn keygen(config: &AppConfig) -> Result<()> {
    let key_path = Path::new(&config.key_path);
    if key_path.exists() {
        return Err(anyhow!("key file already exists: {}", config.key_path));
    }

    let signing_key = generate_keypair();
    std::fs::write(key_path, hex::encode(signing_key.to_bytes()))
        .with_context(|| format!("failed to write key file {}", config.key_path))?;

    info!(path = %config.key_path, "key written");
    println!("{}", encode_did(&public_key_bytes(&signing_key)));
    Ok(())
}

fn load_key(config: &AppConfig) -> Result<SigningKey> {
    let hex_seed = std::fs::read_to_string(&config.key_path)
        .with_context(|| format!("failed to read key file {}", config.key_path))?;
    let bytes = hex::decode(hex_seed.trim()).context("key file is not valid hex")?;
    let seed: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("key file must contain a 32-byte seed"))?;
    Ok(SigningKey::from_bytes(&seed))
}

fn append(config: &AppConfig, action: &str, data: Option<&str>) -> Result<()> {
    let signing_key = load_key(config)?;
    let data = match data {
        Some(raw) => serde_json::from_str(raw).context("--data is not valid JSON")?,
        None => serde_json::Value::Null,
    };

    let mut ledger = open_ledger(config)?;
    let envelope = BlockEnvelope::new(
        BlockType::Event,
        action.to_string(),
        data,
        ledger.tip().to_string(),
        Uuid::new_v4().to_string(),
        Utc::now().timestamp_millis(),
        encode_did(&public_key_bytes(&signing_key)),
    );
    let block = build_block(envelope, &signing_key)?;
    let hash = block.hash.clone();
    ledger.append(block)?;

    println!("{}", hash);
    Ok(())
}
