//! Insert or replace user accounts in the configured store.
//!
//! ```text
//! seed-users --config recipes.toml admin=fCRmh4Q2J7Rseqkz packt=RE4zfHB35VPtTkbT
//! ```

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use recipes_auth::{hash_password, legacy_digest};
use recipes_core::User;
use recipes_db_memory::InMemoryUserStorage;
use recipes_db_mongo::MongoStorage;
use recipes_server::config::StorageBackend;
use recipes_server::config::loader::{LegacyEnv, load_unvalidated};
use recipes_storage::DynUserStorage;

/// Accounts written when no pairs are given.
const DEMO_ACCOUNTS: [(&str, &str); 3] = [
    ("admin", "fCRmh4Q2J7Rseqkz"),
    ("packt", "RE4zfHB35VPtTkbT"),
    ("mlabouardy", "L3nSFRcZzNQ67bcc"),
];

#[derive(Debug, Parser)]
#[command(name = "seed-users", version, about = "Seed user accounts for the recipes API")]
struct Cli {
    /// Configuration file
    #[arg(long, env = "RECIPES_CONFIG", default_value = "recipes.toml")]
    config: String,

    /// Store unsalted SHA-256 hex digests instead of Argon2id hashes
    #[arg(long)]
    legacy_sha256: bool,

    /// Accounts as username=password pairs
    #[arg(value_parser = parse_account)]
    accounts: Vec<(String, String)>,
}

fn parse_account(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((user, pass)) if !user.is_empty() && !pass.is_empty() => {
            Ok((user.to_string(), pass.to_string()))
        }
        _ => Err(format!("expected username=password, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }
    recipes_server::observability::init_tracing();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("seed-users: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = load_unvalidated(Some(&cli.config), &LegacyEnv::from_env())
        .map_err(anyhow::Error::msg)?;
    cfg.validate_storage().map_err(anyhow::Error::msg)?;
    recipes_server::observability::apply_logging_level(&cfg.logging.level);

    let accounts: Vec<(String, String)> = if cli.accounts.is_empty() {
        DEMO_ACCOUNTS
            .iter()
            .map(|(u, p)| (u.to_string(), p.to_string()))
            .collect()
    } else {
        cli.accounts
    };

    let users = accounts
        .iter()
        .map(|(username, password)| {
            let digest = if cli.legacy_sha256 {
                legacy_digest(password)
            } else {
                hash_password(password).with_context(|| format!("hashing password for {username}"))?
            };
            Ok(User::new(username.clone(), digest))
        })
        .collect::<Result<Vec<_>>>()?;

    match cfg.storage.backend {
        StorageBackend::Mongo => {
            let storage = MongoStorage::connect(&cfg.storage.mongo.to_mongo_config())
                .await
                .context("connecting to MongoDB")?;
            let store: DynUserStorage = Arc::new(storage.users());
            upsert_all(&store, &users).await?;
        }
        StorageBackend::Memory => {
            let Some(path) = cfg.storage.memory.users_file.as_deref() else {
                bail!("storage.memory.users_file must be set to seed the memory backend");
            };
            let file_store = InMemoryUserStorage::from_file(path).await?;
            let store: DynUserStorage = Arc::new(file_store.clone());
            upsert_all(&store, &users).await?;
            file_store.save_to_file(path).await?;
            tracing::info!(path, "Users file written");
        }
    }
    Ok(())
}

async fn upsert_all(store: &DynUserStorage, users: &[User]) -> Result<()> {
    for user in users {
        let created = store
            .upsert(user)
            .await
            .with_context(|| format!("storing {}", user.username))?;
        tracing::info!(username = %user.username, created, "Account stored");
    }
    Ok(())
}
