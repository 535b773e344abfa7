//! VaultPort command line entry point
//!
//! Migrates an unlocked Bitwarden vault into an encrypted vaultport archive:
//! - Folders become nested groups
//! - Logins and secure notes become entries (cards and identities optionally)
//! - TOTP seeds, extra URLs, custom fields and attachments are carried over

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zeroize::Zeroizing;

use vaultport_migrator::config::Config;
use vaultport_migrator::migrate::{MigrationOptions, Migrator};
use vaultport_migrator::source::{resolve_bw_path, BitwardenCli};
use vaultport_shared::normalize::ItemPolicy;
use vaultport_shared::store::{CompositeKey, DesktopFileProvider, StoreError, VaultStore};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session key of an unlocked Bitwarden vault (`bw unlock --raw`)
    #[arg(long, env = "BW_SESSION", hide_env_values = true)]
    bw_session: String,

    /// Destination vault archive, created if it does not exist
    #[arg(long, env = "DATABASE_PATH")]
    database_path: PathBuf,

    /// Destination vault password (prompted for when absent)
    #[arg(long, env = "DATABASE_PASSWORD", hide_env_values = true)]
    database_password: Option<String>,

    /// Key file protecting the destination vault
    #[arg(long, env = "DATABASE_KEYFILE")]
    database_keyfile: Option<PathBuf>,

    /// Path to the Bitwarden CLI
    #[arg(long, env = "BW_PATH")]
    bw_path: Option<String>,

    /// What to do with card and identity items: skip or flatten
    #[arg(long)]
    item_policy: Option<ItemPolicy>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(debug: bool, config: &Config) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::try_from_default_env().context("Invalid RUST_LOG filter")?
    } else {
        EnvFilter::try_new(&config.logging.level).context("Invalid logging.level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(filter)
        .init();
    Ok(())
}

/// Validate arguments that refer to files before touching anything
fn check_args(args: &Args, config: &Config) -> Result<PathBuf> {
    if let Some(keyfile) = &args.database_keyfile {
        if !keyfile.is_file() || std::fs::File::open(keyfile).is_err() {
            bail!("Key file {:?} for the vault is not readable", keyfile);
        }
    }

    resolve_bw_path(&config.source.bw_path).with_context(|| {
        format!(
            "bitwarden-cli was not found or not executable. Did you set the correct '--bw-path' ({})?",
            config.source.bw_path
        )
    })
}

fn read_password(args: &Args) -> Result<Zeroizing<String>> {
    let password = match &args.database_password {
        Some(password) => Zeroizing::new(password.clone()),
        None => Zeroizing::new(
            rpassword::prompt_password("Vault password: ").context("Failed to read password")?,
        ),
    };

    if password.is_empty() {
        bail!("Vault password must not be empty");
    }
    Ok(password)
}

fn run(args: Args, config: Config) -> Result<()> {
    let bw_path = check_args(&args, &config)?;

    let database_path = args
        .database_path
        .to_str()
        .context("Vault path is not valid UTF-8")?
        .to_string();

    let password = read_password(&args)?;
    let key = CompositeKey::new(&password, args.database_keyfile.as_deref())
        .context("Failed to prepare vault key")?;
    let strength = match config.storage.min_password_length {
        Some(min_length) => key.check_strength(min_length),
        None => Ok(()),
    };

    let (mut store, created) =
        match VaultStore::open_or_create(DesktopFileProvider::new(), &database_path, key) {
            Ok(opened) => opened,
            Err(StoreError::InvalidCredentials { .. }) => {
                bail!("Wrong password or key file for vault {}", database_path)
            }
            Err(e) => return Err(e).context("Failed to open vault"),
        };
    if created {
        strength.context("Refusing to create a vault with a weak password")?;
    }

    let source = BitwardenCli::new(bw_path, Zeroizing::new(args.bw_session));
    let options = MigrationOptions {
        item_policy: config.migration.item_policy,
        ..MigrationOptions::default()
    };

    let report = Migrator::new(&source, &mut store, options)
        .run()
        .context("Migration failed")?;

    if !report.skipped.is_empty() {
        warn!("{} items were skipped", report.skipped.len());
    }
    for renamed in &report.renamed {
        info!("\"{}\" was stored as \"{}\"", renamed.original, renamed.title);
    }
    info!("Export completed: {}", report.summary());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Override config with command line arguments
    if let Some(bw_path) = &args.bw_path {
        config.source.bw_path = bw_path.clone();
    }
    if let Some(policy) = args.item_policy {
        config.migration.item_policy = policy;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    init_logging(args.debug, &config)?;
    info!("Starting VaultPort v{}", env!("CARGO_PKG_VERSION"));

    match run(args, config) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("{:#}", e);
            Err(e)
        }
    }
}
