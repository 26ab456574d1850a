//! `fieldcrypt-audit` — batch encryption migration and compliance audit.
//!
//! Startup sequence:
//! 1. Parse CLI arguments.
//! 2. Load and validate engine configuration from environment variables.
//! 3. Initialise structured logging.
//! 4. Build the key provider and façade; refuse to touch any data unless the
//!    setup round-trip check passes.
//! 5. Scan each target collection in bounded batches, classifying every
//!    declared field.
//! 6. Print the summary; exit non-zero on any outstanding policy violation.
//!
//! Safe to re-run: a migrate pass over an already-migrated collection
//! produces zero writes.

mod report;
mod scan;
mod store;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fieldcrypt::{Config, FieldCrypt, FieldRegistry, KeyProvider};

use scan::{scan_collection, Mode};
use store::JsonlStore;

#[derive(Parser, Debug)]
#[command(
    name = "fieldcrypt-audit",
    version,
    about = "Audit or migrate field-level encryption across document collections",
    group(ArgGroup::new("mode").required(true).args(["audit", "migrate"]))
)]
struct Cli {
    /// Collection to process (all registered collections when omitted)
    collection: Option<String>,

    /// Read-only: report every plaintext occurrence without writing
    #[arg(long)]
    audit: bool,

    /// Encrypt every plaintext occurrence and persist the result
    #[arg(long)]
    migrate: bool,

    /// Documents fetched per batch
    #[arg(long, default_value_t = 500)]
    batch_size: usize,

    /// Directory holding one `<collection>.jsonl` file per collection
    #[arg(long, env = "FIELDCRYPT_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    if cli.batch_size == 0 {
        anyhow::bail!("--batch-size must be greater than zero");
    }
    let mode = if cli.migrate {
        Mode::Migrate
    } else {
        Mode::Audit
    };

    let cfg = Config::from_env().context("configuration invalid")?;
    telemetry::init(&cfg.log_level)?;

    let keys = KeyProvider::from_config(&cfg).context("key material invalid")?;
    let crypt = FieldCrypt::new(Arc::new(keys), cfg.decrypt_mode);
    if !crypt.validate_encryption_setup() {
        anyhow::bail!("encryption setup validation failed; refusing to touch any data");
    }

    let registry = FieldRegistry::builtin();
    let collections: Vec<String> = match &cli.collection {
        Some(name) => {
            registry
                .fields_for(name)
                .context("unknown collection; see the registry for declared types")?;
            vec![name.clone()]
        }
        None => registry.document_types().map(str::to_owned).collect(),
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("cancellation requested; stopping before the next batch");
                cancel.cancel();
            }
        });
    }

    info!(
        mode = ?mode,
        collections = collections.len(),
        batch_size = cli.batch_size,
        "starting scan"
    );

    let mut reports = Vec::new();
    for collection in &collections {
        if cancel.is_cancelled() {
            break;
        }
        let paths = registry
            .fields_for(collection)
            .context("collection disappeared from the registry")?;

        let path = cli.data_dir.join(format!("{collection}.jsonl"));
        if !path.exists() && cli.collection.is_none() {
            warn!(collection = %collection, path = %path.display(), "no export file; skipping");
            continue;
        }

        let mut store = JsonlStore::open(&path, mode == Mode::Migrate).await?;
        let report = scan_collection(
            &mut store,
            &crypt,
            collection,
            paths,
            mode,
            cli.batch_size,
            &cancel,
        )
        .await
        .with_context(|| format!("scan of {collection} failed"))?;

        info!(
            collection = %collection,
            documents = report.documents,
            written = report.documents_written,
            "collection scan finished"
        );
        reports.push(report);
    }

    report::print_summary(&reports, mode);
    Ok(report::exit_code(&reports, mode))
}
