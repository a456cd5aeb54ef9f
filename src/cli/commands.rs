// Keyforge - CLI Command Handlers
//
// Each function handles one CLI subcommand. The offline commands drive the
// same pipeline the bot uses, with the local OS user as requester; `serve`
// starts the long-polling bot.

use std::path::PathBuf;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::bot::{self, Bot};
use crate::config::AppConfig;
use crate::error::KeyforgeError;
use crate::gateway::TelegramClient;
use crate::params::{Credentials, ParameterResolver};
use crate::pipeline::{Pipeline, PipelineError, ReuseOutcome};
use crate::session::SessionTracker;
use crate::store::{read_credentials, ArchiveManager, KeystoreRecord, PackageId, Requester, INFO_FILE};
use crate::toolchain::SystemToolRunner;

use super::Commands;

/// Execute the parsed CLI command.
pub async fn execute(command: Commands, config: AppConfig) -> Result<(), KeyforgeError> {
    match command {
        Commands::Serve => cmd_serve(config).await,
        Commands::Generate {
            package,
            alias,
            password,
            reuse,
        } => cmd_generate(config, package, alias, password, reuse).await,
        Commands::Convert {
            file,
            alias,
            password,
            package,
        } => cmd_convert(config, file, alias, password, package).await,
        Commands::Archives { package } => cmd_archives(config, package),
    }
}

// ─── Generate ────────────────────────────────────────────────────────────────

async fn cmd_generate(
    config: AppConfig,
    package: String,
    alias: Option<String>,
    password: Option<String>,
    reuse: bool,
) -> Result<(), KeyforgeError> {
    let pipeline = pipeline(&config);
    let package = PackageId::sanitize(&package);
    let params = pipeline.parameters(credentials(pipeline.resolver(), alias, password));
    let requester = Requester::local();

    let record = if reuse {
        match pipeline.reuse(&package, &params, &requester).await? {
            ReuseOutcome::Reused(record) => record.into_record(),
            ReuseOutcome::Regenerated(record) => {
                println!("Previous keystore not found, generated a new key.");
                record.into_record()
            }
        }
    } else {
        pipeline.generate(&package, &params, &requester).await?.into_record()
    };

    print_record(&record);
    Ok(())
}

// ─── Convert ─────────────────────────────────────────────────────────────────

async fn cmd_convert(
    config: AppConfig,
    file: PathBuf,
    alias: Option<String>,
    password: Option<String>,
    package: Option<String>,
) -> Result<(), KeyforgeError> {
    if !file.is_file() {
        return Err(KeyforgeError::Other(format!("Keystore file not found: {}", file.display())));
    }

    let pipeline = pipeline(&config);
    let package = match package {
        Some(p) => PackageId::sanitize(&p),
        None => PackageId::from_file_name(&file.to_string_lossy()),
    };
    let creds = credentials(pipeline.resolver(), alias, password);

    match pipeline.convert(&package, &creds, &file, &Requester::local()).await {
        Ok(record) => {
            print_record(&record);
            Ok(())
        }
        Err(PipelineError::Extraction { keystore, source }) => {
            println!("Keystore stored at {}", keystore.display());
            Err(PipelineError::Extraction { keystore, source }.into())
        }
        Err(e) => Err(e.into()),
    }
}

// ─── Archives ────────────────────────────────────────────────────────────────

fn cmd_archives(config: AppConfig, package: String) -> Result<(), KeyforgeError> {
    let package = PackageId::sanitize(&package);
    let archive = ArchiveManager::new(&config.storage.archive_dir);
    let entries = archive.list(&package)?;

    if entries.is_empty() {
        println!("No archived records for {}.", package);
        return Ok(());
    }

    println!("Archived records for {} ({}):\n", package, entries.len());
    for entry in &entries {
        let alias = read_credentials(&entry.join(INFO_FILE))
            .map(|(alias, _)| alias)
            .unwrap_or_else(|| "-".to_string());
        println!("  {} │ alias {}", entry.display(), alias);
    }

    Ok(())
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn cmd_serve(config: AppConfig) -> Result<(), KeyforgeError> {
    let token = config.bot_token()?;
    let client = TelegramClient::new(token, &config.bot.api_base)?;

    let bot = Arc::new(Bot::new(
        pipeline(&config),
        client,
        SessionTracker::new(config.choice_ttl()),
    ));

    tracing::info!(
        generated_dir = %config.storage.generated_dir.display(),
        archive_dir = %config.storage.archive_dir.display(),
        "Starting bot"
    );
    println!("Keyforge bot running. Press Ctrl+C to stop.");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    };
    bot::run(bot, config.bot.poll_timeout_secs, shutdown).await;

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn pipeline(config: &AppConfig) -> Pipeline<SystemToolRunner> {
    Pipeline::new(Arc::new(SystemToolRunner), config.pipeline_settings())
}

/// Explicit flags, falling back to the configured defaults one by one.
fn credentials(resolver: &ParameterResolver, alias: Option<String>, password: Option<String>) -> Credentials {
    Credentials {
        alias: alias.unwrap_or_else(|| resolver.default_alias().to_string()),
        password: Zeroizing::new(password.unwrap_or_else(|| resolver.default_password().to_string())),
    }
}

fn print_record(record: &KeystoreRecord) {
    println!("✓ Keystore record written for {}", record.package);
    println!("  Keystore:    {}", record.paths.keystore.display());
    println!("  Certificate: {}", record.paths.certificate.display());
    if let Some(archived) = &record.archived_to {
        println!("  Archived previous record to {}", archived.display());
    }
    println!();
    println!("{}", record.info);
}
