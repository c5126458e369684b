//! Application entry point — doc-to-audio.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the command line.
//! 3. Load [`AppConfig`] from disk (returns default on first run).
//! 4. Create a current-thread [`tokio`] runtime.
//! 5. Run the selected subcommand on it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_to_audio::{
    config::{AppConfig, AppPaths},
    document::{DocumentRef, DocumentType},
    extract::{Extractors, GoogleDocsExtractor},
    pipeline::{PipelineOrchestrator, PipelineStage, ProcessOptions, StageObserver},
    remote::{CredentialProvider, DriveUploader, FileCredentialProvider},
    storage::LocalStore,
    tts,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "doc-to-audio", version)]
#[command(about = "Convert PDF, DOCX and Google Docs documents to audio", long_about = None)]
struct Cli {
    /// Settings file to use instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Root of the local audio store (overrides the settings file).
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to audio and store it.
    Convert {
        /// Local .pdf/.docx path, or a Google Docs URL.
        input: String,
        /// Keep the synthesized audio at this path as well.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Speech language code (defaults to the configured language).
        #[arg(long, short)]
        language: Option<String>,
        /// Treat the input as a Google Docs URL or id.
        #[arg(long)]
        google_doc: bool,
        /// Upload the stored audio to Google Drive.
        #[arg(long)]
        upload: bool,
    },
    /// List stored audio files.
    List {
        /// Only list one category (pdf, docx, google_docs, other).
        #[arg(long = "type")]
        doc_type: Option<DocumentType>,
    },
    /// Show the metadata recorded for a stored audio file.
    Info {
        path: PathBuf,
    },
    /// Authorize Google access and cache the credential.
    Auth {
        /// Run the consent flow even if a usable credential is cached.
        #[arg(long)]
        force: bool,
    },
    /// Show the effective configuration.
    Config {
        /// Write the effective configuration to the settings file.
        #[arg(long)]
        init: bool,
    },
}

// ---------------------------------------------------------------------------
// Progress output
// ---------------------------------------------------------------------------

/// Prints each busy stage to stderr.
struct ProgressObserver;

impl StageObserver for ProgressObserver {
    fn on_stage(&self, _reference: &DocumentRef, stage: PipelineStage) {
        if stage.is_busy() {
            eprintln!("{}...", stage.label());
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Command line
    let cli = Cli::parse();

    // 3. Configuration
    let paths = AppPaths::new();
    let settings_file = cli.config.clone().unwrap_or_else(|| paths.settings_file.clone());
    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let mut config = loaded.with_context(|| format!("loading {}", settings_file.display()))?;
    if let Some(store) = &cli.store {
        config.storage.base_dir = Some(store.clone());
    }

    // 4. Runtime
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    // 5. Command
    rt.block_on(run(cli.command, config, paths, cli.config))
}

async fn run(
    command: Commands,
    config: AppConfig,
    paths: AppPaths,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        Commands::Convert {
            input,
            output,
            language,
            google_doc,
            upload,
        } => {
            let options = ProcessOptions {
                output_path: output,
                language: language.unwrap_or_else(|| config.tts.language.clone()),
                remote_upload: upload,
            };
            convert(&config, &paths, &input, google_doc, options).await
        }
        Commands::List { doc_type } => {
            let store = LocalStore::open_default(&config, &paths)?;
            let files = store.list_files(doc_type);
            if files.is_empty() {
                println!("No audio files found in {}", store.base_dir().display());
            }
            for file in files {
                println!("{}", file.display());
            }
            Ok(())
        }
        Commands::Info { path } => {
            let store = LocalStore::open_default(&config, &paths)?;
            match store.get_file_info(&path)? {
                Some(info) => {
                    for (key, value) in info.entries() {
                        println!("{key}: {value}");
                    }
                }
                None => println!("No metadata recorded for {}", path.display()),
            }
            Ok(())
        }
        Commands::Auth { force } => {
            let provider = FileCredentialProvider::from_config(&config.google);
            if force {
                provider.reauthorize().await?;
            } else {
                provider.credential().await?;
            }
            println!(
                "Authorized. Credential cached in {}",
                config.google.token_file.display()
            );
            Ok(())
        }
        Commands::Config { init } => {
            let settings_file = config_override.as_deref().unwrap_or(&paths.settings_file);
            if init {
                match &config_override {
                    Some(path) => config.save_to(path)?,
                    None => config.save()?,
                }
                println!("Wrote {}", settings_file.display());
            } else {
                println!("# {}", settings_file.display());
                print!("{}", toml::to_string_pretty(&config)?);
            }
            Ok(())
        }
    }
}

async fn convert(
    config: &AppConfig,
    paths: &AppPaths,
    input: &str,
    google_doc: bool,
    options: ProcessOptions,
) -> Result<()> {
    let reference = DocumentRef::resolve(input, google_doc);

    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(FileCredentialProvider::from_config(&config.google));
    let extractors = Extractors::new(Arc::new(GoogleDocsExtractor::from_config(
        &config.google,
        Arc::clone(&credentials),
    )));

    let mut orchestrator = PipelineOrchestrator::new(
        Arc::new(extractors),
        tts::from_config(&config.tts),
        LocalStore::open_default(config, paths)?,
    )
    .with_observer(Arc::new(ProgressObserver));
    if options.remote_upload {
        orchestrator = orchestrator.with_upload_client(Arc::new(DriveUploader::from_config(
            &config.google,
            credentials,
        )));
    }

    let result = orchestrator.process(&reference, &options).await?;

    println!("Audio stored at: {}", result.stored_audio_path.display());
    if let Some(output) = &result.output_path {
        println!("Audio file created: {}", output.display());
    }
    if let Some(id) = &result.remote_file_id {
        println!("Uploaded to Google Drive with file ID: {id}");
    }
    Ok(())
}
