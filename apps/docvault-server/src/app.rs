//! Application state and initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use docvault_classify::InferenceClassifier;
use docvault_core::AppConfig;
use docvault_extract::ExtractorRegistry;
use docvault_pipeline::DocumentPipeline;
use docvault_store::{PgMetadataStore, S3ArchiveStore};

use crate::cli::Args;
use crate::server::Server;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The document pipeline
    pub pipeline: Arc<DocumentPipeline>,
}

impl AppState {
    /// Create a new application state with all dependencies
    pub async fn new(config: &AppConfig) -> Result<Self> {
        info!("Initializing application components");

        let extractors = Arc::new(ExtractorRegistry::with_defaults());

        let classifier = Arc::new(InferenceClassifier::new(config.inference.clone()));

        let archive = Arc::new(S3ArchiveStore::from_env(config.archive.clone()).await);

        let metadata = PgMetadataStore::connect(&config.database)
            .await
            .context("Failed to connect to the metadata database")?;
        metadata.health_check().await.context("Database health check failed")?;
        info!("Metadata database reachable, schema bootstrapped");

        let pipeline = Arc::new(DocumentPipeline::new(
            extractors,
            classifier,
            archive,
            Arc::new(metadata),
        ));

        Ok(Self { pipeline })
    }
}

/// Main application
pub struct App {
    config: AppConfig,
    state: AppState,
}

impl App {
    /// Build the application with all dependencies
    pub async fn build(args: Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => AppConfig::load_from_file(&path.to_string_lossy())
                .context("Failed to load configuration file")?,
            None => AppConfig::load().context("Failed to load configuration")?,
        };

        // Command line takes precedence over config for the listen port
        config.server = config.server.clone().with_port(args.port);

        let state = AppState::new(&config).await?;

        Ok(Self { config, state })
    }

    /// Run the application
    pub async fn run(self) -> Result<()> {
        info!("Starting server");
        info!("HTTP address: {}", self.config.server.address());

        let server = Server::new(self.config.server, self.state);
        server.run().await?;

        Ok(())
    }
}
