//! IdeaMesh - questions, answers and LLM-scored ideas

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use ideamesh::{
    auth::JwtValidator,
    config::Args,
    db::MongoClient,
    logging,
    provider::ProviderRegistry,
    server::{self, AppState},
    store::{MemoryStore, MongoStore, Store},
};

/// Token lifetime for tokens minted by this process (dev tooling only)
const JWT_EXPIRY_SECONDS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  IdeaMesh");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} / {}", args.mongodb_uri, args.mongodb_db);
    info!("Similarity provider: {}", args.providers.similarity_provider);
    info!("Scoring workers: {}", args.scoring_workers);
    info!("======================================");

    let jwt = match &args.jwt_secret {
        Some(secret) => JwtValidator::new(secret.clone(), JWT_EXPIRY_SECONDS)?,
        None => {
            warn!("Using development JWT secret");
            JwtValidator::new_dev()
        }
    };

    // MongoDB is required in production; dev mode falls back to memory
    let store: Arc<dyn Store> = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => Arc::new(MongoStore::new(&client).await?),
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                Arc::new(MemoryStore::new())
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let providers = ProviderRegistry::from_args(&args.providers)?;
    if providers.kinds().len() < 2 {
        warn!(
            "Only {:?} configured; reasonableness is judged by a single provider",
            providers.kinds()
        );
    }

    let state = Arc::new(AppState::new(args, store, providers, jwt));
    server::run(state).await?;

    info!("IdeaMesh stopped");
    Ok(())
}
