//! aides-territoires - territory-scoped aide search service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use aides_territoires::{
    config::Args,
    db::MongoClient,
    geo::GeoApiClient,
    logging,
    search::TerritoryAggregator,
    server::{self, AppState},
    store::{AideStore, InMemoryAideStore, MongoAideStore},
};

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
    info!("  aides-territoires");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} / {}.{}", args.mongodb_uri, args.mongodb_db, args.aides_collection);
    info!(
        "Geo API: {} (timeout {}ms, {} retries, cache {}s)",
        args.geo_api_url, args.resolver_timeout_ms, args.resolver_retries, args.resolver_cache_ttl_secs
    );
    info!("Store timeout: {}ms", args.store_timeout_ms);
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let store: Arc<dyn AideStore> = match connect_store(&args).await {
        Ok(store) => {
            info!("MongoDB connected successfully");
            Arc::new(store)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, continuing with an empty in-memory store): {}", e);
                Arc::new(InMemoryAideStore::new())
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let geo = Arc::new(GeoApiClient::with_config(args.geo_config()));
    let aggregator = TerritoryAggregator::new(store, geo, args.aggregator_config());
    let state = Arc::new(AppState::new(args, aggregator));

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn connect_store(args: &Args) -> aides_territoires::Result<MongoAideStore> {
    let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    MongoAideStore::new(&client, &args.aides_collection).await
}
