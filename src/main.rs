use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lode::{create_router, AppState, Config, LogSink};
use lode_core::Checkpoint;
use lode_db::{create_schema, init_checkpoint_database, init_pool, RedbCheckpointStore, SqliteRepository};
use lode_traversal::{Harvester, TraversalManager};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: DATABASE_URL (default: sqlite://livelink.db)");
            eprintln!("Optional: LISTEN_ADDR (default: 0.0.0.0:3000)");
            eprintln!("Optional: LODE_CHECKPOINT_PATH (default: ./lode.redb)");
            eprintln!("Optional: LODE_BATCH_SIZE (default: 100)");
            eprintln!("Optional: LODE_POLL_INTERVAL_SECS (default: 30)");
            eprintln!("Optional: LODE_START_DATE (yyyy-MM-dd [HH:mm:ss])");
            eprintln!("Optional: LODE_EXCLUDED_NODE_TYPES, LODE_EXCLUDED_VOLUME_TYPES");
            eprintln!("Optional: LODE_EXCLUDED_LOCATION_NODES, LODE_INCLUDED_LOCATION_NODES");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Lode connector {}", config.connector_name);
    tracing::info!("Listen address: {}", config.listen_addr);
    tracing::info!("Repository: {}", config.database_url);
    tracing::info!("Checkpoints: {}", config.checkpoint_path.display());

    // Connect to the repository
    let pool = match init_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Database connection error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = create_schema(&pool).await {
        eprintln!("Schema error: {}", e);
        std::process::exit(1);
    }

    // Open checkpoint storage
    let checkpoint_db = match init_checkpoint_database(&config.checkpoint_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Checkpoint database error: {}", e);
            std::process::exit(1);
        }
    };
    let checkpoint_store = Arc::new(RedbCheckpointStore::new(checkpoint_db));

    let repository = Arc::new(SqliteRepository::new(pool));
    let dialect = *repository.dialect();

    let manager = TraversalManager::new(
        repository,
        &config.filters,
        Checkpoint::initial(config.start_date),
        config.batch_size,
    );
    let mut harvester = Harvester::new(
        config.connector_name.clone(),
        manager,
        checkpoint_store.clone(),
        Arc::new(LogSink),
    );

    if let Err(e) = harvester.resume() {
        eprintln!("Cannot resume traversal: {}", e);
        eprintln!("Clear the checkpoint in {} to start over", config.checkpoint_path.display());
        std::process::exit(1);
    }

    // Start harvesting
    let interval = Duration::from_secs(config.poll_interval_secs);
    tokio::spawn(async move {
        if let Err(e) = harvester.run(interval).await {
            tracing::error!("Traversal stopped: {}", e);
        }
    });

    // Create app state
    let state = AppState::new(
        &config.connector_name,
        config.filters.clone(),
        dialect,
        checkpoint_store,
    );

    // Build router
    let app = create_router(state);

    // Start server
    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server running at http://{}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
