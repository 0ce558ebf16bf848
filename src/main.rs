use std::{sync::Arc, time::Duration};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use werecooked::{
    aggregate::FeedSettings,
    api::{create_router, AppState},
    auth::TokenIssuer,
    client::MlClient,
    config::Config,
    db::{self, Cache, MemoryStore, PgStore, Seed, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("werecooked=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Using PostgreSQL store");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(path) = &config.seed_file {
        let seed = Seed::from_file(path)?;
        seed.apply(store.as_ref()).await?;
    }

    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => {
            let client = db::create_redis_client(url)?;
            let (cache, writer) = Cache::new(client).await;
            (Some(cache), Some(writer))
        }
        None => {
            tracing::info!("REDIS_URL not set, caching disabled");
            (None, None)
        }
    };

    let tokens = TokenIssuer::new(&config.jwt_secret, Duration::from_secs(config.jwt_ttl_secs));
    let client_config = config.client_config();
    let mut state = AppState::new(store, cache, tokens)
        .with_feed_settings(FeedSettings::from(&client_config));

    if config.ml_service_url.is_some() {
        tracing::info!(url = %client_config.ml_service_url, "ML recommendations enabled");
        state = state.with_recommender(Arc::new(MlClient::from_config(&client_config)));
    } else {
        tracing::warn!("ML_SERVICE_URL not set, home feed will use guest lists only");
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
