use std::net::TcpListener;
use std::sync::Arc;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use matchday_backend::run;
use matchday_backend::config::settings::{get_config, get_jwt_settings, get_redis_url, StoreBackend};
use matchday_backend::store::{LeagueStore, MemoryLeagueStore, PgLeagueStore};
use matchday_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Panic if we can't read the config
    let config = get_config().expect("Failed to read the config.");

    let subscriber = get_subscriber(
        "matchday-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout
    );
    init_subscriber(subscriber);

    // JWT
    let jwt_settings = get_jwt_settings(&config);
    // Redis is optional, without it change events are not published
    let redis_client = match get_redis_url(&config) {
        Some(url) => match redis::Client::open(url.expose_secret()) {
            Ok(client) => {
                tracing::info!("Redis client created successfully");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::error!("Failed to create Redis client: {}. League events will not be published.", e);
                None
            }
        },
        None => {
            tracing::info!("No Redis configured, league events will not be published");
            None
        }
    };

    let store: Arc<dyn LeagueStore> = match config.application.store {
        StoreBackend::Postgres => {
            // Only try to establish connection when actually used
            let connection_pool = PgPoolOptions::new()
                .max_connections(32)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(1800))
                .connect_lazy(
                    config.database.connection_string().expose_secret()
                )
                .expect("Failed to create Postgres connection pool");
            Arc::new(PgLeagueStore::new(connection_pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory league store, data is lost on restart");
            Arc::new(MemoryLeagueStore::new())
        }
    };

    let address = format!("{}:{}", config.application.host, config.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Listening on {}", address);

    run(
        listener,
        store,
        jwt_settings,
        redis_client,
    )?.await
}
