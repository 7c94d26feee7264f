use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use once_cell::sync::Lazy;
use secrecy::ExposeSecret;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;
use std::sync::Arc;
use uuid::Uuid;

use matchday_backend::config::jwt::JwtSettings;
use matchday_backend::config::settings::{get_config, DatabaseSettings};
use matchday_backend::league::LeagueService;
use matchday_backend::middleware::auth::Claims;
use matchday_backend::run;
use matchday_backend::services::LeagueEventPublisher;
use matchday_backend::store::{LeagueStore, MemoryLeagueStore, PgLeagueStore};
use matchday_backend::telemetry::{get_subscriber, init_subscriber};

pub const TEST_JWT_SECRET: &str = "matchday-test-secret";

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub store: Arc<dyn LeagueStore>,
}

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            token: mint_token(&id.to_string(), TEST_JWT_SECRET),
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_store(Arc::new(MemoryLeagueStore::new())).await
}

pub async fn spawn_app_with_store(store: Arc<dyn LeagueStore>) -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    // Get port assigned by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let server = run(
        listener,
        store.clone(),
        JwtSettings::new(TEST_JWT_SECRET.to_string()),
        None,
    )
    .expect("Failed to bind address");
    // Launch the server as a background task
    let _ = tokio::spawn(server);

    TestApp { address, store }
}

/// A service over a fresh in-memory store, for tests that skip HTTP.
pub fn test_service() -> Arc<LeagueService> {
    Lazy::force(&TRACING);
    Arc::new(LeagueService::new(
        Arc::new(MemoryLeagueStore::new()),
        LeagueEventPublisher::disabled(),
    ))
}

pub fn service_over(store: Arc<dyn LeagueStore>) -> Arc<LeagueService> {
    Lazy::force(&TRACING);
    Arc::new(LeagueService::new(store, LeagueEventPublisher::disabled()))
}

/// A Postgres store over a freshly created and migrated database.
pub async fn pg_store() -> (PgLeagueStore, PgPool) {
    Lazy::force(&TRACING);
    let mut configuration = get_config().expect("Failed to read configuration.");
    configuration.database.db_name = Uuid::new_v4().to_string();
    configuration.database.db_url = None;
    let connection_pool = configure_db(&configuration.database).await;
    (PgLeagueStore::new(connection_pool.clone()), connection_pool)
}

pub async fn configure_db(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.db_name).as_str())
        .await
        .expect("Failed to create database.");

    // Migrate database
    let connection_pool = PgPool::connect(config.connection_string().expose_secret())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}

/// Sign an HS256 token the way the auth provider does.
pub fn mint_token(subject: &str, secret: &str) -> String {
    let claims = Claims {
        sub: subject.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        email: None,
        role: Some("authenticated".to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign test token")
}
