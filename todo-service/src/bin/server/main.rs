use std::sync::Arc;

use auth::Authenticator;
use auth::HashCost;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use todo_service::config::Config;
use todo_service::domain::account::service::AccountService;
use todo_service::inbound::http::router::create_router;
use todo_service::outbound::repositories::InMemoryAccountRepository;
use todo_service::outbound::repositories::PostgresAccountRepository;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "todo-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        token_validity_hours = config.jwt.expiration_hours,
        hash_memory_kib = config.hashing.memory_kib,
        hash_iterations = config.hashing.iterations,
        database = config.database.is_some(),
        "Configuration loaded"
    );

    let authenticator = Arc::new(Authenticator::new(
        config.jwt.secret.as_bytes(),
        HashCost::from(&config.hashing),
        config.jwt.validity()?,
    )?);

    let http_application: Router = match &config.database {
        Some(database) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database.url)
                .await?;
            tracing::info!(
                max_connections = 5,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let account_repository = Arc::new(PostgresAccountRepository::new(pg_pool));
            let account_service = Arc::new(AccountService::new(
                account_repository,
                Arc::clone(&authenticator),
            ));
            create_router(account_service, authenticator)
        }
        None => {
            tracing::warn!("No database configured, accounts are kept in memory");

            let account_repository = Arc::new(InMemoryAccountRepository::new());
            let account_service = Arc::new(AccountService::new(
                account_repository,
                Arc::clone(&authenticator),
            ));
            create_router(account_service, authenticator)
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");

    Ok(())
}
