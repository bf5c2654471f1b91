use rusty_library_lending::{
    adapters::{
        fs::FsCoverStorage,
        memory::ViewRegistry,
        postgres::{
            PostgresCatalogRepository, PostgresLoanRepository, PostgresUserRepository,
            PostgresWishlistRepository,
        },
    },
    api::{AppState, AuthSettings, create_router},
    application::ServiceDependencies,
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // .env があれば読み込む（なくてもよい）
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting library lending server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    // Initialize adapters
    let views = Arc::new(ViewRegistry::new());
    let service_deps = ServiceDependencies {
        loans: Arc::new(PostgresLoanRepository::new(pool.clone())),
        wishlists: Arc::new(PostgresWishlistRepository::new(pool.clone())),
        catalog: Arc::new(PostgresCatalogRepository::new(pool.clone())),
        users: Arc::new(PostgresUserRepository::new(pool)),
        covers: Arc::new(FsCoverStorage::new(&config.uploads.dir)),
        views: views.clone(),
        settings: config.service_settings(),
    };

    tracing::info!(
        loan_period_secs = config.loans.loan_period_secs,
        uploads = %config.uploads.dir,
        "Services configured"
    );

    // Create application state
    let app_state = Arc::new(AppState {
        service_deps,
        auth: AuthSettings {
            jwt_secret: config.auth.jwt_secret.clone(),
            token_ttl_hours: config.auth.token_ttl_hours,
        },
        views,
    });

    // Create router
    let app = create_router(app_state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
