use mongodb::{Client, bson::doc};
use scholarship_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    payment::{PaymentState, StripeGateway},
    repository::{MongoRepository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the MongoDB client and the payment
/// gateway, then serves the API.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast in production)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scholarship_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database (MongoDB)
    let client = Client::with_uri_str(&config.db_url)
        .await
        .expect("FATAL: Invalid MongoDB connection string. Check MONGODB_URI.");

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .expect("FATAL: Failed to reach MongoDB. Check MONGODB_URI.");
    tracing::info!(db = %config.db_name, "Pinged MongoDB deployment");

    let mongo = MongoRepository::new(&client.database(&config.db_name));
    mongo
        .ensure_indexes()
        .await
        .expect("FATAL: Failed to create MongoDB indexes.");
    let repo = Arc::new(mongo) as RepositoryState;

    // 4. Payment Gateway (Stripe)
    let payments = Arc::new(StripeGateway::new(
        &config.stripe_api_base,
        &config.stripe_secret_key,
    )) as PaymentState;

    // 5. Unified State Assembly
    let port = config.port;
    let app_state = AppState {
        repo,
        payments,
        config,
    };

    // 6. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("FATAL: Failed to bind the HTTP port.");

    tracing::info!("Listening on 0.0.0.0:{port}");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{port}/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
