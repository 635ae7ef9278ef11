use std::env;

const LOCAL_TOKEN_SECRET: &str = "super-secure-test-secret-value-local";
const DEFAULT_DB_NAME: &str = "scholarship-session";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded
/// and pulled into handlers and extractors via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local identity bypass and log format.
    pub env: Env,
    // MongoDB connection string.
    pub db_url: String,
    // Database holding the users, scholarships, applyScholarships and reviews collections.
    pub db_name: String,
    // Secret used to sign and verify access tokens (HS256).
    pub jwt_secret: String,
    // Lifetime of an issued access token.
    pub token_ttl_secs: u64,
    // Stripe secret key, sent as a bearer credential.
    pub stripe_secret_key: String,
    // Stripe REST base URL. Overridden in tests to point at a local stand-in.
    pub stripe_api_base: String,
    // TCP port the HTTP server binds on 0.0.0.0.
    pub port: u16,
}

/// Env
///
/// Defines the runtime context, used to switch between development utilities
/// (identity bypass, pretty logs) and production behaviour.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for test state setup, so tests never need
    /// environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: "mongodb://localhost:27017".to_string(),
            db_name: DEFAULT_DB_NAME.to_string(),
            jwt_secret: LOCAL_TOKEN_SECRET.to_string(),
            token_ttl_secs: 3600,
            stripe_secret_key: "sk_test_local".to_string(),
            stripe_api_base: DEFAULT_STRIPE_API_BASE.to_string(),
            port: 5000,
        }
    }
}

/// Builds the connection string from its parts when MONGODB_URI is not given.
fn mongodb_uri_from_parts() -> Option<String> {
    let user = env::var("DB_USER").ok()?;
    let pass = env::var("DB_PASS").ok()?;
    let host = env::var("DB_HOST").ok()?;
    Some(format!(
        "mongodb+srv://{user}:{pass}@{host}/?retryWrites=true&w=majority"
    ))
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics in production when the database location or a secret is missing,
    /// and in any environment when a numeric variable does not parse.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let db_url = env::var("MONGODB_URI").ok().or_else(mongodb_uri_from_parts);
        let jwt_secret = env::var("ACCESS_TOKEN_SECRET").ok();
        let stripe_secret_key = env::var("STRIPE_SECRET_KEY").ok();

        let (db_url, jwt_secret, stripe_secret_key) = match env {
            Env::Production => (
                db_url.expect("FATAL: MONGODB_URI (or DB_USER/DB_PASS/DB_HOST) required in prod"),
                jwt_secret.expect("FATAL: ACCESS_TOKEN_SECRET must be set in production."),
                stripe_secret_key.expect("FATAL: STRIPE_SECRET_KEY must be set in production."),
            ),
            Env::Local => (
                db_url.unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
                jwt_secret.unwrap_or_else(|| LOCAL_TOKEN_SECRET.to_string()),
                stripe_secret_key.unwrap_or_else(|| "sk_test_local".to_string()),
            ),
        };

        Self {
            env,
            db_url,
            db_name: env::var("DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.to_string()),
            jwt_secret,
            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .map(|v| v.parse().expect("FATAL: TOKEN_TTL_SECS must be a number of seconds"))
                .unwrap_or(3600),
            stripe_secret_key,
            stripe_api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_STRIPE_API_BASE.to_string()),
            port: env::var("PORT")
                .map(|v| v.parse().expect("FATAL: PORT must be a valid port number"))
                .unwrap_or(5000),
        }
    }
}
