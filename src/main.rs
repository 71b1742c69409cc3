use fleet_portal::{
    AppState,
    auth::JwtIdentityProvider,
    config::{AppConfig, Env, IdentityBackend},
    create_router,
    guard::Guard,
    identity::{IdentityState, SupabaseIdentityProvider},
    routes,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, builds the route table and the
/// navigation guard, and serves HTTP.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise guard decisions are logged at debug.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fleet_portal=debug,tower_http=info,axum=trace".into());

    // 3. Pretty logs locally, JSON for log aggregation in production.
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

    // 4. Route Table
    // Built once and frozen; an inconsistent catalog is a programming error.
    let table = Arc::new(routes::route_table().expect("FATAL: route table is inconsistent"));
    tracing::info!(routes = table.len(), "Route table loaded.");

    // 5. Identity Provider
    let identity: IdentityState = match config.identity_backend {
        IdentityBackend::Supabase => Arc::new(SupabaseIdentityProvider::new(
            &config.supabase_url,
            &config.supabase_anon_key,
        )),
        IdentityBackend::Jwt => Arc::new(JwtIdentityProvider::new(&config.jwt_secret)),
    };
    tracing::info!(
        backend = ?config.identity_backend,
        timeout_ms = config.identity_timeout.as_millis() as u64,
        "Identity provider ready."
    );

    // 6. Unified State Assembly
    let guard = Arc::new(Guard::new(table, identity).with_timeout(config.identity_timeout));
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { guard });

    // 7. Server Startup
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: could not bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly");
}
