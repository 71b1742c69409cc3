use std::env;
use std::time::Duration;

use crate::guard::DEFAULT_IDENTITY_TIMEOUT;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and
/// pulled into handlers through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects defaults and the log format.
    pub env: Env,
    // Supabase project URL, base of the Auth REST API.
    pub supabase_url: String,
    // Public anon key sent as `apikey` on every Auth API call.
    pub supabase_anon_key: String,
    // Secret used to verify Supabase-issued access tokens locally.
    pub jwt_secret: String,
    // Which identity provider backs the navigation guard.
    pub identity_backend: IdentityBackend,
    // Deadline for a single identity query before the guard fails closed.
    pub identity_timeout: Duration,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context: local development defaults or production, where
/// every secret must be supplied explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// IdentityBackend
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IdentityBackend {
    /// Ask the Supabase Auth server (`/auth/v1/user`) on every query.
    Supabase,
    /// Verify access tokens locally with the project JWT secret.
    Jwt,
}

const LOCAL_SUPABASE_URL: &str = "http://localhost:54321";
const LOCAL_ANON_KEY: &str = "local-anon-key";
const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking values for test state setup, so tests never need to
    /// touch environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            supabase_url: LOCAL_SUPABASE_URL.to_string(),
            supabase_anon_key: LOCAL_ANON_KEY.to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            identity_backend: IdentityBackend::Jwt,
            identity_timeout: DEFAULT_IDENTITY_TIMEOUT,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics in production when a secret the selected identity backend needs is
    /// missing, and on any unparseable value. The process must not start with a
    /// guard that cannot reach its identity provider.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let identity_backend = match env::var("IDENTITY_BACKEND").as_deref() {
            Ok("supabase") => IdentityBackend::Supabase,
            Ok("jwt") => IdentityBackend::Jwt,
            Ok(other) => panic!("FATAL: IDENTITY_BACKEND must be `supabase` or `jwt`, got `{other}`"),
            Err(_) if env == Env::Production => IdentityBackend::Supabase,
            Err(_) => IdentityBackend::Jwt,
        };

        let identity_timeout = env::var("IDENTITY_TIMEOUT_MS")
            .ok()
            .map(|value| {
                value
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .expect("FATAL: IDENTITY_TIMEOUT_MS must be a whole number of milliseconds")
            })
            .unwrap_or(DEFAULT_IDENTITY_TIMEOUT);

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                supabase_url: env::var("SUPABASE_URL")
                    .unwrap_or_else(|_| LOCAL_SUPABASE_URL.to_string()),
                supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                    .unwrap_or_else(|_| LOCAL_ANON_KEY.to_string()),
                jwt_secret: env::var("SUPABASE_JWT_SECRET")
                    .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                identity_backend,
                identity_timeout,
                bind_addr,
            },
            Env::Production => {
                // The JWT secret is only mandatory when tokens are verified locally.
                let jwt_secret = match identity_backend {
                    IdentityBackend::Jwt => env::var("SUPABASE_JWT_SECRET")
                        .expect("FATAL: SUPABASE_JWT_SECRET must be set in production."),
                    IdentityBackend::Supabase => {
                        env::var("SUPABASE_JWT_SECRET").unwrap_or_default()
                    }
                };

                Self {
                    env: Env::Production,
                    supabase_url: env::var("SUPABASE_URL")
                        .expect("FATAL: SUPABASE_URL required in prod"),
                    supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                        .expect("FATAL: SUPABASE_ANON_KEY required in prod"),
                    jwt_secret,
                    identity_backend,
                    identity_timeout,
                    bind_addr,
                }
            }
        }
    }
}
