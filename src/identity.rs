use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::IdentityError;

/// SessionState
///
/// Point-in-time answer to "does this caller hold a session?". Produced fresh by
/// the identity provider for every navigation and never cached by the guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub is_authenticated: bool,
}

impl SessionState {
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
        }
    }

    pub fn authenticated() -> Self {
        Self {
            is_authenticated: true,
        }
    }
}

/// RoleState
///
/// Point-in-time role snapshot. The default is the least-privileged role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleState {
    pub is_admin: bool,
}

impl RoleState {
    pub fn member() -> Self {
        Self { is_admin: false }
    }

    pub fn admin() -> Self {
        Self { is_admin: true }
    }
}

/// UserMetadata
///
/// The subset of the identity service's `user_metadata` object the portal reads.
/// Shared by the REST backend (response body) and the JWT backend (token claim).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMetadata {
    pub is_admin: bool,
}

// 1. IdentityProvider Contract
/// IdentityProvider
///
/// The two-operation capability the navigation guard depends on. Any backend that
/// can answer these questions is interchangeable: the Supabase REST API, local JWT
/// verification, or the in-memory mock used by the test suite.
///
/// Both operations receive the caller's bearer access token, if one was presented.
/// A missing or rejected token is an answer ("no session"), not an error; `Err` is
/// reserved for the provider being unable to answer at all.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Reports whether `access_token` belongs to a live session.
    async fn get_session(&self, access_token: Option<&str>)
    -> Result<SessionState, IdentityError>;

    /// Reports the role attached to `access_token`, or `None` when there is no
    /// user to attach a role to.
    async fn get_user_role(
        &self,
        access_token: Option<&str>,
    ) -> Result<Option<RoleState>, IdentityError>;
}

/// IdentityState
///
/// The concrete type used to share the identity provider across the application state.
pub type IdentityState = Arc<dyn IdentityProvider>;

// 2. The Real Implementation (Supabase Auth REST API)
#[derive(Deserialize)]
struct SupabaseUser {
    #[serde(default)]
    user_metadata: UserMetadata,
}

/// SupabaseIdentityProvider
///
/// Asks the Supabase Auth server who the token belongs to (`GET /auth/v1/user`).
/// The project's anon key is sent as `apikey`, the user's access token as the bearer.
#[derive(Clone)]
pub struct SupabaseIdentityProvider {
    client: reqwest::Client,
    user_endpoint: String,
    anon_key: String,
}

impl SupabaseIdentityProvider {
    pub fn new(project_url: &str, anon_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_endpoint: format!("{}/auth/v1/user", project_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
        }
    }

    /// fetch_user
    ///
    /// `Ok(None)` when there is no token or the auth server rejects it (401/403).
    /// Any other non-success status is an upstream failure.
    async fn fetch_user(
        &self,
        access_token: Option<&str>,
    ) -> Result<Option<SupabaseUser>, IdentityError> {
        let Some(token) = access_token else {
            return Ok(None);
        };

        let response = self
            .client
            .get(&self.user_endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<SupabaseUser>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(IdentityError::Upstream(status.as_u16())),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn get_session(
        &self,
        access_token: Option<&str>,
    ) -> Result<SessionState, IdentityError> {
        let user = self.fetch_user(access_token).await?;
        Ok(SessionState {
            is_authenticated: user.is_some(),
        })
    }

    async fn get_user_role(
        &self,
        access_token: Option<&str>,
    ) -> Result<Option<RoleState>, IdentityError> {
        let user = self.fetch_user(access_token).await?;
        Ok(user.map(|user| RoleState {
            is_admin: user.user_metadata.is_admin,
        }))
    }
}

// 3. The Mock Implementation (For Tests)
/// MockIdentityProvider
///
/// In-memory accounts keyed by access token. Counts every query so tests can pin
/// down how often the guard consults the provider, and can simulate outages and
/// slow responses.
#[derive(Default)]
pub struct MockIdentityProvider {
    /// token -> admin flag; `None` models a user without role metadata.
    accounts: HashMap<String, Option<bool>>,
    /// When true, all operations return a simulated failure.
    should_fail: bool,
    /// Fails only role lookups; sessions still resolve.
    fail_role: bool,
    latency: Option<Duration>,
    session_calls: AtomicUsize,
    role_calls: AtomicUsize,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Sessions resolve normally but every role lookup fails.
    pub fn fail_role_only(mut self) -> Self {
        self.fail_role = true;
        self
    }

    pub fn with_member(mut self, token: &str) -> Self {
        self.accounts.insert(token.to_string(), Some(false));
        self
    }

    pub fn with_admin(mut self, token: &str) -> Self {
        self.accounts.insert(token.to_string(), Some(true));
        self
    }

    /// A valid session whose role lookup yields nothing.
    pub fn with_roleless(mut self, token: &str) -> Self {
        self.accounts.insert(token.to_string(), None);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    pub fn role_calls(&self) -> usize {
        self.role_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self, fail: bool) -> Result<(), IdentityError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if fail {
            return Err(IdentityError::Transport(
                "Mock Identity Error: Simulation requested".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn get_session(
        &self,
        access_token: Option<&str>,
    ) -> Result<SessionState, IdentityError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(self.should_fail).await?;

        Ok(SessionState {
            is_authenticated: access_token.is_some_and(|token| self.accounts.contains_key(token)),
        })
    }

    async fn get_user_role(
        &self,
        access_token: Option<&str>,
    ) -> Result<Option<RoleState>, IdentityError> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(self.should_fail || self.fail_role).await?;

        Ok(access_token
            .and_then(|token| self.accounts.get(token))
            .copied()
            .flatten()
            .map(|is_admin| RoleState { is_admin }))
    }
}
