use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    error::IdentityError,
    identity::{IdentityState, RoleState, SessionState},
    routes::{AccessAttribute, RouteEntry, RouteMatch, RouteTable},
};

/// Default deadline for a single identity query.
pub const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_secs(5);

/// RedirectTarget
///
/// The closed set of destinations the guard can send a navigation to. The
/// serialized names are the route names the front end navigates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum RedirectTarget {
    Dashboard,
    Login,
    Forbidden,
    NotFound,
}

impl RedirectTarget {
    pub const ALL: [RedirectTarget; 4] = [
        RedirectTarget::Dashboard,
        RedirectTarget::Login,
        RedirectTarget::Forbidden,
        RedirectTarget::NotFound,
    ];

    pub fn route_name(self) -> &'static str {
        match self {
            RedirectTarget::Dashboard => "dashboard",
            RedirectTarget::Login => "login",
            RedirectTarget::Forbidden => "forbidden",
            RedirectTarget::NotFound => "not-found",
        }
    }
}

/// Decision
///
/// The verdict for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Redirect(RedirectTarget),
}

/// The facts a rule is evaluated against.
struct Facts<'a> {
    target: Option<&'a RouteEntry>,
    session: SessionState,
    role: RoleState,
}

impl Facts<'_> {
    fn target_has(&self, attribute: AccessAttribute) -> bool {
        self.target.is_some_and(|entry| entry.has(attribute))
    }
}

struct Rule {
    name: &'static str,
    applies: fn(&Facts<'_>) -> bool,
    redirect: RedirectTarget,
}

fn unmatched_route(facts: &Facts<'_>) -> bool {
    facts.target.is_none()
}

fn outsider_with_session(facts: &Facts<'_>) -> bool {
    facts.target_has(AccessAttribute::OutsiderOnly) && facts.session.is_authenticated
}

fn auth_without_session(facts: &Facts<'_>) -> bool {
    facts.target_has(AccessAttribute::RequiresAuth) && !facts.session.is_authenticated
}

fn admin_without_role(facts: &Facts<'_>) -> bool {
    facts.target_has(AccessAttribute::RequiresAdmin)
        && facts.session.is_authenticated
        && !facts.role.is_admin
}

/// Evaluated top to bottom; the first rule that applies decides. Order is part of
/// the contract: an anonymous visitor on an admin view must hit the login rule
/// before the admin rule.
const RULES: [Rule; 4] = [
    Rule {
        name: "unmatched-route",
        applies: unmatched_route,
        redirect: RedirectTarget::NotFound,
    },
    Rule {
        name: "outsider-only",
        applies: outsider_with_session,
        redirect: RedirectTarget::Dashboard,
    },
    Rule {
        name: "requires-auth",
        applies: auth_without_session,
        redirect: RedirectTarget::Login,
    },
    Rule {
        name: "requires-admin",
        applies: admin_without_role,
        redirect: RedirectTarget::Forbidden,
    },
];

/// decide
///
/// Pure decision function. `target` is `None` when the navigation did not
/// resolve to any route.
pub fn decide(target: Option<&RouteEntry>, session: SessionState, role: RoleState) -> Decision {
    let facts = Facts {
        target,
        session,
        role,
    };

    RULES
        .iter()
        .find(|rule| (rule.applies)(&facts))
        .map_or(Decision::Proceed, |rule| {
            tracing::trace!(rule = rule.name, "guard rule matched");
            Decision::Redirect(rule.redirect)
        })
}

/// role_reachable
///
/// Whether the admin rule could still decide the outcome given the session, i.e.
/// whether the role is worth asking for.
fn role_reachable(entry: &RouteEntry, session: SessionState) -> bool {
    entry.has(AccessAttribute::RequiresAdmin)
        && session.is_authenticated
        && !entry.has(AccessAttribute::OutsiderOnly)
}

/// Navigation
///
/// The result of guarding one navigation: what the target resolved to, and the verdict.
#[derive(Debug, Clone)]
pub struct Navigation<'t> {
    pub target: String,
    pub matched: Option<RouteMatch<'t>>,
    pub decision: Decision,
}

/// Guard
///
/// The navigation guard. Owns the immutable route table and the injected identity
/// provider; holds no other state, so one instance serves every request.
pub struct Guard {
    table: Arc<RouteTable>,
    identity: IdentityState,
    timeout: Duration,
}

impl Guard {
    pub fn new(table: Arc<RouteTable>, identity: IdentityState) -> Self {
        Self {
            table,
            identity,
            timeout: DEFAULT_IDENTITY_TIMEOUT,
        }
    }

    /// Bounds every identity query; a query that overruns fails closed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// check
    ///
    /// Guards a navigation to `target` (a path or a route name) for the holder of
    /// `access_token`.
    ///
    /// An unresolved target is decided without consulting the provider. Otherwise
    /// the session is queried exactly once, and the role only when the admin rule
    /// is reachable. Provider failures and timeouts are logged and treated as
    /// anonymous / non-admin. This never fails.
    pub async fn check(&self, target: &str, access_token: Option<&str>) -> Navigation<'_> {
        let Some(matched) = self.table.resolve(target) else {
            tracing::debug!(destination = target, "navigation target did not resolve");
            return Navigation {
                target: target.to_string(),
                matched: None,
                decision: decide(None, SessionState::anonymous(), RoleState::member()),
            };
        };

        let session = self
            .fail_closed("session", self.identity.get_session(access_token))
            .await
            .unwrap_or_else(SessionState::anonymous);

        let role = if role_reachable(matched.entry, session) {
            self.fail_closed("role", self.identity.get_user_role(access_token))
                .await
                .flatten()
                .unwrap_or_else(RoleState::member)
        } else {
            RoleState::member()
        };

        let decision = decide(Some(matched.entry), session, role);
        tracing::debug!(
            destination = target,
            route = %matched.entry.name,
            authenticated = session.is_authenticated,
            admin = role.is_admin,
            ?decision,
            "navigation guarded"
        );

        Navigation {
            target: target.to_string(),
            matched: Some(matched),
            decision,
        }
    }

    /// Awaits an identity query under the guard's deadline, logging and swallowing
    /// any failure.
    async fn fail_closed<T>(
        &self,
        query: &'static str,
        request: impl Future<Output = Result<T, IdentityError>>,
    ) -> Option<T> {
        let outcome = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(IdentityError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(query, error = %e, "identity query failed, assuming least privilege");
                None
            }
        }
    }
}
