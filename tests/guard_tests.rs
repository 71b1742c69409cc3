use fleet_portal::{
    AccessAttribute, Decision, Guard, MockIdentityProvider, RedirectTarget, RouteEntry,
    RouteTable,
    guard::decide,
    identity::{RoleState, SessionState},
    route_table,
};
use std::{sync::Arc, time::Duration};

// --- Helper Functions ---

const ADMIN_TOKEN: &str = "admin-token";
const MEMBER_TOKEN: &str = "member-token";

fn accounts() -> MockIdentityProvider {
    MockIdentityProvider::new()
        .with_admin(ADMIN_TOKEN)
        .with_member(MEMBER_TOKEN)
}

/// The fleet catalog plus one probe route for every combination of attributes.
fn probe_table() -> RouteTable {
    let mut entries = route_table().unwrap().entries().cloned().collect::<Vec<_>>();
    let attributes = [
        AccessAttribute::OutsiderOnly,
        AccessAttribute::RequiresAuth,
        AccessAttribute::RequiresAdmin,
    ];
    for mask in 0..8usize {
        let mut entry = RouteEntry::new(&format!("/probe/{mask}"), &format!("probe-{mask}"), "ProbeView");
        for (bit, attribute) in attributes.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                entry = entry.with(*attribute);
            }
        }
        entries.push(entry);
    }
    RouteTable::new(entries).unwrap()
}

fn guard_with(provider: Arc<MockIdentityProvider>) -> Guard {
    Guard::new(Arc::new(route_table().unwrap()), provider)
}

// --- Pure Decision Properties ---

#[test]
fn test_outsider_only_with_session_goes_to_dashboard() {
    let table = probe_table();
    for entry in table.entries().filter(|e| e.has(AccessAttribute::OutsiderOnly)) {
        for role in [RoleState::member(), RoleState::admin()] {
            assert_eq!(
                decide(Some(entry), SessionState::authenticated(), role),
                Decision::Redirect(RedirectTarget::Dashboard),
                "route {}",
                entry.name
            );
        }
    }
}

#[test]
fn test_requires_auth_without_session_goes_to_login() {
    let table = probe_table();
    for entry in table
        .entries()
        .filter(|e| e.has(AccessAttribute::RequiresAuth) && !e.has(AccessAttribute::OutsiderOnly))
    {
        for role in [RoleState::member(), RoleState::admin()] {
            assert_eq!(
                decide(Some(entry), SessionState::anonymous(), role),
                Decision::Redirect(RedirectTarget::Login),
                "route {}",
                entry.name
            );
        }
    }
}

#[test]
fn test_requires_admin_with_member_session_is_forbidden() {
    let table = probe_table();
    for entry in table
        .entries()
        .filter(|e| e.has(AccessAttribute::RequiresAdmin) && !e.has(AccessAttribute::OutsiderOnly))
    {
        assert_eq!(
            decide(Some(entry), SessionState::authenticated(), RoleState::member()),
            Decision::Redirect(RedirectTarget::Forbidden),
            "route {}",
            entry.name
        );
    }
}

#[test]
fn test_requires_admin_with_admin_session_proceeds() {
    let table = probe_table();
    for entry in table
        .entries()
        .filter(|e| e.has(AccessAttribute::RequiresAdmin) && !e.has(AccessAttribute::OutsiderOnly))
    {
        assert_eq!(
            decide(Some(entry), SessionState::authenticated(), RoleState::admin()),
            Decision::Proceed,
            "route {}",
            entry.name
        );
    }
}

#[test]
fn test_unmatched_route_is_not_found_for_any_session() {
    for session in [SessionState::anonymous(), SessionState::authenticated()] {
        for role in [RoleState::member(), RoleState::admin()] {
            assert_eq!(
                decide(None, session, role),
                Decision::Redirect(RedirectTarget::NotFound)
            );
        }
    }
}

#[test]
fn test_admin_only_without_auth_flag_still_needs_session_to_be_forbidden() {
    let entry = RouteEntry::new("/reports", "reports", "ReportsView")
        .with(AccessAttribute::RequiresAdmin);
    assert_eq!(
        decide(Some(&entry), SessionState::anonymous(), RoleState::member()),
        Decision::Proceed
    );
}

// --- Guard Scenarios (Mock Identity Provider) ---

#[tokio::test]
async fn test_dashboard_anonymous_redirects_to_login_not_forbidden() {
    let provider = Arc::new(accounts());
    let guard = guard_with(provider.clone());

    let navigation = guard.check("/dashboard", None).await;

    assert_eq!(navigation.decision, Decision::Redirect(RedirectTarget::Login));
    assert_eq!(provider.session_calls(), 1);
    // The admin rule is unreachable for an anonymous session.
    assert_eq!(provider.role_calls(), 0);
}

#[tokio::test]
async fn test_login_as_admin_redirects_to_dashboard() {
    let provider = Arc::new(accounts());
    let guard = guard_with(provider.clone());

    let navigation = guard.check("/login", Some(ADMIN_TOKEN)).await;

    assert_eq!(
        navigation.decision,
        Decision::Redirect(RedirectTarget::Dashboard)
    );
    assert_eq!(provider.role_calls(), 0);
}

#[tokio::test]
async fn test_member_on_admin_view_is_forbidden() {
    let provider = Arc::new(accounts());
    let guard = guard_with(provider.clone());

    let navigation = guard.check("/drivers/42", Some(MEMBER_TOKEN)).await;

    assert_eq!(
        navigation.decision,
        Decision::Redirect(RedirectTarget::Forbidden)
    );
    assert_eq!(provider.session_calls(), 1);
    assert_eq!(provider.role_calls(), 1);
}

#[tokio::test]
async fn test_admin_on_admin_view_proceeds_with_params() {
    let guard = guard_with(Arc::new(accounts()));

    let navigation = guard.check("/equipment/TRK-7", Some(ADMIN_TOKEN)).await;

    assert_eq!(navigation.decision, Decision::Proceed);
    let matched = navigation.matched.expect("route should resolve");
    assert_eq!(matched.entry.name, "equipment-detail");
    assert_eq!(matched.params.get("id").map(String::as_str), Some("TRK-7"));
}

#[tokio::test]
async fn test_member_on_member_view_never_asks_for_role() {
    let provider = Arc::new(accounts());
    let guard = guard_with(provider.clone());

    let navigation = guard.check("/service-requests/new", Some(MEMBER_TOKEN)).await;

    assert_eq!(navigation.decision, Decision::Proceed);
    assert_eq!(provider.role_calls(), 0);
}

#[tokio::test]
async fn test_unknown_token_is_anonymous() {
    let guard = guard_with(Arc::new(accounts()));

    let navigation = guard.check("/account", Some("stolen-token")).await;

    assert_eq!(navigation.decision, Decision::Redirect(RedirectTarget::Login));
}

#[tokio::test]
async fn test_unresolved_target_skips_identity_queries() {
    let provider = Arc::new(accounts());
    let guard = guard_with(provider.clone());

    let navigation = guard.check("/trucks/9/engine", Some(ADMIN_TOKEN)).await;

    assert_eq!(
        navigation.decision,
        Decision::Redirect(RedirectTarget::NotFound)
    );
    assert!(navigation.matched.is_none());
    assert_eq!(provider.session_calls(), 0);
}

#[tokio::test]
async fn test_navigation_by_route_name() {
    let guard = guard_with(Arc::new(accounts()));

    let navigation = guard.check("drivers", Some(ADMIN_TOKEN)).await;
    assert_eq!(navigation.decision, Decision::Proceed);

    // Named routes with params cannot be resolved without them.
    let navigation = guard.check("driver-detail", Some(ADMIN_TOKEN)).await;
    assert_eq!(
        navigation.decision,
        Decision::Redirect(RedirectTarget::NotFound)
    );
}

// --- Fail-Closed Behavior ---

#[tokio::test]
async fn test_identity_failure_fails_closed_on_every_auth_route() {
    let provider = Arc::new(MockIdentityProvider::new_failing().with_admin(ADMIN_TOKEN));
    let guard = guard_with(provider.clone());

    let protected: Vec<String> = guard
        .table()
        .entries()
        .filter(|e| e.has(AccessAttribute::RequiresAuth))
        .map(|e| e.name.clone())
        .filter(|name| guard.table().resolve(name).is_some())
        .collect();
    assert!(!protected.is_empty());

    for name in protected {
        let navigation = guard.check(&name, Some(ADMIN_TOKEN)).await;
        assert_eq!(
            navigation.decision,
            Decision::Redirect(RedirectTarget::Login),
            "route {name}"
        );
    }
}

#[tokio::test]
async fn test_identity_failure_still_allows_login_page() {
    let guard = guard_with(Arc::new(MockIdentityProvider::new_failing()));

    let navigation = guard.check("/login", Some(ADMIN_TOKEN)).await;

    assert_eq!(navigation.decision, Decision::Proceed);
}

#[tokio::test]
async fn test_role_lookup_failure_is_forbidden_for_valid_session() {
    let provider = Arc::new(accounts().fail_role_only());
    let guard = guard_with(provider.clone());

    let navigation = guard.check("/dashboard", Some(ADMIN_TOKEN)).await;

    assert_eq!(
        navigation.decision,
        Decision::Redirect(RedirectTarget::Forbidden)
    );
    assert_eq!(provider.session_calls(), 1);
    assert_eq!(provider.role_calls(), 1);
}

#[tokio::test]
async fn test_role_lookup_failure_leaves_member_views_open() {
    let provider = Arc::new(accounts().fail_role_only());
    let guard = guard_with(provider.clone());

    let navigation = guard.check("/account", Some(ADMIN_TOKEN)).await;

    assert_eq!(navigation.decision, Decision::Proceed);
    assert_eq!(provider.role_calls(), 0);
}

#[tokio::test]
async fn test_roleless_user_is_not_admin() {
    let provider = Arc::new(MockIdentityProvider::new().with_roleless("fresh-token"));
    let guard = guard_with(provider.clone());

    let navigation = guard.check("/dashboard", Some("fresh-token")).await;

    assert_eq!(
        navigation.decision,
        Decision::Redirect(RedirectTarget::Forbidden)
    );
    assert_eq!(provider.role_calls(), 1);
}

#[tokio::test]
async fn test_slow_identity_provider_times_out_closed() {
    let provider = Arc::new(accounts().with_latency(Duration::from_millis(500)));
    let guard = guard_with(provider.clone()).with_timeout(Duration::from_millis(20));

    let navigation = guard.check("/dashboard", Some(ADMIN_TOKEN)).await;

    assert_eq!(navigation.decision, Decision::Redirect(RedirectTarget::Login));
    assert_eq!(provider.session_calls(), 1);
}

#[tokio::test]
async fn test_guard_waits_for_slow_identity_within_deadline() {
    let provider = Arc::new(accounts().with_latency(Duration::from_millis(30)));
    let guard = guard_with(provider).with_timeout(Duration::from_secs(2));

    let navigation = guard.check("/dashboard", Some(ADMIN_TOKEN)).await;

    assert_eq!(navigation.decision, Decision::Proceed);
}
