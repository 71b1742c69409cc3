use super::RouteEntry;

/// Public Route Catalog
///
/// Views reachable without a session, plus the two error pages the guard redirects to.
///
/// Access Control:
/// The sign-in views are `outsider_only`: a visitor who already holds a session is
/// sent to the dashboard instead of seeing the login form again. The `forbidden`
/// page only makes sense for a signed-in user, so it requires a session; the
/// `not-found` page carries no attribute at all so that it can never redirect.
pub fn public_routes() -> Vec<RouteEntry> {
    vec![
        // GET /
        // The landing page is the login form.
        RouteEntry::new("/", "home", "LoginView").outsider_only(),
        // GET /login
        RouteEntry::new("/login", "login", "LoginView").outsider_only(),
        // GET /register
        // Self-service account creation, backed by the identity service sign-up flow.
        RouteEntry::new("/register", "register", "RegisterView").outsider_only(),
        // GET /forbidden
        // Landing page for signed-in users without the admin role.
        RouteEntry::new("/forbidden", "forbidden", "ForbiddenView").requires_auth(),
        // GET /not-found
        RouteEntry::new("/not-found", "not-found", "NotFoundView"),
    ]
}
