use super::RouteEntry;

/// Authenticated Route Catalog
///
/// Views open to any signed-in user, admin or not. The guard sends anonymous
/// visitors to the login page.
pub fn authenticated_routes() -> Vec<RouteEntry> {
    vec![
        // GET /account
        // The signed-in user's own profile.
        RouteEntry::new("/account", "account", "AccountView").requires_auth(),
        // GET /service-requests/new
        // Drivers file maintenance requests for their assigned equipment. Declared as
        // a static path so it outranks `/service-requests/:id`.
        RouteEntry::new(
            "/service-requests/new",
            "service-request-create",
            "ServiceRequestFormView",
        )
        .requires_auth(),
    ]
}
