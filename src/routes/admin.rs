use super::RouteEntry;

/// Admin Route Catalog
///
/// The fleet management back office. Every entry is declared with `requires_admin`,
/// which also tags it `requires_auth`: anonymous visitors are sent to the login
/// page first, and only signed-in users without the admin role see `forbidden`.
pub fn admin_routes() -> Vec<RouteEntry> {
    vec![
        // GET /dashboard
        // Fleet overview. Also the destination for signed-in users who open the login page.
        RouteEntry::new("/dashboard", "dashboard", "DashboardView").requires_admin(),
        // --- Drivers ---
        RouteEntry::new("/drivers", "drivers", "DriversView").requires_admin(),
        RouteEntry::new("/drivers/:id", "driver-detail", "DriverDetailView").requires_admin(),
        // --- Equipment ---
        RouteEntry::new("/equipment", "equipment", "EquipmentView").requires_admin(),
        RouteEntry::new("/equipment/:id", "equipment-detail", "EquipmentDetailView")
            .requires_admin(),
        // --- Service Requests ---
        RouteEntry::new("/service-requests", "service-requests", "ServiceRequestsView")
            .requires_admin(),
        RouteEntry::new(
            "/service-requests/:id",
            "service-request-detail",
            "ServiceRequestDetailView",
        )
        .requires_admin(),
    ]
}
