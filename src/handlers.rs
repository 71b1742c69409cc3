use crate::{
    GuardState,
    auth::AccessToken,
    guard::Decision,
    models::{self, MatchedRoute, NavigateRequest, NavigateResponse, RouteSummary},
};
use axum::{
    Json,
    extract::{OriginalUri, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

// --- Handlers ---

/// list_routes
///
/// [Public Route] Returns the full route table in declaration order, access
/// attributes included, so the front end can mirror it.
#[utoipa::path(
    get,
    path = "/api/routes",
    responses((status = 200, description = "Route table", body = [RouteSummary]))
)]
pub async fn list_routes(State(guard): State<GuardState>) -> Json<Vec<RouteSummary>> {
    let routes = guard
        .table()
        .entries()
        .map(RouteSummary::from)
        .collect();
    Json(routes)
}

/// navigate
///
/// [Public Route] Runs the navigation guard for `target` on behalf of the bearer
/// of the request's access token (anonymous when none is sent).
///
/// Always answers 200: redirects are part of the payload, not HTTP redirects, so a
/// single-page client can apply them itself.
#[utoipa::path(
    post,
    path = "/api/navigate",
    request_body = NavigateRequest,
    responses((status = 200, description = "Guard decision", body = NavigateResponse))
)]
pub async fn navigate(
    token: AccessToken,
    State(guard): State<GuardState>,
    Json(payload): Json<NavigateRequest>,
) -> Json<NavigateResponse> {
    let navigation = guard.check(&payload.target, token.as_deref()).await;
    Json(NavigateResponse::from_navigation(&navigation, guard.table()))
}

/// guarded_view
///
/// Fallback for every other path: a direct page load. The guard runs exactly as it
/// would for an in-app navigation.
///
/// *Outcomes*: `200` with the matched view descriptor on proceed, `303 See Other`
/// to the destination's path on redirect (unknown paths land on `/not-found`).
/// Only `GET` and `HEAD` are navigations; anything else is `405`.
pub async fn guarded_view(
    method: Method,
    OriginalUri(uri): OriginalUri,
    token: AccessToken,
    State(guard): State<GuardState>,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let target = uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or_else(|| uri.path());
    let navigation = guard.check(target, token.as_deref()).await;

    match (navigation.decision, navigation.matched.as_ref()) {
        (Decision::Proceed, Some(matched)) => Json(MatchedRoute::from(matched)).into_response(),
        (Decision::Redirect(to), _) => {
            Redirect::to(&models::redirect_location(guard.table(), to)).into_response()
        }
        // Proceed implies a resolved target.
        (Decision::Proceed, None) => StatusCode::NOT_FOUND.into_response(),
    }
}
