use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    guard::{Decision, Navigation, RedirectTarget},
    routes::{AccessAttribute, RouteEntry, RouteMatch, RouteTable},
};

// --- Response Schemas ---

/// RouteSummary
///
/// Public description of one route table entry, as served by `GET /api/routes`.
/// The front end builds its own router from this list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteSummary {
    pub name: String,
    pub path: String,
    // The view component rendered for this route.
    pub view: String,
    pub access: Vec<AccessAttribute>,
    // Names of the `:param` segments, in path order.
    pub params: Vec<String>,
}

impl From<&RouteEntry> for RouteSummary {
    fn from(entry: &RouteEntry) -> Self {
        Self {
            name: entry.name.clone(),
            path: entry.path.clone(),
            view: entry.view.clone(),
            access: entry.access.iter().copied().collect(),
            params: entry.dynamic_params.clone(),
        }
    }
}

/// MatchedRoute
///
/// A resolved navigation target: the route and the values captured for its params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MatchedRoute {
    pub name: String,
    pub view: String,
    pub params: BTreeMap<String, String>,
}

impl From<&RouteMatch<'_>> for MatchedRoute {
    fn from(matched: &RouteMatch<'_>) -> Self {
        Self {
            name: matched.entry.name.clone(),
            view: matched.entry.view.clone(),
            params: matched.params.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DecisionKind {
    Proceed,
    Redirect,
}

/// NavigateResponse
///
/// The guard's verdict for `POST /api/navigate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NavigateResponse {
    pub decision: DecisionKind,
    /// Set only for redirects.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub redirect_to: Option<RedirectTarget>,
    /// Where the client should end up: the requested route's path on proceed, the
    /// redirect destination's path otherwise.
    pub location: String,
    /// The resolved target, absent when nothing matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub route: Option<MatchedRoute>,
}

impl NavigateResponse {
    pub fn from_navigation(navigation: &Navigation<'_>, table: &RouteTable) -> Self {
        let route = navigation.matched.as_ref().map(MatchedRoute::from);

        match navigation.decision {
            Decision::Proceed => Self {
                decision: DecisionKind::Proceed,
                redirect_to: None,
                location: navigation
                    .matched
                    .as_ref()
                    .and_then(|matched| table.href(&matched.entry.name, &matched.params))
                    .unwrap_or_else(|| navigation.target.clone()),
                route,
            },
            Decision::Redirect(to) => Self {
                decision: DecisionKind::Redirect,
                redirect_to: Some(to),
                location: redirect_location(table, to),
                route,
            },
        }
    }
}

/// Path of the route a redirect lands on.
pub fn redirect_location(table: &RouteTable, to: RedirectTarget) -> String {
    table
        .href(to.route_name(), &BTreeMap::new())
        .unwrap_or_else(|| "/".to_string())
}

// --- Request Payloads (Input Schemas) ---

/// NavigateRequest
///
/// Input payload for `POST /api/navigate`. `target` is either a path (leading `/`)
/// or a route name.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigateRequest {
    pub target: String,
}
