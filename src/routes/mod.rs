//! Route Table Module
//!
//! The static, ordered registry of every view in the fleet portal. Each entry is
//! named, path-matched, and tagged with the access attributes the navigation guard
//! evaluates. The catalog is split by access tier so that the protection level of
//! a view is obvious from the file it is declared in.

use std::collections::{BTreeMap, BTreeSet};

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{error::RouteTableError, guard::RedirectTarget};

/// Views for visitors without a session (login, registration) and the error pages.
pub mod public;

/// Views open to any signed-in user.
pub mod authenticated;

/// Views restricted to administrators. Every entry also requires a session.
pub mod admin;

/// AccessAttribute
///
/// The access-control tags a route may carry. Serialized with the same names the
/// front-end router uses in its route `meta`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum AccessAttribute {
    /// Only reachable without a session (login, register).
    OutsiderOnly,
    /// Requires an authenticated session.
    RequiresAuth,
    /// Requires the admin role (checked only for authenticated sessions).
    RequiresAdmin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// RouteEntry
///
/// A named destination. `dynamic_params` is derived from the `:param` segments of
/// `path`, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: String,
    pub name: String,
    pub view: String,
    pub access: BTreeSet<AccessAttribute>,
    pub dynamic_params: Vec<String>,
    segments: Vec<Segment>,
}

impl RouteEntry {
    /// Declares an entry with no access attributes. Path validation is deferred to
    /// `RouteTable::new` so catalogs can be written as plain expressions.
    pub fn new(path: &str, name: &str, view: &str) -> Self {
        let segments: Vec<Segment> = split_path(path)
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => Segment::Param(param.to_string()),
                None => Segment::Static(segment.to_string()),
            })
            .collect();

        let dynamic_params = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) => Some(name.clone()),
                Segment::Static(_) => None,
            })
            .collect();

        Self {
            path: path.to_string(),
            name: name.to_string(),
            view: view.to_string(),
            access: BTreeSet::new(),
            dynamic_params,
            segments,
        }
    }

    pub fn with(mut self, attribute: AccessAttribute) -> Self {
        self.access.insert(attribute);
        self
    }

    pub fn outsider_only(self) -> Self {
        self.with(AccessAttribute::OutsiderOnly)
    }

    pub fn requires_auth(self) -> Self {
        self.with(AccessAttribute::RequiresAuth)
    }

    /// Admin views always sit behind a session as well.
    pub fn requires_admin(self) -> Self {
        self.requires_auth().with(AccessAttribute::RequiresAdmin)
    }

    pub fn has(&self, attribute: AccessAttribute) -> bool {
        self.access.contains(&attribute)
    }

    fn static_segments(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Static(_)))
            .count()
    }

    fn match_segments(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(expected) if expected.as_str() == *part => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }
        Some(params)
    }

    fn validate(&self) -> Result<(), RouteTableError> {
        if !self.path.starts_with('/') {
            return Err(RouteTableError::InvalidPath(
                self.path.clone(),
                "must start with `/`",
            ));
        }

        let mut seen = BTreeSet::new();
        for param in &self.dynamic_params {
            if param.is_empty() {
                return Err(RouteTableError::InvalidPath(
                    self.path.clone(),
                    "empty `:` parameter name",
                ));
            }
            if !seen.insert(param.as_str()) {
                return Err(RouteTableError::InvalidPath(
                    self.path.clone(),
                    "parameter name repeated",
                ));
            }
        }
        Ok(())
    }
}

/// RouteMatch
///
/// The outcome of a successful resolution: the entry plus the captured values of
/// its dynamic segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    pub params: BTreeMap<String, String>,
}

/// RouteTable
///
/// Built once at startup and never mutated. Shared across the guard and handlers
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Validates and freezes the given entries.
    ///
    /// Fails on duplicate names, malformed paths, or when one of the guard's
    /// redirect destinations has no entry to land on.
    pub fn new(entries: Vec<RouteEntry>) -> Result<Self, RouteTableError> {
        let mut names = BTreeSet::new();
        for entry in &entries {
            entry.validate()?;
            if !names.insert(entry.name.as_str()) {
                return Err(RouteTableError::DuplicateName(entry.name.clone()));
            }
        }

        for target in RedirectTarget::ALL {
            if !names.contains(target.route_name()) {
                return Err(RouteTableError::MissingRedirectTarget(target.route_name()));
            }
        }

        Ok(Self { entries })
    }

    /// resolve
    ///
    /// Resolves a path (leading `/`) or a route name. Returns `None` for anything
    /// that does not match; resolution never fails.
    ///
    /// Paths ignore query strings, fragments and empty segments, and each segment
    /// is percent-decoded before matching. When several
    /// entries match a path, the one with the most static segments wins and ties
    /// go to the earlier entry. Names only resolve to entries without dynamic
    /// params, use `href` to build a concrete path for the others.
    pub fn resolve(&self, target: &str) -> Option<RouteMatch<'_>> {
        if target.starts_with('/') {
            self.resolve_path(target)
        } else {
            self.get(target)
                .filter(|entry| entry.dynamic_params.is_empty())
                .map(|entry| RouteMatch {
                    entry,
                    params: BTreeMap::new(),
                })
        }
    }

    fn resolve_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let decoded: Vec<String> = split_path(path)
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
            .collect();
        let parts: Vec<&str> = decoded.iter().map(String::as_str).collect();

        let mut best: Option<RouteMatch<'_>> = None;
        for entry in &self.entries {
            let Some(params) = entry.match_segments(&parts) else {
                continue;
            };
            let better = best
                .as_ref()
                .is_none_or(|current| entry.static_segments() > current.entry.static_segments());
            if better {
                best = Some(RouteMatch { entry, params });
            }
        }
        best
    }

    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// href
    ///
    /// Builds the concrete path of a named route, substituting every dynamic
    /// segment from `params`. `None` when the name is unknown or a param is missing.
    pub fn href(&self, name: &str, params: &BTreeMap<String, String>) -> Option<String> {
        let entry = self.get(name)?;
        if entry.segments.is_empty() {
            return Some("/".to_string());
        }

        let mut path = String::new();
        for segment in &entry.segments {
            path.push('/');
            match segment {
                Segment::Static(value) => path.push_str(value),
                Segment::Param(param) => path.push_str(params.get(param)?),
            }
        }
        Some(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// route_table
///
/// Assembles the fleet portal catalog in tier order: public, authenticated, admin.
pub fn route_table() -> Result<RouteTable, RouteTableError> {
    let entries = public::public_routes()
        .into_iter()
        .chain(authenticated::authenticated_routes())
        .chain(admin::admin_routes())
        .collect();

    RouteTable::new(entries)
}
