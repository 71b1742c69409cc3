use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::guard::{Decision, Guard, RedirectTarget};

/// Redirect hops followed before a navigation is declared a loop.
pub const MAX_REDIRECTS: usize = 5;

/// NavigationOutcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The navigation settled on a route, possibly after redirects.
    Arrived {
        route: String,
        path: String,
        params: BTreeMap<String, String>,
        redirects: Vec<RedirectTarget>,
    },
    /// A newer navigation started while this one was being guarded; its result
    /// was dropped.
    Superseded,
    /// The redirect chain exceeded the hop limit.
    RedirectLoop { redirects: Vec<RedirectTarget> },
}

/// Navigator
///
/// Sequential, client-style navigation on top of the guard. Each call follows the
/// guard's redirects (every hop is guarded afresh) until a route is reached.
///
/// Navigations may overlap when the caller moves on before the guard answers.
/// Every navigation takes a generation ticket; a navigation whose ticket is no
/// longer the latest when its guard evaluation completes reports `Superseded` and
/// leaves the current location untouched.
pub struct Navigator {
    guard: Arc<Guard>,
    generation: AtomicU64,
    current: Mutex<Option<String>>,
    max_redirects: usize,
}

impl Navigator {
    pub fn new(guard: Arc<Guard>) -> Self {
        Self {
            guard,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
            max_redirects: MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Name of the route the last settled navigation arrived at.
    pub fn current(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn navigate(&self, target: &str, access_token: Option<&str>) -> NavigationOutcome {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut redirects = Vec::new();
        let mut next = target.to_string();

        loop {
            let navigation = self.guard.check(&next, access_token).await;

            if self.generation.load(Ordering::SeqCst) != ticket {
                tracing::debug!(destination = target, ticket, "navigation superseded");
                return NavigationOutcome::Superseded;
            }

            let redirect = match navigation.decision {
                Decision::Redirect(to) => to,
                Decision::Proceed => match navigation.matched {
                    Some(matched) => {
                        let route = matched.entry.name.clone();
                        let path = self
                            .guard
                            .table()
                            .href(&route, &matched.params)
                            .unwrap_or_else(|| matched.entry.path.clone());

                        // The ticket is re-checked under the lock so a newer
                        // navigation always writes after this one.
                        let mut current =
                            self.current.lock().unwrap_or_else(PoisonError::into_inner);
                        if self.generation.load(Ordering::SeqCst) != ticket {
                            tracing::debug!(destination = target, ticket, "navigation superseded");
                            return NavigationOutcome::Superseded;
                        }
                        *current = Some(route.clone());
                        drop(current);

                        return NavigationOutcome::Arrived {
                            route,
                            path,
                            params: matched.params,
                            redirects,
                        };
                    }
                    None => RedirectTarget::NotFound,
                },
            };

            if redirects.len() == self.max_redirects {
                tracing::warn!(destination = target, ?redirects, "redirect limit reached");
                return NavigationOutcome::RedirectLoop { redirects };
            }
            redirects.push(redirect);
            next = redirect.route_name().to_string();
        }
    }
}
