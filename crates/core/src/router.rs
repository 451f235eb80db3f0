//! Router driver
//!
//! Resolves a navigation target against the route table, follows redirect
//! records, runs the guard, and restarts the navigation whenever the guard
//! redirects, until the guard allows or the hop limit is reached.

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::guard::{NavigationDecision, NavigationGuard, NavigationRequest, RedirectReason};
use crate::routes::{RouteMatch, RouteTable};
use crate::session::SessionStore;
use serde::Serialize;
use tracing::{debug, warn};

/// A navigation target split into path, query and fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl NavigationTarget {
    /// Parse `path?query#fragment`; a missing leading slash is added
    pub fn parse(raw: &str) -> Self {
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (raw, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Self {
            path,
            query: query.filter(|q| !q.is_empty()),
            fragment: fragment.filter(|f| !f.is_empty()),
        }
    }

    /// Path with query and fragment re-attached
    pub fn full_path(&self) -> String {
        let mut full = self.path.clone();
        if let Some(query) = &self.query {
            full.push('?');
            full.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            full.push('#');
            full.push_str(fragment);
        }
        full
    }

    /// Follow a redirect, keeping this target's query and fragment unless the
    /// redirect carries its own
    fn redirected_to(&self, to: &str) -> Self {
        let mut next = Self::parse(to);
        if next.query.is_none() {
            next.query = self.query.clone();
        }
        if next.fragment.is_none() {
            next.fragment = self.fragment.clone();
        }
        next
    }
}

impl From<&str> for NavigationTarget {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Why a hop was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "kebab-case")]
pub enum HopCause {
    /// The matched route is a redirect record
    RedirectRecord,
    Guard(RedirectReason),
}

/// One redirect taken during a navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub from: String,
    pub to: String,
    pub cause: HopCause,
}

/// A completed navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation<V> {
    /// Where the navigation ended up
    pub target: NavigationTarget,
    /// The matched route chain, or `None` when nothing matched
    pub route: Option<RouteMatch<V>>,
    pub hops: Vec<Hop>,
    /// Whether the guard refreshed the access token along the way
    pub refreshed: bool,
}

impl<V> Navigation<V> {
    pub fn was_redirected(&self) -> bool {
        !self.hops.is_empty()
    }
}

/// Route table plus guard
#[derive(Debug)]
pub struct Router<V> {
    table: RouteTable<V>,
    guard: NavigationGuard,
    config: RouterConfig,
}

impl<V: Clone> Router<V> {
    pub fn new(table: RouteTable<V>, guard: NavigationGuard, config: RouterConfig) -> Self {
        Self {
            table,
            guard,
            config,
        }
    }

    pub fn table(&self) -> &RouteTable<V> {
        &self.table
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Strip the configured base from a browser path
    pub fn strip_base(&self, browser_path: &str) -> String {
        let base = self.config.base.trim_end_matches('/');
        if base.is_empty() {
            return browser_path.to_string();
        }
        match browser_path.strip_prefix(base) {
            Some("") => "/".to_string(),
            Some(rest) if rest.starts_with(['/', '?', '#']) => {
                if rest.starts_with('/') {
                    rest.to_string()
                } else {
                    format!("/{rest}")
                }
            }
            _ => browser_path.to_string(),
        }
    }

    /// Prefix an application path with the configured base
    pub fn with_base(&self, app_path: &str) -> String {
        let base = self.config.base.trim_end_matches('/');
        format!("{base}{app_path}")
    }

    /// Navigate from `from` to `target`, following redirects until the guard allows
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::RedirectLoop`] when more than `max_redirects` hops are taken
    pub async fn navigate(
        &self,
        target: &str,
        from: &str,
        session: &dyn SessionStore,
    ) -> Result<Navigation<V>, RouterError> {
        let mut target = NavigationTarget::parse(target);
        let mut from = from.to_string();
        let mut hops: Vec<Hop> = Vec::new();
        let mut refreshed = false;

        loop {
            if hops.len() > self.config.max_redirects {
                warn!(
                    "Navigation to {} gave up after {} redirects",
                    target.path, self.config.max_redirects
                );
                return Err(RouterError::RedirectLoop {
                    path: target.path,
                    limit: self.config.max_redirects,
                });
            }

            let route = self.table.resolve(&target.path);
            if let Some(to) = route.as_ref().and_then(|m| m.redirect()) {
                debug!("Route {} redirects to {}", target.path, to);
                let next = target.redirected_to(to);
                hops.push(Hop {
                    from: target.path.clone(),
                    to: next.path.clone(),
                    cause: HopCause::RedirectRecord,
                });
                target = next;
                continue;
            }

            let snapshot = session.snapshot();
            let decision = self
                .guard
                .check(&NavigationRequest::new(&target.path, &from), &snapshot)
                .await;
            refreshed |= decision.refreshed();

            match decision {
                NavigationDecision::Allow | NavigationDecision::AllowAfterRefresh => {
                    if route.is_none() {
                        debug!("No route matches {}", target.path);
                    }
                    return Ok(Navigation {
                        target,
                        route,
                        hops,
                        refreshed,
                    });
                }
                NavigationDecision::Redirect { to, reason, .. } => {
                    let next = NavigationTarget::parse(&to);
                    hops.push(Hop {
                        from: target.path.clone(),
                        to: next.path.clone(),
                        cause: HopCause::Guard(reason),
                    });
                    from = std::mem::replace(&mut target, next).path;
                }
            }
        }
    }
}
