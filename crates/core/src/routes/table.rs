//! Route table: declarative definitions compiled into an ordered matcher

use super::pattern::PathPattern;
use crate::error::{ParamError, PatternError, RouterError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// What a route does once matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget<V> {
    View(V),
    Redirect(String),
}

/// Declarative route definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef<V> {
    pub path: String,
    pub name: String,
    pub target: RouteTarget<V>,
    pub children: Vec<RouteDef<V>>,
}

impl<V> RouteDef<V> {
    pub fn view(path: impl Into<String>, name: impl Into<String>, view: V) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            target: RouteTarget::View(view),
            children: Vec::new(),
        }
    }

    pub fn redirect(
        path: impl Into<String>,
        name: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            target: RouteTarget::Redirect(to.into()),
            children: Vec::new(),
        }
    }

    /// Child paths without a leading `/` are joined onto this route's path
    pub fn with_children(mut self, children: Vec<RouteDef<V>>) -> Self {
        self.children = children;
        self
    }
}

/// A compiled route
#[derive(Debug, Clone)]
pub struct Route<V> {
    pattern: PathPattern,
    name: String,
    target: RouteTarget<V>,
    children: Vec<Route<V>>,
}

impl<V> Route<V> {
    fn compile(def: RouteDef<V>, parent: Option<&str>) -> Result<Self, PatternError> {
        let full_path = join_paths(parent, &def.path);
        let pattern = PathPattern::new(&full_path)?;
        let children = def
            .children
            .into_iter()
            .map(|child| Route::compile(child, Some(&full_path)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pattern,
            name: def.name,
            target: def.target,
            children,
        })
    }

    /// Full path pattern including parent segments
    pub fn path(&self) -> &str {
        self.pattern.pattern()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn target(&self) -> &RouteTarget<V> {
        &self.target
    }

    pub fn view(&self) -> Option<&V> {
        match &self.target {
            RouteTarget::View(view) => Some(view),
            RouteTarget::Redirect(_) => None,
        }
    }

    pub fn redirect(&self) -> Option<&str> {
        match &self.target {
            RouteTarget::Redirect(to) => Some(to),
            RouteTarget::View(_) => None,
        }
    }

    pub fn children(&self) -> &[Route<V>] {
        &self.children
    }
}

fn join_paths(parent: Option<&str>, path: &str) -> String {
    match parent {
        _ if path.starts_with('/') => path.to_string(),
        None => format!("/{path}"),
        Some(parent) if path.is_empty() => parent.to_string(),
        Some(parent) => format!("{}/{}", parent.trim_end_matches('/'), path),
    }
}

/// One level of a resolved route chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedRoute<V> {
    pub path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<V>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl<V: Clone> MatchedRoute<V> {
    fn from_route(route: &Route<V>) -> Self {
        Self {
            path: route.path().to_string(),
            name: route.name.clone(),
            view: route.view().cloned(),
            redirect: route.redirect().map(str::to_string),
        }
    }
}

/// Result of resolving a path against the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch<V> {
    /// The resolved path
    pub path: String,
    /// Matched routes from the outermost parent to the leaf
    pub matched: Vec<MatchedRoute<V>>,
    pub params: BTreeMap<String, String>,
}

impl<V> RouteMatch<V> {
    pub fn leaf(&self) -> Option<&MatchedRoute<V>> {
        self.matched.last()
    }

    /// View rendered for the leaf route
    pub fn view(&self) -> Option<&V> {
        self.leaf().and_then(|route| route.view.as_ref())
    }

    pub fn name(&self) -> Option<&str> {
        self.leaf().map(|route| route.name.as_str())
    }

    /// Redirect target when the leaf is a redirect record
    pub fn redirect(&self) -> Option<&str> {
        self.leaf().and_then(|route| route.redirect.as_deref())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Parse a path parameter into a typed value
    pub fn parse_param<T>(&self, name: &str) -> Result<T, ParamError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self
            .param(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))?;
        value.parse().map_err(|e: T::Err| ParamError::Parse {
            name: name.to_string(),
            value: value.to_string(),
            message: e.to_string(),
        })
    }
}

/// Ordered, immutable set of routes; the first match in declaration order wins
#[derive(Debug, Clone)]
pub struct RouteTable<V> {
    routes: Vec<Route<V>>,
}

impl<V: Clone> RouteTable<V> {
    /// Compile route definitions into a table
    pub fn new(defs: Vec<RouteDef<V>>) -> Result<Self, PatternError> {
        let routes = defs
            .into_iter()
            .map(|def| Route::compile(def, None))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    /// Top-level routes in declaration order
    pub fn routes(&self) -> &[Route<V>] {
        &self.routes
    }

    /// All routes, depth first, parents before their children
    pub fn flatten(&self) -> Vec<&Route<V>> {
        fn walk<'a, V>(routes: &'a [Route<V>], out: &mut Vec<&'a Route<V>>) {
            for route in routes {
                out.push(route);
                walk(&route.children, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.routes, &mut out);
        out
    }

    /// Resolve a path (without query or fragment) to its route chain
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<V>> {
        let mut chain = Vec::new();
        let params = Self::resolve_in(&self.routes, path, &mut chain)?;
        Some(RouteMatch {
            path: path.to_string(),
            matched: chain.into_iter().map(MatchedRoute::from_route).collect(),
            params,
        })
    }

    fn resolve_in<'a>(
        routes: &'a [Route<V>],
        path: &str,
        chain: &mut Vec<&'a Route<V>>,
    ) -> Option<BTreeMap<String, String>> {
        for route in routes {
            chain.push(route);
            if let Some(params) = route.pattern.matches(path) {
                return Some(params);
            }
            if let Some(params) = Self::resolve_in(&route.children, path, chain) {
                return Some(params);
            }
            chain.pop();
        }
        None
    }

    /// First route, depth first, with the given display name
    pub fn find_by_name(&self, name: &str) -> Option<&Route<V>> {
        self.flatten().into_iter().find(|route| route.name == name)
    }

    /// Build a path for a named route
    pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouterError> {
        let route = self
            .find_by_name(name)
            .ok_or_else(|| RouterError::UnknownRouteName(name.to_string()))?;
        if route.redirect().is_some() && !params.is_empty() {
            return Err(RouterError::RedirectRoute {
                name: name.to_string(),
            });
        }

        let params: BTreeMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(route.pattern.reverse(&params)?)
    }
}

/// Whether a link to `route_path` should be highlighted while at `current_path`
pub fn is_active(current_path: &str, route_path: &str) -> bool {
    let current = current_path.trim_end_matches('/');
    let route = route_path.trim_end_matches('/');
    if route.is_empty() {
        return current.is_empty();
    }
    current.eq_ignore_ascii_case(route)
        || current
            .get(..route.len() + 1)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&format!("{route}/")))
}
