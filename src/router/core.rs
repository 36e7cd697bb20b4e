use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::pattern::{PathParams, PathPattern};
use crate::dispatcher::Handler;
use crate::error::RouteError;

/// Lower-cased method names a route accepts.
pub type MethodSet = SmallVec<[String; 4]>;

/// A registered association between a template and a handler.
///
/// Routes are immutable once registered and owned by the [`Router`].
#[derive(Debug)]
pub struct Route {
    /// Compiled template
    pub pattern: PathPattern,
    /// Handler invoked on a match
    pub handler: Handler,
    /// Optional allow-list of lower-cased methods
    pub allowed_methods: Option<MethodSet>,
}

impl Route {
    /// The template exactly as registered.
    #[must_use]
    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    /// True when the route has no allow-list or `method` (lower-cased) is in it.
    #[must_use]
    pub fn allows(&self, method: &str) -> bool {
        self.allowed_methods
            .as_ref()
            .map_or(true, |set| set.iter().any(|m| m == method))
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route (shared with the routing table)
    pub route: Arc<Route>,
    /// Typed parameters extracted from the path
    pub params: PathParams,
}

impl RouteMatch {
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.route.handler
    }
}

/// Ordered routing table.
///
/// Resolution walks routes in registration order and returns the first
/// whose pattern matches. Overlapping parameterized templates are therefore
/// resolved by registration order, not by specificity.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
    templates: HashSet<String>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `template`.
    ///
    /// `allowed_methods` restricts the route to the given verbs (compared
    /// case-insensitively). Registering an identical template twice fails
    /// with [`RouteError::DuplicateRoute`] and leaves the first route active.
    pub fn register(
        &mut self,
        template: &str,
        handler: Handler,
        allowed_methods: Option<&[&str]>,
    ) -> Result<(), RouteError> {
        if self.templates.contains(template) {
            warn!(template = %template, "Duplicate route rejected");
            return Err(RouteError::DuplicateRoute {
                template: template.to_string(),
            });
        }

        let pattern = PathPattern::compile(template).map_err(|e| {
            warn!(template = %template, error = %e, "Malformed route template");
            e
        })?;

        let allowed_methods: Option<MethodSet> = allowed_methods
            .map(|methods| methods.iter().map(|m| m.to_ascii_lowercase()).collect());

        info!(
            template = %template,
            handler_kind = handler.kind(),
            segments = pattern.segments().len(),
            allowed_methods = ?allowed_methods,
            routes_count = self.routes.len() + 1,
            "Route registered"
        );

        self.templates.insert(template.to_string());
        self.routes.push(Arc::new(Route {
            pattern,
            handler,
            allowed_methods,
        }));
        Ok(())
    }

    /// Resolve a concrete path to the first matching route.
    ///
    /// Resolution never mutates the table; calling it twice with the same
    /// path yields equal results.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        debug!(path = %path, routes_count = self.routes.len(), "Route match attempt");

        let match_start = Instant::now();
        let found = self
            .routes
            .iter()
            .find_map(|route| route.pattern.matches(path).map(|params| (route, params)));
        let match_duration = match_start.elapsed();

        if let Some((route, params)) = found {
            if match_duration > Duration::from_millis(1) {
                warn!(
                    path = %path,
                    route_pattern = %route.template(),
                    duration_us = match_duration.as_micros(),
                    "Slow route matching detected"
                );
            }
            debug!(
                path = %path,
                route_pattern = %route.template(),
                path_params = ?params,
                duration_us = match_duration.as_micros(),
                "Route matched"
            );
            return Some(RouteMatch {
                route: Arc::clone(route),
                params,
            });
        }

        debug!(
            path = %path,
            duration_us = match_duration.as_micros(),
            "No route matched"
        );
        None
    }

    /// Registered templates in registration order.
    #[must_use]
    pub fn templates(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.template()).collect()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Print all registered routes to stdout
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for route in &self.routes {
            match &route.allowed_methods {
                Some(methods) => println!(
                    "[route] {} -> {:?} methods={}",
                    route.template(),
                    route.handler,
                    methods.join(",")
                ),
                None => println!("[route] {} -> {:?}", route.template(), route.handler),
            }
        }
    }
}
