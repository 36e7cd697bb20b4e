//! Application assembly and the transport-facing entry point.
//!
//! Registration happens on an [`AppBuilder`]; [`AppBuilder::build`] freezes
//! the route table, the middleware chain and the exception handler into an
//! [`App`]. Nothing about an `App` can change afterwards, so all
//! configuration is complete before the first request is served and the app
//! can be shared freely between worker threads.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{normalize_prefix, AppConfig, DEFAULT_STATIC_PREFIX};
use crate::dispatcher::{Dispatcher, ExceptionHandler, Handler, HandlerResult, Resource};
use crate::error::{DispatchError, RouteError};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::router::{PathParams, Router};
use crate::server::{Request, Response};
use crate::static_files::StaticFiles;
use crate::templates::Templates;

#[derive(Debug, Clone)]
struct StaticMount {
    prefix: String,
    files: StaticFiles,
}

impl StaticMount {
    /// The part of `path` below the prefix, if `path` is under it.
    fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        rest.starts_with('/').then_some(rest)
    }
}

/// Collects routes, middleware and the exception handler.
pub struct AppBuilder {
    router: Router,
    chain: MiddlewareChain,
    exception_handler: Option<Arc<dyn ExceptionHandler>>,
    static_mount: Option<StaticMount>,
    templates: Templates,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&AppConfig::default())
    }

    /// Start from a loaded configuration (static directory, templates).
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            router: Router::new(),
            chain: MiddlewareChain::new(),
            exception_handler: None,
            static_mount: config.static_dir.as_ref().map(|dir| StaticMount {
                prefix: config.static_prefix.clone(),
                files: StaticFiles::new(dir.clone()),
            }),
            templates: Templates::new(config.templates_dir.clone()),
        }
    }

    /// Register a handler of either kind.
    pub fn register(
        &mut self,
        path: &str,
        handler: Handler,
        allowed_methods: Option<&[&str]>,
    ) -> Result<&mut Self, RouteError> {
        self.router.register(path, handler, allowed_methods)?;
        Ok(self)
    }

    /// Register a function handler that serves every method.
    pub fn route<F>(&mut self, path: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(path, Handler::function(f), None)
    }

    /// Same as [`AppBuilder::route`].
    pub fn add_route<F>(&mut self, path: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(path, f)
    }

    /// Register a function handler restricted to `methods`.
    pub fn route_with_methods<F>(
        &mut self,
        path: &str,
        methods: &[&str],
        f: F,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(path, Handler::function(f), Some(methods))
    }

    /// Register a resource type; each verb maps to one of its operations.
    pub fn resource<R: Resource>(&mut self, path: &str) -> Result<&mut Self, RouteError> {
        self.register(path, Handler::resource::<R>(), None)
    }

    /// Install the exception handler. A later call replaces an earlier one.
    pub fn exception_handler<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response, &DispatchError) + Send + Sync + 'static,
    {
        self.exception_handler = Some(Arc::new(f));
        self
    }

    /// Wrap the current chain in `mw`, making it the outermost stage.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) -> &mut Self {
        self.chain.push_outer(mw);
        self
    }

    /// Serve files from `dir` for paths under `prefix`. Fails when `prefix`
    /// normalizes to the root.
    pub fn static_dir(
        &mut self,
        dir: impl Into<PathBuf>,
        prefix: &str,
    ) -> anyhow::Result<&mut Self> {
        self.static_mount = Some(StaticMount {
            prefix: normalize_prefix(prefix)?,
            files: StaticFiles::new(dir),
        });
        Ok(self)
    }

    /// Serve files from `dir` under `/static`.
    pub fn static_dir_default(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.static_mount = Some(StaticMount {
            prefix: DEFAULT_STATIC_PREFIX.to_string(),
            files: StaticFiles::new(dir),
        });
        self
    }

    pub fn templates_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.templates = Templates::new(dir);
        self
    }

    /// Template renderer, for capture by handlers.
    #[must_use]
    pub fn templates(&self) -> Templates {
        self.templates.clone()
    }

    /// Freeze the configuration.
    #[must_use]
    pub fn build(self) -> App {
        info!(
            routes_count = self.router.len(),
            middleware_count = self.chain.len(),
            exception_handler = self.exception_handler.is_some(),
            static_prefix = ?self.static_mount.as_ref().map(|m| m.prefix.as_str()),
            "Application built"
        );
        App {
            dispatcher: Dispatcher::new(Arc::new(self.router), self.exception_handler),
            chain: self.chain,
            static_mount: self.static_mount,
            templates: self.templates,
        }
    }
}

/// A fully configured application.
#[derive(Clone)]
pub struct App {
    dispatcher: Dispatcher,
    chain: MiddlewareChain,
    static_mount: Option<StaticMount>,
    templates: Templates,
}

impl App {
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Handle one request.
    ///
    /// Paths under the static prefix are answered from disk and skip both
    /// the middleware chain and the router. Everything else runs through the
    /// chain into the dispatcher. An `Err` means a failure was not handled:
    /// a middleware hook failed, or a handler failed with no exception
    /// handler configured.
    pub fn handle(&self, mut req: Request) -> Result<Response, DispatchError> {
        if let Some(mount) = &self.static_mount {
            if let Some(rest) = mount.strip(&req.path) {
                return Ok(Self::serve_static(mount, rest, &req));
            }
        }
        self.chain.dispatch(&mut req, &self.dispatcher)
    }

    fn serve_static(mount: &StaticMount, rest: &str, req: &Request) -> Response {
        let mut res = Response::new();
        match mount.files.load(rest) {
            Ok(asset) => {
                debug!(
                    request_id = %req.request_id,
                    path = %req.path,
                    bytes = asset.bytes.len(),
                    "Static file served"
                );
                res.set_body(asset.bytes);
                res.set_content_type(asset.content_type);
            }
            Err(e) => {
                debug!(
                    request_id = %req.request_id,
                    path = %req.path,
                    error = %e,
                    "Static file not found"
                );
                res.not_found();
            }
        }
        res
    }

    /// Render a template from the configured directory.
    pub fn template<C: Serialize>(&self, name: &str, context: &C) -> anyhow::Result<String> {
        self.templates.render(name, context)
    }

    #[must_use]
    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        self.dispatcher.router()
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn middleware(&self) -> &MiddlewareChain {
        &self.chain
    }
}
