use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::handler::Handler;
use crate::error::DispatchError;
use crate::router::{RouteMatch, Router};
use crate::server::{Request, Response};

/// Hook that turns a dispatch failure into a response.
///
/// It receives the response the handler was writing to and is expected to
/// leave it in a caller-meaningful state. Once it returns, the error counts
/// as handled. Any `Fn(&Request, &mut Response, &DispatchError)` closure is
/// an exception handler.
pub trait ExceptionHandler: Send + Sync {
    fn handle(&self, req: &Request, res: &mut Response, err: &DispatchError);
}

impl<F> ExceptionHandler for F
where
    F: Fn(&Request, &mut Response, &DispatchError) + Send + Sync,
{
    fn handle(&self, req: &Request, res: &mut Response, err: &DispatchError) {
        self(req, res, err)
    }
}

/// Anything that turns a request into a response; the innermost stage of a
/// middleware chain.
pub trait Endpoint: Send + Sync {
    fn dispatch(&self, req: &Request) -> Result<Response, DispatchError>;
}

/// Resolves a route and invokes its handler.
///
/// Lifecycle of one request:
///
/// 1. Resolve the path. No match: 404 `Not found.`, no handler runs.
/// 2. Check the route's allow-list, then invoke the function, or instantiate
///    the resource and run the operation named after the lower-cased verb.
///    A refused verb is [`DispatchError::MethodNotAllowed`].
/// 3. A failure from step 2 goes to the exception handler when one is
///    configured, and propagates to the caller otherwise.
///
/// The router and exception handler are fixed at construction, so a
/// dispatcher is safe to share across threads once built.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    exception_handler: Option<Arc<dyn ExceptionHandler>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Arc<Router>, exception_handler: Option<Arc<dyn ExceptionHandler>>) -> Self {
        Self {
            router,
            exception_handler,
        }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn has_exception_handler(&self) -> bool {
        self.exception_handler.is_some()
    }

    /// Dispatch one request.
    pub fn dispatch(&self, req: &Request) -> Result<Response, DispatchError> {
        let mut res = Response::new();

        let Some(route_match) = self.router.resolve(&req.path) else {
            warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                "No route matched - returning 404"
            );
            res.not_found();
            return Ok(res);
        };

        let method = req.method_name();
        debug!(
            request_id = %req.request_id,
            method = %method,
            route_pattern = %route_match.route.template(),
            handler_kind = route_match.handler().kind(),
            "Invoking handler"
        );

        let start = Instant::now();
        match Self::invoke(&route_match, &method, req, &mut res) {
            Ok(()) => {
                info!(
                    request_id = %req.request_id,
                    method = %method,
                    path = %req.path,
                    route_pattern = %route_match.route.template(),
                    status = res.status,
                    latency_us = start.elapsed().as_micros(),
                    "Request dispatched"
                );
            }
            Err(err) => match &self.exception_handler {
                Some(handler) => {
                    warn!(
                        request_id = %req.request_id,
                        method = %method,
                        path = %req.path,
                        error = %err,
                        "Handler failed - delegating to exception handler"
                    );
                    handler.handle(req, &mut res, &err);
                }
                None => {
                    error!(
                        request_id = %req.request_id,
                        method = %method,
                        path = %req.path,
                        error = %err,
                        "Handler failed - no exception handler configured"
                    );
                    return Err(err);
                }
            },
        }

        Ok(res)
    }

    fn invoke(
        route_match: &RouteMatch,
        method: &str,
        req: &Request,
        res: &mut Response,
    ) -> Result<(), DispatchError> {
        let route = &route_match.route;
        if !route.allows(method) {
            return Err(DispatchError::method_not_allowed("Method not allowed", method));
        }

        let params = &route_match.params;
        let outcome = catch_unwind(AssertUnwindSafe(|| match &route.handler {
            Handler::Function(f) => f(req, res, params).map_err(DispatchError::Handler),
            Handler::Resource(factory) => factory.invoke(method, req, res, params),
        }));

        outcome.unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            error!(
                request_id = %req.request_id,
                route_pattern = %route.template(),
                panic_message = %message,
                "Handler panicked"
            );
            Err(DispatchError::Handler(anyhow::anyhow!(
                "handler panicked: {message}"
            )))
        })
    }
}

impl Endpoint for Dispatcher {
    fn dispatch(&self, req: &Request) -> Result<Response, DispatchError> {
        Dispatcher::dispatch(self, req)
    }
}
