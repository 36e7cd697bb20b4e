use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::dispatcher::Endpoint;
use crate::error::DispatchError;
use crate::server::{Request, Response};

/// A stage wrapped around dispatch.
///
/// `before` may inspect or mutate the request; `after` may inspect or mutate
/// the response. An `Err` from either hook aborts the chain and surfaces as
/// [`DispatchError::Middleware`].
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &mut Request) -> anyhow::Result<()> {
        Ok(())
    }

    /// `latency` is the time spent in the stages inside this one.
    fn after(&self, _req: &Request, _res: &mut Response, _latency: Duration) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Linear chain of middleware stages around a single [`Endpoint`].
///
/// Stages are stored outermost first. Each [`wrap`](MiddlewareChain::wrap)
/// puts the new stage outside all existing ones, so for `M1` wrapped first
/// and `M2` second the call order is
/// `M2.before, M1.before, endpoint, M1.after, M2.after`.
///
/// An empty chain calls the endpoint directly.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `mw` the new outermost stage.
    #[must_use]
    pub fn wrap(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.push_outer(mw);
        self
    }

    pub(crate) fn push_outer(&mut self, mw: Arc<dyn Middleware>) {
        self.stages.insert(0, mw);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run `req` through every stage and the endpoint.
    pub fn dispatch<E>(&self, req: &mut Request, endpoint: &E) -> Result<Response, DispatchError>
    where
        E: Endpoint + ?Sized,
    {
        if self.stages.is_empty() {
            return endpoint.dispatch(req);
        }
        debug!(
            request_id = %req.request_id,
            middleware_count = self.stages.len(),
            "Entering middleware chain"
        );
        self.dispatch_from(0, req, endpoint)
    }

    fn dispatch_from<E>(
        &self,
        depth: usize,
        req: &mut Request,
        endpoint: &E,
    ) -> Result<Response, DispatchError>
    where
        E: Endpoint + ?Sized,
    {
        let Some(stage) = self.stages.get(depth) else {
            return endpoint.dispatch(req);
        };

        stage.before(req).map_err(|e| {
            debug!(
                request_id = %req.request_id,
                middleware_idx = depth,
                middleware_name = std::any::type_name_of_val(stage.as_ref()),
                error = %e,
                "Middleware before hook failed"
            );
            DispatchError::Middleware(e)
        })?;

        let start = Instant::now();
        let mut res = self.dispatch_from(depth + 1, req, endpoint)?;
        let latency = start.elapsed();

        stage.after(req, &mut res, latency).map_err(|e| {
            debug!(
                request_id = %req.request_id,
                middleware_idx = depth,
                middleware_name = std::any::type_name_of_val(stage.as_ref()),
                error = %e,
                "Middleware after hook failed"
            );
            DispatchError::Middleware(e)
        })?;

        Ok(res)
    }
}
