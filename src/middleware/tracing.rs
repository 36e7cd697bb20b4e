use std::time::Duration;

use tracing::{info, warn};

use super::Middleware;
use crate::server::{Request, Response};

/// Emits one structured event when a request enters the chain and one when
/// its response leaves, correlated by request id.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &mut Request) -> anyhow::Result<()> {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "Request started"
        );
        Ok(())
    }

    fn after(&self, req: &Request, res: &mut Response, latency: Duration) -> anyhow::Result<()> {
        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        if res.status >= 500 {
            warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_us,
                "Request completed with server error"
            );
        } else {
            info!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_us,
                "Request completed"
            );
        }
        Ok(())
    }
}
