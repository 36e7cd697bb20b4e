mod core;
mod metrics;
mod tracing;

pub use core::{Middleware, MiddlewareChain};
pub use metrics::{MetricsMiddleware, MetricsSnapshot};
pub use tracing::TracingMiddleware;
