use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::server::{Request, Response};

/// Lock-free request statistics.
///
/// `before` counts every request entering the stage; `after` only runs for
/// requests that produced a response, so the two counts differ by the number
/// of requests aborted further in.
#[derive(Default)]
pub struct MetricsMiddleware {
    started: AtomicUsize,
    /// Completed responses bucketed by status class, `1xx` at index 0
    by_class: [AtomicUsize; 5],
    latency_ns: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub started: usize,
    pub completed: usize,
    pub client_errors: usize,
    pub server_errors: usize,
    pub average_latency_us: u64,
}

fn class_index(status: u16) -> Option<usize> {
    match status {
        100..=599 => Some(usize::from(status / 100) - 1),
        _ => None,
    }
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.started.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.by_class
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Completed responses whose status falls in `class` (`2` for 2xx ...).
    #[must_use]
    pub fn status_class_count(&self, class: u16) -> usize {
        class_index(class.saturating_mul(100))
            .map_or(0, |i| self.by_class[i].load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn client_error_count(&self) -> usize {
        self.status_class_count(4)
    }

    #[must_use]
    pub fn server_error_count(&self) -> usize {
        self.status_class_count(5)
    }

    /// Mean over completed requests; zero before the first one.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        match self.completed_count() as u64 {
            0 => Duration::ZERO,
            n => Duration::from_nanos(self.latency_ns.load(Ordering::Relaxed) / n),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            started: self.request_count(),
            completed: self.completed_count(),
            client_errors: self.client_error_count(),
            server_errors: self.server_error_count(),
            average_latency_us: u64::try_from(self.average_latency().as_micros())
                .unwrap_or(u64::MAX),
        }
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _req: &mut Request) -> anyhow::Result<()> {
        self.started.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn after(&self, _req: &Request, res: &mut Response, latency: Duration) -> anyhow::Result<()> {
        // Statuses outside 100..=599 are not recorded at all.
        if let Some(i) = class_index(res.status) {
            let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
            self.latency_ns.fetch_add(nanos, Ordering::Relaxed);
            self.by_class[i].fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}
