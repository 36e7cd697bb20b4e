//! # sengoku
//!
//! **sengoku** is a small HTTP request-dispatch core: a path router with typed
//! parameter extraction, an onion-style middleware chain, and a handler
//! protocol that treats stateless functions and per-verb resource types
//! uniformly.
//!
//! ## Architecture
//!
//! - **[`router`]** - Route templates (`/sub/{a:d}/{b:d}`) and first-match resolution
//! - **[`dispatcher`]** - Handler invocation, not-found and method-not-allowed policies,
//!   exception handling
//! - **[`middleware`]** - `before`/`after` stages nested around the dispatcher
//! - **[`server`]** - Request and response types
//! - **[`app`]** - Registration surface and the single `handle` entry point
//! - **[`static_files`]**, **[`templates`]** - Static assets and template rendering
//! - **[`config`]**, **[`logging`]** - Environment/TOML configuration and tracing setup
//!
//! ### Request Handling Flow
//!
//! ```text
//! App::handle(request)
//!   ├─ path under static prefix? ── StaticFiles ── response
//!   └─ MiddlewareChain
//!        M_n.before ... M_1.before
//!          Dispatcher
//!            Router::resolve(path) ── no match ── 404 "Not found."
//!            allow-list / resource verb lookup ── MethodNotAllowed
//!            handler(request, &mut response, params)
//!            error? ── exception handler, or propagate
//!        M_1.after ... M_n.after
//! ```
//!
//! The transport (an HTTP server loop) is not part of this crate; it calls
//! [`App::handle`] once per request.
//!
//! ## Example
//!
//! ```rust
//! use sengoku::{App, Operations, PathParams, Request, Resource, Response};
//!
//! #[derive(Default)]
//! struct Book;
//!
//! impl Book {
//!     fn get(&mut self, _req: &Request, res: &mut Response, _p: &PathParams) -> anyhow::Result<()> {
//!         res.set_text("this is a get request");
//!         Ok(())
//!     }
//! }
//!
//! impl Resource for Book {
//!     fn operations() -> Operations<Self> {
//!         Operations::new().get(Self::get)
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = App::builder();
//! builder
//!     .resource::<Book>("/book")?
//!     .route("/{name}", |_req, res, p| {
//!         res.set_text(format!("hey {}", p.get_str("name").unwrap_or_default()));
//!         Ok(())
//!     })?;
//! let app = builder.build();
//!
//! assert_eq!(app.handle(Request::get("/book"))?.text(), "this is a get request");
//! assert_eq!(app.handle(Request::get("/xavier"))?.text(), "hey xavier");
//! assert_eq!(app.handle(Request::get("/missing/path"))?.status, 404);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The core defines no threads. All registration happens on [`AppBuilder`]
//! before [`AppBuilder::build`]; the resulting [`App`] is immutable and
//! `Send + Sync`, so a transport may call `handle` from any number of
//! workers.

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod server;
pub mod static_files;
pub mod templates;

pub use app::{App, AppBuilder};
pub use config::AppConfig;
pub use dispatcher::{
    Dispatcher, Endpoint, ExceptionHandler, Handler, HandlerResult, Operations, Resource,
};
pub use error::{DispatchError, PatternError, RouteError};
pub use middleware::{
    MetricsMiddleware, MetricsSnapshot, Middleware, MiddlewareChain, TracingMiddleware,
};
pub use router::{ParamValue, PathParams, PathPattern, RouteMatch, Router};
pub use server::{Request, RequestId, Response};
pub use static_files::{Asset, StaticFiles};
pub use templates::Templates;
