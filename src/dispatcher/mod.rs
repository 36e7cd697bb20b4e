//! # Dispatcher Module
//!
//! Turns a request into a response: resolves the route, normalizes the
//! function and resource handler variants into a single invocation, applies
//! the not-found and method-not-allowed policies and routes failures through
//! the optional exception handler.
//!
//! ## Handler Registration
//!
//! ```rust
//! use sengoku::{App, Request};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = App::builder();
//! builder.route("/home", |_req, res, _params| {
//!     res.set_text("Hello from the HOME page");
//!     Ok(())
//! })?;
//! let app = builder.build();
//!
//! let res = app.handle(Request::get("/home"))?;
//! assert_eq!(res.text(), "Hello from the HOME page");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - Unmatched paths are a 404 response, not an error
//! - A verb the route does not serve is `MethodNotAllowed`
//! - Handler errors and panics become `DispatchError::Handler`
//! - With no exception handler configured every failure reaches the caller

mod core;
mod handler;

pub use core::{Dispatcher, Endpoint, ExceptionHandler};
pub use handler::{Handler, HandlerFn, HandlerResult, Operation, Operations, Resource, ResourceFactory};
