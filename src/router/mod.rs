//! # Router Module
//!
//! Path matching and route resolution.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route templates such as `/sub/{a:d}/{b:d}` into matchers
//! - Rejecting duplicate templates at registration time
//! - Resolving a concrete request path to a handler plus typed parameters
//!
//! ## Architecture
//!
//! 1. **Compilation**: each template becomes a [`PathPattern`]: literal-only
//!    templates compare by string equality, templates with segments become an
//!    anchored regex with one capture group per segment.
//!
//! 2. **Matching**: [`Router::resolve`] tests patterns in registration order
//!    and returns the first match. A typed segment whose text does not convert
//!    is a non-match, never an error.
//!
//! ## Example
//!
//! ```rust
//! use sengoku::{Handler, Router};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new();
//! router.register(
//!     "/sub/{a:d}/{b:d}",
//!     Handler::function(|_req, res, p| {
//!         let a = p.get_int("a").unwrap_or_default();
//!         let b = p.get_int("b").unwrap_or_default();
//!         res.set_text(format!("{}", a - b));
//!         Ok(())
//!     }),
//!     None,
//! )?;
//!
//! let m = router.resolve("/sub/10/3").expect("route");
//! assert_eq!(m.params.get_int("a"), Some(10));
//! assert!(router.resolve("/sub/x/3").is_none());
//! # Ok(())
//! # }
//! ```

mod core;
mod pattern;

pub use core::{MethodSet, Route, RouteMatch, Router};
pub use pattern::{ParamValue, PathParams, PathPattern, SegmentSpec, SegmentType, MAX_INLINE_PARAMS};
