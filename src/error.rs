//! Error types shared by the router, dispatcher and middleware chain.
//!
//! Registration-time failures ([`PatternError`], [`RouteError`]) are fatal to
//! start-up unless the caller handles them. Dispatch-time failures are
//! reported as [`DispatchError`] and either funnel through the configured
//! exception handler or propagate out of [`crate::App::handle`].
//!
//! Not-found is deliberately absent: an unmatched path is a normal dispatch
//! outcome (404 response), never an error.

use std::fmt;

/// Malformed route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A `{` was opened but never closed
    UnclosedSegment {
        /// The offending template
        template: String,
    },
    /// A `}` appeared without a matching `{`
    UnopenedSegment {
        /// The offending template
        template: String,
    },
    /// The segment name is empty or not an identifier
    InvalidName {
        /// The offending template
        template: String,
        /// The rejected name
        name: String,
    },
    /// The segment uses a type converter that does not exist
    UnknownType {
        /// The offending template
        template: String,
        /// The rejected converter code
        ty: String,
    },
    /// The same segment name occurs twice in one template
    DuplicateName {
        /// The offending template
        template: String,
        /// The repeated name
        name: String,
    },
    /// The generated matcher could not be compiled
    Regex {
        /// The offending template
        template: String,
        /// The underlying regex error
        message: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::UnclosedSegment { template } => {
                write!(f, "route template '{template}' has an unclosed '{{' segment")
            }
            PatternError::UnopenedSegment { template } => {
                write!(f, "route template '{template}' has a '}}' without a matching '{{'")
            }
            PatternError::InvalidName { template, name } => {
                write!(f, "route template '{template}' has an invalid segment name '{name}'")
            }
            PatternError::UnknownType { template, ty } => {
                write!(
                    f,
                    "route template '{template}' uses unknown segment type '{ty}' \
                    (expected one of: s, d, f)"
                )
            }
            PatternError::DuplicateName { template, name } => {
                write!(f, "route template '{template}' declares segment '{name}' twice")
            }
            PatternError::Regex { template, message } => {
                write!(f, "route template '{template}' could not be compiled: {message}")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Route registration failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The template itself is malformed
    Pattern(PatternError),
    /// A route with the identical literal template already exists
    DuplicateRoute {
        /// The template that was registered twice
        template: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Pattern(e) => write!(f, "{e}"),
            RouteError::DuplicateRoute { template } => {
                write!(f, "such route already exists: '{template}'")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Pattern(e) => Some(e),
            RouteError::DuplicateRoute { .. } => None,
        }
    }
}

impl From<PatternError> for RouteError {
    fn from(e: PatternError) -> Self {
        RouteError::Pattern(e)
    }
}

/// Failure raised while a request is being dispatched.
#[derive(Debug)]
pub enum DispatchError {
    /// No operation exists for the request verb, or the route's allow-list
    /// excludes it
    MethodNotAllowed {
        /// Human readable reason
        reason: String,
        /// The lower-cased request method
        method: String,
    },
    /// Error returned by a handler body
    Handler(anyhow::Error),
    /// Error returned by a middleware hook
    Middleware(anyhow::Error),
}

impl DispatchError {
    /// Build a `MethodNotAllowed` for the given (lower-cased) method.
    pub fn method_not_allowed(reason: impl Into<String>, method: impl Into<String>) -> Self {
        DispatchError::MethodNotAllowed {
            reason: reason.into(),
            method: method.into(),
        }
    }

    /// True for the `MethodNotAllowed` variant.
    #[must_use]
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, DispatchError::MethodNotAllowed { .. })
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::MethodNotAllowed { reason, method } => write!(f, "{reason}: {method}"),
            DispatchError::Handler(e) => write!(f, "{e}"),
            DispatchError::Middleware(e) => write!(f, "middleware error: {e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::MethodNotAllowed { .. } => None,
            DispatchError::Handler(e) | DispatchError::Middleware(e) => Some(&**e),
        }
    }
}
