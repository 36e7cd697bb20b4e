//! Handler variants.
//!
//! A route points at either a plain function or a resource type. The tag is
//! fixed at registration so dispatch never has to guess which one it holds.

use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use crate::error::DispatchError;
use crate::router::PathParams;
use crate::server::{Request, Response};

/// Result returned by handler bodies. Any error type converts via `?`.
pub type HandlerResult = anyhow::Result<()>;

/// Boxed function handler.
pub type HandlerFn =
    Arc<dyn Fn(&Request, &mut Response, &PathParams) -> HandlerResult + Send + Sync>;

/// One verb operation on a resource instance.
pub type Operation<R> = fn(&mut R, &Request, &mut Response, &PathParams) -> HandlerResult;

/// Verb-name to operation table for a resource type.
///
/// Verb names are stored lower-cased.
pub struct Operations<R> {
    ops: SmallVec<[(String, Operation<R>); 8]>,
}

impl<R> Default for Operations<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Operations<R> {
    #[must_use]
    pub fn new() -> Self {
        Self { ops: SmallVec::new() }
    }

    /// Register `op` for an arbitrary verb. A later registration for the same
    /// verb replaces the earlier one.
    #[must_use]
    pub fn on(mut self, verb: &str, op: Operation<R>) -> Self {
        let verb = verb.to_ascii_lowercase();
        self.ops.retain(|(v, _)| *v != verb);
        self.ops.push((verb, op));
        self
    }

    #[must_use]
    pub fn get(self, op: Operation<R>) -> Self {
        self.on("get", op)
    }

    #[must_use]
    pub fn post(self, op: Operation<R>) -> Self {
        self.on("post", op)
    }

    #[must_use]
    pub fn put(self, op: Operation<R>) -> Self {
        self.on("put", op)
    }

    #[must_use]
    pub fn patch(self, op: Operation<R>) -> Self {
        self.on("patch", op)
    }

    #[must_use]
    pub fn delete(self, op: Operation<R>) -> Self {
        self.on("delete", op)
    }

    #[must_use]
    pub fn find(&self, verb: &str) -> Option<Operation<R>> {
        self.ops.iter().find(|(v, _)| v == verb).map(|(_, op)| *op)
    }

    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().map(|(v, _)| v.as_str())
    }
}

/// A type whose instances serve one or more HTTP verbs.
///
/// A fresh instance is created with `Default` for every request; nothing is
/// retained between requests.
///
/// ```rust
/// use sengoku::{Operations, PathParams, Request, Resource, Response};
///
/// #[derive(Default)]
/// struct Book;
///
/// impl Book {
///     fn get(&mut self, _req: &Request, res: &mut Response, _p: &PathParams) -> anyhow::Result<()> {
///         res.set_text("a book");
///         Ok(())
///     }
/// }
///
/// impl Resource for Book {
///     fn operations() -> Operations<Self> {
///         Operations::new().get(Self::get)
///     }
/// }
/// ```
pub trait Resource: Default + Send + 'static {
    /// The verb table, read once at registration.
    fn operations() -> Operations<Self>;
}

/// Type-erased resource descriptor stored in the route table.
pub trait ResourceFactory: Send + Sync {
    /// Type name, for logs.
    fn name(&self) -> &'static str;

    /// Verbs this resource has operations for.
    fn verbs(&self) -> Vec<String>;

    /// Instantiate the resource and run the operation for `method`
    /// (lower-cased). A missing operation is `MethodNotAllowed`.
    fn invoke(
        &self,
        method: &str,
        req: &Request,
        res: &mut Response,
        params: &PathParams,
    ) -> Result<(), DispatchError>;
}

struct ResourceDescriptor<R> {
    ops: Operations<R>,
}

impl<R: Resource> ResourceFactory for ResourceDescriptor<R> {
    fn name(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn verbs(&self) -> Vec<String> {
        self.ops.verbs().map(str::to_string).collect()
    }

    fn invoke(
        &self,
        method: &str,
        req: &Request,
        res: &mut Response,
        params: &PathParams,
    ) -> Result<(), DispatchError> {
        let mut instance = R::default();
        let op = self
            .ops
            .find(method)
            .ok_or_else(|| DispatchError::method_not_allowed("Method not allowed", method))?;
        op(&mut instance, req, res, params).map_err(DispatchError::Handler)
    }
}

/// Handler attached to a route.
#[derive(Clone)]
pub enum Handler {
    /// Stateless function
    Function(HandlerFn),
    /// Resource type, instantiated per request
    Resource(Arc<dyn ResourceFactory>),
}

impl Handler {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Request, &mut Response, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        Handler::Function(Arc::new(f))
    }

    #[must_use]
    pub fn resource<R: Resource>() -> Self {
        Handler::Resource(Arc::new(ResourceDescriptor::<R> {
            ops: R::operations(),
        }))
    }

    /// `"function"` or `"resource"`, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Handler::Function(_) => "function",
            Handler::Resource(_) => "resource",
        }
    }

    /// Same underlying handler (pointer identity).
    #[must_use]
    pub fn same_as(&self, other: &Handler) -> bool {
        match (self, other) {
            (Handler::Function(a), Handler::Function(b)) => Arc::ptr_eq(a, b),
            (Handler::Resource(a), Handler::Resource(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Function(_) => f.write_str("Handler::Function"),
            Handler::Resource(r) => write!(f, "Handler::Resource({})", r.name()),
        }
    }
}
