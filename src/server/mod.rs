//! Request and response types exchanged between the transport, the
//! middleware chain and handlers.

pub mod request;
mod request_id;
pub mod response;

pub use request::{HeaderVec, Request, MAX_INLINE_HEADERS};
pub use request_id::RequestId;
pub use response::{Response, APPLICATION_JSON, TEXT_HTML, TEXT_PLAIN};
