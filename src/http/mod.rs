//! HTTP execution
//!
//! Issues one request per endpoint through a per-site [`Session`] and
//! returns a fully-read [`HttpResponse`].

mod decode;
mod method;
mod response;
mod session;

pub use decode::decode_body;
pub use method::Method;
pub use response::{Exchange, HttpResponse};
pub use session::{form_fields, Payload, Request, Session};
