//! HTTP request and response types for Vitrine
//!
//! Handlers only need a narrow view of the HTTP exchange: query and form parameters,
//! the htmx request headers, and a response that can express both server-side and
//! client-side redirects.
//!
//! ## htmx headers
//!
//! - `HX-Request: true` marks a fragment-capable request
//! - `HX-Boosted: true` marks a boosted navigation that still expects a full page
//! - `HX-Redirect` on a response asks the client to navigate by itself

pub mod error;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use hyper::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;

/// Request header sent by htmx on every request it issues.
pub const HX_REQUEST: &str = "hx-request";
/// Request header sent by htmx for boosted links and forms.
pub const HX_BOOSTED: &str = "hx-boosted";
/// Response header instructing htmx to perform a client-side redirect.
pub const HX_REDIRECT: &str = "hx-redirect";
