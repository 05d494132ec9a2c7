//! Request and response types.
//!
//! # Examples
//!
//! ```rust
//! use vitrine::http::{Request, Response};
//!
//! let request = Request::builder().uri("/cart/").htmx(false).build().unwrap();
//! assert!(request.is_htmx());
//!
//! let response = Response::client_redirect("/checkout/");
//! assert_eq!(response.client_redirect_target(), Some("/checkout/"));
//! ```

pub use vitrine_http::*;
