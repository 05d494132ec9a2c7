//! # Vitrine Views
//!
//! Helpers for server-rendered views that also answer htmx fragment requests.
//!
//! - [`RequestMode`]: full page, boosted navigation or fragment request
//! - [`PartialRouter`]: picks fragment templates from a route table keyed by a
//!   request parameter, and contributes the resolved key to the render context
//! - [`RedirectAdapter`]: turns redirects into `HX-Redirect` client redirects for
//!   htmx clients
//! - [`SearchQuery`]: free-text filtering of list views
//! - [`active_class`]: highlighting of the current navigation entry

pub mod active;
pub mod error;
pub mod mode;
pub mod redirect;
pub mod router;
pub mod search;
pub mod settings;
pub mod template;

pub use active::{DEFAULT_ACTIVE_CLASS, active_class};
pub use error::{ViewError, ViewResult};
pub use mode::RequestMode;
pub use redirect::RedirectAdapter;
pub use router::{Context, HTMX_KEY, PartialRouter, PartialRouterBuilder, Resolution, RouteOutcome};
pub use search::{DEFAULT_SEARCH_PARAM, SearchFilter, SearchQuery, Searchable};
pub use settings::RouterSettings;
pub use template::TemplateSpec;
