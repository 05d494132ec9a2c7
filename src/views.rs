//! View helpers.
//!
//! This module provides template routing for htmx fragment requests, client
//! redirects, search and navigation highlighting.

pub use vitrine_views::*;
