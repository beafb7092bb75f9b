// src/lib.rs

//! Pathwise client library.
//!
//! Resilient loading of career content (remote API, static assets, built-in
//! defaults), client-side filtering, and the auth and assistant services the
//! content pages sit next to.

pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, AuthError, Result};
pub use filter::ContentFilter;
pub use loader::{Catalog, ContentLoader, QuerySequencer};
