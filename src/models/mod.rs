// src/models/mod.rs

//! Domain models for the Pathwise client.
//!
//! This module contains all data structures used throughout the library,
//! organized by their primary purpose.

mod builtin;
mod config;
mod content;
mod session;

// Re-export all public types
pub use config::{ApiConfig, AuthConfig, ChatConfig, Config, LoaderConfig, LoggingConfig};
pub use content::{
    Career, Content, ContentItem, ContentKind, ContentQuery, DEFAULT_TIMEOUT, InterviewQuestion,
    LoadResult, PracticeProblem, Resource, Source, slugify,
};
pub use session::{Session, User, token_expiry};
pub(crate) use session::default_name;
