//! Service layer for the Pathwise client.
//!
//! Each service is an explicitly constructed object holding its own state:
//! - Authentication with provider/backend fallback (`AuthService`)
//! - The career assistant conversation (`ChatService`)
//! - Backend health probing (`check_health`)

mod auth;
mod chat;
mod health;

pub use auth::{AuthService, BackendAuth, IdentityProvider, SupabaseProvider};
pub use chat::{ChatMessage, ChatReply, ChatService, DEGRADED_CONFIDENCE, Role, degraded_reply};
pub use health::{HealthStatus, check_health};
