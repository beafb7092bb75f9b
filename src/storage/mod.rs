//! Session persistence.
//!
//! The signed-in session outlives the process, the way a browser keeps its
//! token in local storage:
//!
//! ```text
//! storage/
//! └── session.json   # { access_token, token_type, user, expires_at }
//! ```

pub mod local;

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Session;

// Re-export for convenience
pub use local::LocalSessionStore;

/// Trait for session storage backends.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session, if any.
    async fn load(&self) -> Result<Option<Session>>;

    /// Replace the stored session.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Forget the stored session. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<()>;
}

/// In-process store for tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        // A poisoned slot still holds a whole session value.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        Ok(self.slot().clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
