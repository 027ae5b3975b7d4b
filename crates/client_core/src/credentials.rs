use async_trait::async_trait;
use tokio::sync::Mutex;

/// Source of the bearer credential attached to every orders request. A seam
/// so apps and tests can supply their own storage.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// Null object for clients constructed without credentials: every operation
/// fails locally with a missing-credential error before any request is made.
pub struct MissingCredentialStore;

#[async_trait]
impl CredentialStore for MissingCredentialStore {
    async fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// In-memory credential holder, loaded by the app from its settings or
/// environment. Token changes take effect on the next request.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.lock().await = Some(token.into());
    }

    pub async fn clear(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn bearer_token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }
}
