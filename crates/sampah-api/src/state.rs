use std::sync::Arc;

use sampah_db::Database;
use sampah_types::time::DisplayZone;

use crate::error::{ApiError, InternalExt};
use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub storage: Storage,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// Offset every response timestamp is rendered in.
    pub zone: DisplayZone,
}

/// Run a blocking DB call off the async runtime.
///
/// Errors from the closure become 500s carrying `message`; anything a
/// handler needs to branch on must be returned inside `T`.
pub async fn run_db<F, T>(state: &AppState, message: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .internal("Internal server error")?
        .internal(message)
}
