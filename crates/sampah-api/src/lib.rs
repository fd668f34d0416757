pub mod auth;
pub mod chat;
mod convert;
pub mod deposits;
pub mod error;
mod forms;
pub mod lifecycle;
pub mod middleware;
pub mod notifications;
pub mod profile;
pub mod routes;
pub mod state;
pub mod storage;

pub use routes::router;
pub use state::{AppState, AppStateInner};
