use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::middleware::{require_admin, require_auth};
use crate::state::AppState;
use crate::{auth, chat, deposits, notifications, profile};

/// Every API route. Static serving of `/uploads` is mounted by the binary.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/health", get(health));

    let admin_routes = Router::new()
        .route("/admin/deposits", get(deposits::list_all_deposits))
        .route(
            "/admin/deposits/{id}/status",
            put(deposits::update_deposit_status),
        )
        .route_layer(middleware::from_fn(require_admin));

    let protected_routes = Router::new()
        .route("/me", get(profile::get_me))
        .route("/profile", put(profile::update_profile))
        .route(
            "/deposits",
            get(deposits::list_my_deposits).post(deposits::create_deposit),
        )
        .route("/deposits/{id}", get(deposits::get_deposit))
        .route("/deposits/{id}/photo", post(deposits::upload_photo))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/chat/list", get(chat::chat_list))
        .route("/chat/unread-count", get(chat::unread_count))
        .route("/chat/admins", get(chat::list_admins))
        .route(
            "/chat/{user_id}/messages",
            get(chat::get_messages).post(chat::send_message),
        )
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
