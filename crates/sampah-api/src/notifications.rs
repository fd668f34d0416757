use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::{debug, warn};
use uuid::Uuid;

use sampah_db::models::NewNotification;
use sampah_types::api::{MessageResponse, NotificationList, UnreadCount};
use sampah_types::models::NotificationKind;

use crate::convert;
use crate::error::ApiError;
use crate::lifecycle::Notice;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_db};

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();
    let rows = run_db(&state, "Failed to fetch notifications", move |db| {
        db.list_notifications(&uid)
    })
    .await?;

    let notifications = rows
        .into_iter()
        .map(|row| convert::notification(row, &state.zone))
        .collect();

    Ok(Json(NotificationList { notifications }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();
    let unread_count = run_db(&state, "Failed to count notifications", move |db| {
        db.count_unread_notifications(&uid)
    })
    .await?;

    Ok(Json(UnreadCount { unread_count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();
    let updated = run_db(&state, "Failed to update notification", move |db| {
        db.mark_notification_read(&notification_id, &uid)
    })
    .await?;

    if !updated {
        return Err(ApiError::NotFound("Notification"));
    }

    Ok(Json(MessageResponse {
        message: "Notification marked as read".to_string(),
    }))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();
    let n = run_db(&state, "Failed to update notifications", move |db| {
        db.mark_all_notifications_read(&uid)
    })
    .await?;
    debug!("Marked {} notifications read for {}", n, user.id);

    Ok(Json(MessageResponse {
        message: "All notifications marked as read".to_string(),
    }))
}

/// Record notices for `user_id`. Best-effort: a failed insert is logged and
/// skipped, never surfaced to the caller.
pub(crate) async fn emit(
    state: &AppState,
    user_id: &str,
    deposit_id: Option<&str>,
    notices: Vec<Notice>,
) {
    for notice in notices {
        let id = Uuid::new_v4().to_string();
        let uid = user_id.to_string();
        let did = deposit_id.map(str::to_string);
        let title = notice.title.clone();

        let result = run_db(state, "Failed to record notification", move |db| {
            db.insert_notification(&NewNotification {
                id: &id,
                user_id: &uid,
                deposit_id: did.as_deref(),
                title: &notice.title,
                message: &notice.message,
                kind: NotificationKind::DepositUpdate,
            })
        })
        .await;

        if let Err(e) = result {
            warn!("Dropped notification '{}' for {}: {:?}", title, user_id, e);
        }
    }
}
