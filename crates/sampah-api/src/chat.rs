use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use uuid::Uuid;

use sampah_db::models::ChatSummaryRow;
use sampah_types::api::{
    AdminContact, AdminContactList, ChatList, ChatListEntry, ChatThreadResponse, SendChatRequest,
    SentChatMessage, UnreadCount,
};
use sampah_types::time::DisplayZone;

use crate::convert::{self, parse_uuid};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_db};

/// Name shown to regular users for every admin conversation.
const ADMIN_DISPLAY_NAME: &str = "Admin";

fn parse_counterpart(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation("Invalid user_id"))
}

/// GET /chat/list
///
/// Admins see every counterpart they have exchanged messages with. Regular
/// users see one entry per admin they have talked to, labelled "Admin".
pub async fn chat_list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();

    let chats = if user.role.is_admin() {
        let rows = run_db(&state, "Failed to fetch chat list", move |db| {
            db.chat_summaries(&uid)
        })
        .await?;
        rows.into_iter()
            .map(|row| {
                let name = row.counterpart_name.clone().unwrap_or_default();
                let school = row.counterpart_school.clone().unwrap_or_default();
                list_entry(row, name, school, &state.zone)
            })
            .collect()
    } else {
        let rows = run_db(&state, "Failed to fetch chat list", move |db| {
            let mut summaries = Vec::new();
            for admin in db.list_admins()? {
                if let Some(summary) = db.thread_summary(&uid, &admin.id)? {
                    summaries.push(summary);
                }
            }
            Ok(summaries)
        })
        .await?;
        rows.into_iter()
            .map(|row| list_entry(row, ADMIN_DISPLAY_NAME.to_string(), String::new(), &state.zone))
            .collect()
    };

    Ok(Json(ChatList { chats }))
}

fn list_entry(
    row: ChatSummaryRow,
    user_name: String,
    school_name: String,
    zone: &DisplayZone,
) -> ChatListEntry {
    ChatListEntry {
        user_id: parse_uuid(&row.counterpart_id, "chat counterpart"),
        user_name,
        school_name,
        last_message: row.last_message,
        last_time: zone.localize(&row.last_time),
        unread_count: row.unread_count,
    }
}

/// GET /chat/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();
    let unread_count = run_db(&state, "Failed to count messages", move |db| {
        db.count_unread_messages(&uid)
    })
    .await?;

    Ok(Json(UnreadCount { unread_count }))
}

/// GET /chat/admins: who a regular user can start a conversation with.
pub async fn list_admins(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, "Failed to fetch admins", |db| db.list_admins()).await?;

    let admins = rows
        .into_iter()
        .map(|row| AdminContact {
            id: parse_uuid(&row.id, "user id"),
            name: row.name,
        })
        .collect();
    Ok(Json(AdminContactList { admins }))
}

/// GET /chat/{user_id}/messages
///
/// Marks everything the counterpart sent to the caller as read, then returns
/// the whole thread oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let other = parse_counterpart(&user_id)?.to_string();
    let me = user.id.to_string();

    let (partner, messages) = run_db(&state, "Failed to fetch messages", move |db| {
        let Some(partner) = db.get_user_by_id(&other)? else {
            return Ok(None);
        };
        let marked = db.mark_thread_read(&me, &other)?;
        if marked > 0 {
            debug!("Marked {} messages from {} read for {}", marked, other, me);
        }
        let messages = db.get_thread(&me, &other)?;
        Ok(Some((partner, messages)))
    })
    .await?
    .ok_or(ApiError::NotFound("User"))?;

    let messages = messages
        .into_iter()
        .map(|row| convert::chat_message(row, &state.zone))
        .collect();

    Ok(Json(ChatThreadResponse {
        messages,
        user: convert::chat_partner(partner),
    }))
}

/// POST /chat/{user_id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<SendChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let receiver = parse_counterpart(&user_id)?;

    let body = req.message.trim().to_string();
    if body.is_empty() {
        return Err(ApiError::validation("Message is required"));
    }
    if receiver == user.id {
        return Err(ApiError::validation("Cannot send a message to yourself"));
    }

    let message_id = Uuid::new_v4().to_string();
    let (sender, receiver) = (user.id.to_string(), receiver.to_string());
    let row = run_db(&state, "Failed to send message", move |db| {
        if db.get_user_by_id(&receiver)?.is_none() {
            return Ok(None);
        }
        db.insert_chat_message(&message_id, &sender, &receiver, &body)?;
        db.get_chat_message(&message_id)
    })
    .await?
    .ok_or(ApiError::NotFound("User"))?;

    debug!("Chat message {} -> {}", row.sender_id, row.receiver_id);

    Ok((
        StatusCode::CREATED,
        Json(SentChatMessage {
            message: convert::chat_message(row, &state.zone),
        }),
    ))
}
