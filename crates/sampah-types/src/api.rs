use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{DepositStatus, NotificationKind, Role};

// -- JWT Claims --

/// Bearer token claims. The role is deliberately absent: it is looked up on
/// every request so a demotion takes effect without re-login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub school_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
}

// -- Profile --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub picture: Option<String>,
    pub school_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: UserProfile,
}

// -- Deposits --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub school_name: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub address: String,
    pub pickup_date: NaiveDate,
    pub bin_count: u32,
    pub waste_type: String,
    pub photo_proof: Option<String>,
    pub weight: Option<f64>,
    pub status: DepositStatus,
    pub picker_id: Option<Uuid>,
    pub picker_name: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// Owner summary attached to deposits in the admin listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositOwner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub school_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDepositResponse {
    #[serde(flatten)]
    pub deposit: DepositResponse,
    pub user: Option<DepositOwner>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub deposit: DepositResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositList<T> {
    pub deposits: Vec<T>,
}

/// Admin status/weight update. An empty status string counts as absent.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDepositRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoUploadResponse {
    pub message: String,
    pub photo_path: String,
}

// -- Notifications --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationList {
    pub notifications: Vec<NotificationResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Chat --

#[derive(Debug, Deserialize)]
pub struct SendChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub sender_name: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentChatMessage {
    pub message: ChatMessageResponse,
}

/// Public view of the other party in a chat thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPartner {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub picture: Option<String>,
    pub school_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatThreadResponse {
    pub messages: Vec<ChatMessageResponse>,
    pub user: ChatPartner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatListEntry {
    pub user_id: Uuid,
    pub user_name: String,
    pub school_name: String,
    pub last_message: String,
    pub last_time: DateTime<FixedOffset>,
    pub unread_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatList {
    pub chats: Vec<ChatListEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminContact {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminContactList {
    pub admins: Vec<AdminContact>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
