/// Database row types. These map directly to SQLite rows.
/// Distinct from sampah-types API models to keep the DB layer independent.
use sampah_types::models::{DepositStatus, NotificationKind, Role};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    /// `None` for accounts created through an external identity provider.
    pub password: Option<String>,
    pub picture: Option<String>,
    pub school_name: Option<String>,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct DepositRow {
    pub id: String,
    pub user_id: String,
    pub school_name: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub address: String,
    /// `YYYY-MM-DD`
    pub pickup_date: String,
    pub bin_count: u32,
    pub waste_type: String,
    pub photo_proof: Option<String>,
    pub weight: Option<f64>,
    pub status: DepositStatus,
    pub picker_id: Option<String>,
    pub picker_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Owner columns joined onto a deposit for the admin listing.
#[derive(Debug, Clone)]
pub struct OwnerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub school_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub deposit_id: Option<String>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ChatMessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub sender_name: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

/// Latest message and unread count for one conversation.
#[derive(Debug, Clone)]
pub struct ChatSummaryRow {
    pub counterpart_id: String,
    pub counterpart_name: Option<String>,
    pub counterpart_school: Option<String>,
    pub last_message: String,
    pub last_time: String,
    pub unread_count: u64,
}

// -- Inserts --

pub struct NewUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub school_name: Option<&'a str>,
    pub role: Role,
}

/// Profile fields to overwrite; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProfileChange<'a> {
    pub name: Option<&'a str>,
    pub school_name: Option<&'a str>,
    pub picture: Option<&'a str>,
}

pub struct NewDeposit<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub school_name: &'a str,
    pub contact_name: &'a str,
    pub contact_phone: &'a str,
    pub address: &'a str,
    pub pickup_date: &'a str,
    pub bin_count: u32,
    pub waste_type: &'a str,
    pub photo_proof: Option<&'a str>,
}

/// Result of applying an admin update: the full column set written back in
/// one statement.
pub struct DepositChange<'a> {
    pub status: DepositStatus,
    pub weight: Option<f64>,
    pub picker_id: Option<&'a str>,
    pub picker_name: Option<&'a str>,
}

pub struct NewNotification<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub deposit_id: Option<&'a str>,
    pub title: &'a str,
    pub message: &'a str,
    pub kind: NotificationKind,
}
