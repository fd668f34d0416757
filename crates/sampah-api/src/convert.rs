//! Row → response conversions. Corrupt stored values are logged and replaced
//! with defaults rather than failing the whole listing.

use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use sampah_db::models::{ChatMessageRow, DepositRow, NotificationRow, OwnerRow, UserRow};
use sampah_types::api::{
    ChatMessageResponse, ChatPartner, DepositOwner, DepositResponse, NotificationResponse,
    UserProfile,
};
use sampah_types::time::DisplayZone;

/// Stored form of a pickup date.
pub(crate) const PICKUP_DATE_STORAGE: &str = "%Y-%m-%d";

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn user_profile(row: UserRow) -> UserProfile {
    UserProfile {
        id: parse_uuid(&row.id, "user id"),
        name: row.name,
        email: row.email,
        role: row.role,
        picture: row.picture,
        school_name: row.school_name,
    }
}

pub(crate) fn chat_partner(row: UserRow) -> ChatPartner {
    ChatPartner {
        id: parse_uuid(&row.id, "user id"),
        name: row.name,
        role: row.role,
        picture: row.picture,
        school_name: row.school_name,
    }
}

pub(crate) fn deposit(row: DepositRow, zone: &DisplayZone) -> DepositResponse {
    let pickup_date = NaiveDate::parse_from_str(&row.pickup_date, PICKUP_DATE_STORAGE)
        .unwrap_or_else(|e| {
            warn!("Corrupt pickup_date '{}' on deposit '{}': {}", row.pickup_date, row.id, e);
            NaiveDate::default()
        });

    DepositResponse {
        id: parse_uuid(&row.id, "deposit id"),
        user_id: parse_uuid(&row.user_id, "deposit owner"),
        school_name: row.school_name,
        contact_name: row.contact_name,
        contact_phone: row.contact_phone,
        address: row.address,
        pickup_date,
        bin_count: row.bin_count,
        waste_type: row.waste_type,
        photo_proof: row.photo_proof,
        weight: row.weight,
        status: row.status,
        picker_id: row.picker_id.as_deref().map(|id| parse_uuid(id, "picker id")),
        picker_name: row.picker_name,
        created_at: zone.localize(&row.created_at),
        updated_at: zone.localize(&row.updated_at),
    }
}

pub(crate) fn owner(row: OwnerRow) -> DepositOwner {
    DepositOwner {
        id: parse_uuid(&row.id, "user id"),
        name: row.name,
        email: row.email,
        school_name: row.school_name,
    }
}

pub(crate) fn notification(row: NotificationRow, zone: &DisplayZone) -> NotificationResponse {
    NotificationResponse {
        id: parse_uuid(&row.id, "notification id"),
        user_id: parse_uuid(&row.user_id, "notification user"),
        deposit_id: row.deposit_id.as_deref().map(|id| parse_uuid(id, "notification deposit")),
        title: row.title,
        message: row.message,
        kind: row.kind,
        is_read: row.is_read,
        created_at: zone.localize(&row.created_at),
    }
}

pub(crate) fn chat_message(row: ChatMessageRow, zone: &DisplayZone) -> ChatMessageResponse {
    ChatMessageResponse {
        id: parse_uuid(&row.id, "message id"),
        sender_id: parse_uuid(&row.sender_id, "message sender"),
        receiver_id: parse_uuid(&row.receiver_id, "message receiver"),
        sender_name: row.sender_name,
        message: row.message,
        is_read: row.is_read,
        created_at: zone.localize(&row.created_at),
    }
}
