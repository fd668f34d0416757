//! Deposit status workflow.
//!
//! ```text
//! pending ──► proses ──► completed
//!    │           │
//!    └───────────┴──► rejected
//! ```
//!
//! Re-applying the current status is a no-op and emits nothing. Weight is
//! independent of status: every assignment emits a confirmation notice.
//! Planning is pure; the handler persists the plan in one write and only then
//! emits the notices.

use sampah_db::models::DepositRow;
use sampah_types::api::UpdateDepositRequest;
use sampah_types::models::{DepositStatus, ParseStatusError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error(transparent)]
    InvalidStatus(#[from] ParseStatusError),

    #[error("Cannot change status from {from} to {to}")]
    NotAllowed {
        from: DepositStatus,
        to: DepositStatus,
    },

    #[error("Weight must be a non-negative number")]
    InvalidWeight,
}

/// Admin performing the update; becomes the picker on `pending → proses`.
#[derive(Debug, Clone, Copy)]
pub struct Picker<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

/// Notification text destined for the deposit owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// Validated form of [`UpdateDepositRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepositUpdate {
    pub status: Option<DepositStatus>,
    pub weight: Option<f64>,
}

impl TryFrom<&UpdateDepositRequest> for DepositUpdate {
    type Error = TransitionError;

    fn try_from(req: &UpdateDepositRequest) -> Result<Self, Self::Error> {
        let status = match req.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<DepositStatus>()?),
        };

        if let Some(weight) = req.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(TransitionError::InvalidWeight);
            }
        }

        Ok(Self {
            status,
            weight: req.weight,
        })
    }
}

/// Column values to write back plus the notices to emit afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub status: DepositStatus,
    pub weight: Option<f64>,
    pub picker_id: Option<String>,
    pub picker_name: Option<String>,
    pub notices: Vec<Notice>,
}

impl UpdatePlan {
    /// Whether anything must be persisted.
    pub fn differs_from(&self, current: &DepositRow) -> bool {
        self.status != current.status
            || self.weight != current.weight
            || self.picker_id != current.picker_id
            || self.picker_name != current.picker_name
    }
}

pub fn plan_update(
    current: &DepositRow,
    update: DepositUpdate,
    picker: Picker<'_>,
) -> Result<UpdatePlan, TransitionError> {
    let mut plan = UpdatePlan {
        status: current.status,
        weight: current.weight,
        picker_id: current.picker_id.clone(),
        picker_name: current.picker_name.clone(),
        notices: Vec::new(),
    };

    if let Some(next) = update.status.filter(|next| *next != current.status) {
        if !current.status.can_transition_to(next) {
            return Err(TransitionError::NotAllowed {
                from: current.status,
                to: next,
            });
        }

        plan.status = next;
        if next == DepositStatus::Proses {
            plan.picker_id = Some(picker.id.to_string());
            plan.picker_name = Some(picker.name.to_string());
        }
        plan.notices.extend(status_notice(next, current, picker.name));
    }

    if let Some(weight) = update.weight {
        plan.weight = Some(weight);
        plan.notices.push(weight_notice(weight));
    }

    Ok(plan)
}

/// Sent to the owner right after a deposit is submitted.
pub fn submission_notice(waste_type: &str, bin_count: u32) -> Notice {
    Notice {
        title: "Penyetoran Berhasil".to_string(),
        message: format!(
            "Penyetoran {} {} tong berhasil dibuat dan menunggu konfirmasi",
            waste_type, bin_count
        ),
    }
}

/// Owner notice for entering `status`. Nothing transitions into `pending`,
/// so it has none.
fn status_notice(status: DepositStatus, deposit: &DepositRow, picker_name: &str) -> Option<Notice> {
    let (waste, bins) = (&deposit.waste_type, deposit.bin_count);
    let (title, message) = match status {
        DepositStatus::Proses => (
            "Penyetoran Sedang Diproses",
            format!(
                "Sampah {} {} tong sedang dalam proses penjemputan oleh {}",
                waste, bins, picker_name
            ),
        ),
        DepositStatus::Completed => (
            "Penyaluran Berhasil",
            format!("Sampah {} {} tong telah selesai diproses", waste, bins),
        ),
        DepositStatus::Rejected => (
            "Penyetoran Ditolak",
            format!("Sampah {} {} tong tidak dapat diproses", waste, bins),
        ),
        DepositStatus::Pending => return None,
    };
    Some(Notice {
        title: title.to_string(),
        message,
    })
}

fn weight_notice(weight: f64) -> Notice {
    Notice {
        title: "Berat Sampah Dikonfirmasi".to_string(),
        message: format!("Berat sampah Anda telah dikonfirmasi: {:.1} Kg", weight),
    }
}
