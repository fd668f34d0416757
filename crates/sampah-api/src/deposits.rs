use axum::{
    Extension, Json,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use sampah_db::models::{DepositChange, NewDeposit};
use sampah_types::api::{
    AdminDepositResponse, DepositEnvelope, DepositList, PhotoUploadResponse, UpdateDepositRequest,
};

use crate::convert::{self, PICKUP_DATE_STORAGE};
use crate::error::{ApiError, InternalExt};
use crate::forms::FormData;
use crate::lifecycle::{DepositUpdate, Picker, plan_update, submission_notice};
use crate::middleware::CurrentUser;
use crate::notifications::emit;
use crate::state::{AppState, run_db};
use crate::storage::Category;

/// Pickup dates are entered as DD/MM/YYYY.
const PICKUP_DATE_INPUT: &str = "%d/%m/%Y";

const REQUIRED_FIELDS: [&str; 7] = [
    "school_name",
    "contact_name",
    "contact_phone",
    "address",
    "pickup_date",
    "bin_count",
    "waste_type",
];

/// Validated submission fields.
#[derive(Debug)]
struct DepositInput {
    school_name: String,
    contact_name: String,
    contact_phone: String,
    address: String,
    pickup_date: NaiveDate,
    bin_count: u32,
    waste_type: String,
}

impl DepositInput {
    fn from_form(form: &FormData) -> Result<Self, ApiError> {
        let missing: Vec<&str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|field| form.text(field).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::validation(format!(
                "All fields are required (missing: {})",
                missing.join(", ")
            )));
        }

        let field = |name: &str| form.text(name).unwrap_or_default().to_string();

        let pickup_date = NaiveDate::parse_from_str(&field("pickup_date"), PICKUP_DATE_INPUT)
            .map_err(|_| ApiError::validation("Invalid date format. Use DD/MM/YYYY"))?;

        let bin_count = field("bin_count")
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ApiError::validation("bin_count must be a positive integer"))?;

        Ok(Self {
            school_name: field("school_name"),
            contact_name: field("contact_name"),
            contact_phone: field("contact_phone"),
            address: field("address"),
            pickup_date,
            bin_count,
            waste_type: field("waste_type"),
        })
    }
}

/// POST /deposits: multipart submission with an optional `photo`.
pub async fn create_deposit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = FormData::read(multipart?).await?;
    let input = DepositInput::from_form(&form)?;

    // The file is written before the record; it is not removed if the insert fails.
    let photo_proof = match form.take_file("photo") {
        Some(file) => Some(
            state
                .storage
                .save(Category::Deposits, file.file_name.as_deref(), &file.data)
                .await
                .internal("Failed to save file")?,
        ),
        None => None,
    };

    let deposit_id = Uuid::new_v4().to_string();
    let uid = user.id.to_string();
    let notice = submission_notice(&input.waste_type, input.bin_count);

    let did = deposit_id.clone();
    let row = run_db(&state, "Failed to create deposit", move |db| {
        let pickup_date = input.pickup_date.format(PICKUP_DATE_STORAGE).to_string();
        db.insert_deposit(&NewDeposit {
            id: &did,
            user_id: &uid,
            school_name: &input.school_name,
            contact_name: &input.contact_name,
            contact_phone: &input.contact_phone,
            address: &input.address,
            pickup_date: &pickup_date,
            bin_count: input.bin_count,
            waste_type: &input.waste_type,
            photo_proof: photo_proof.as_deref(),
        })?;
        db.get_deposit(&did)
    })
    .await?
    .ok_or(ApiError::NotFound("Deposit"))?;

    info!("Deposit {} submitted by {}", deposit_id, user.id);
    emit(&state, &row.user_id, Some(&row.id), vec![notice]).await;

    Ok((
        StatusCode::CREATED,
        Json(DepositEnvelope {
            message: Some("Waste deposit created successfully".to_string()),
            deposit: convert::deposit(row, &state.zone),
        }),
    ))
}

/// GET /deposits: the caller's deposits, newest first.
pub async fn list_my_deposits(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();
    let rows = run_db(&state, "Failed to fetch deposits", move |db| {
        db.list_deposits_for_user(&uid)
    })
    .await?;

    let deposits = rows
        .into_iter()
        .map(|row| convert::deposit(row, &state.zone))
        .collect();
    Ok(Json(DepositList { deposits }))
}

pub async fn get_deposit(
    State(state): State<AppState>,
    Path(deposit_id): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();
    let row = run_db(&state, "Failed to fetch deposit", move |db| {
        db.get_owned_deposit(&deposit_id, &uid)
    })
    .await?
    .ok_or(ApiError::NotFound("Deposit"))?;

    Ok(Json(DepositEnvelope {
        message: None,
        deposit: convert::deposit(row, &state.zone),
    }))
}

/// POST /deposits/{id}/photo: owner attaches or replaces the photo proof.
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(deposit_id): Path<String>,
    Extension(user): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();

    let (did, owner) = (deposit_id.clone(), uid.clone());
    run_db(&state, "Failed to fetch deposit", move |db| {
        db.get_owned_deposit(&did, &owner)
    })
    .await?
    .ok_or(ApiError::NotFound("Deposit"))?;

    let mut form = FormData::read(multipart?).await?;
    let file = form
        .take_file("photo")
        .ok_or_else(|| ApiError::validation("No file uploaded"))?;

    let photo_path = state
        .storage
        .save(Category::Deposits, file.file_name.as_deref(), &file.data)
        .await
        .internal("Failed to save file")?;

    let path = photo_path.clone();
    let updated = run_db(&state, "Failed to update deposit", move |db| {
        db.set_deposit_photo(&deposit_id, &uid, &path)
    })
    .await?;
    if !updated {
        return Err(ApiError::NotFound("Deposit"));
    }

    Ok(Json(PhotoUploadResponse {
        message: "Photo uploaded successfully".to_string(),
        photo_path,
    }))
}

// -- Admin --

/// GET /admin/deposits: every deposit with its owner.
pub async fn list_all_deposits(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, "Failed to fetch deposits", |db| db.list_all_deposits()).await?;

    let deposits: Vec<AdminDepositResponse> = rows
        .into_iter()
        .map(|(deposit, owner)| AdminDepositResponse {
            deposit: convert::deposit(deposit, &state.zone),
            user: owner.map(convert::owner),
        })
        .collect();
    Ok(Json(DepositList { deposits }))
}

/// PUT /admin/deposits/{id}/status: status and/or weight in one write,
/// notifications after the write succeeds.
pub async fn update_deposit_status(
    State(state): State<AppState>,
    Path(deposit_id): Path<String>,
    Extension(admin): Extension<CurrentUser>,
    payload: Result<Json<UpdateDepositRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let update = DepositUpdate::try_from(&req)?;

    let did = deposit_id.clone();
    let current = run_db(&state, "Failed to fetch deposit", move |db| db.get_deposit(&did))
        .await?
        .ok_or(ApiError::NotFound("Deposit"))?;

    let admin_id = admin.id.to_string();
    let plan = plan_update(
        &current,
        update,
        Picker {
            id: &admin_id,
            name: &admin.name,
        },
    )?;

    let row = if plan.differs_from(&current) || !plan.notices.is_empty() {
        let write = plan.clone();
        let did = deposit_id.clone();
        run_db(&state, "Failed to update deposit", move |db| {
            let applied = db.apply_deposit_change(
                &did,
                &DepositChange {
                    status: write.status,
                    weight: write.weight,
                    picker_id: write.picker_id.as_deref(),
                    picker_name: write.picker_name.as_deref(),
                },
            )?;
            if !applied {
                return Ok(None);
            }
            db.get_deposit(&did)
        })
        .await?
        .ok_or(ApiError::NotFound("Deposit"))?
    } else {
        current.clone()
    };

    if plan.status != current.status {
        info!(
            "Deposit {} moved {} -> {} by {}",
            deposit_id, current.status, plan.status, admin.id
        );
    }
    emit(&state, &current.user_id, Some(&current.id), plan.notices).await;

    Ok(Json(DepositEnvelope {
        message: Some("Deposit updated successfully".to_string()),
        deposit: convert::deposit(row, &state.zone),
    }))
}
