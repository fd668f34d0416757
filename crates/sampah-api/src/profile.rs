use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    response::IntoResponse,
};
use tracing::info;

use sampah_db::models::ProfileChange;
use sampah_types::api::ProfileResponse;

use crate::convert;
use crate::error::{ApiError, InternalExt};
use crate::forms::FormData;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_db};
use crate::storage::Category;

/// GET /me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = user.id.to_string();
    let row = run_db(&state, "Failed to load profile", move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(ProfileResponse {
        message: None,
        user: convert::user_profile(row),
    }))
}

/// PUT /profile: multipart with optional `name`, `school_name` and
/// `picture`. Blank fields leave the stored value untouched.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = FormData::read(multipart?).await?;
    let name = form.text("name").map(str::to_string);
    let school_name = form.text("school_name").map(str::to_string);

    let picture = match form.take_file("picture") {
        Some(file) => Some(
            state
                .storage
                .save(Category::Profiles, file.file_name.as_deref(), &file.data)
                .await
                .internal("Failed to save file")?,
        ),
        None => None,
    };

    let uid = user.id.to_string();
    let row = run_db(&state, "Failed to update profile", move |db| {
        let change = ProfileChange {
            name: name.as_deref(),
            school_name: school_name.as_deref(),
            picture: picture.as_deref(),
        };
        if !db.update_profile(&uid, &change)? {
            return Ok(None);
        }
        db.get_user_by_id(&uid)
    })
    .await?
    .ok_or(ApiError::NotFound("User"))?;

    info!("Profile updated for {}", user.id);

    Ok(Json(ProfileResponse {
        message: Some("Profile updated successfully".to_string()),
        user: convert::user_profile(row),
    }))
}
