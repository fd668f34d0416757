use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use sampah_db::models::NewUser;
use sampah_db::{Database, is_unique_violation};
use sampah_types::api::{Claims, LoginRequest, RegisterRequest, TokenResponse};
use sampah_types::models::Role;

use crate::error::{ApiError, InternalExt};
use crate::state::{AppState, run_db};

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(mut req) = payload?;
    req.email = req.email.trim().to_ascii_lowercase();
    req.validate()?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    let email = req.email;
    let school_name = req
        .school_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    // Check if email is taken
    let lookup = email.clone();
    if run_db(&state, "Failed to create user", move |db| db.get_user_by_email(&lookup))
        .await?
        .is_some()
    {
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password(&req.password).internal("Failed to hash password")?;
    let user_id = Uuid::new_v4();

    let uid = user_id.to_string();
    let mail = email.clone();
    let created = run_db(&state, "Failed to create user", move |db| {
        let user = NewUser {
            id: &uid,
            name: &name,
            email: &mail,
            password_hash: Some(&password_hash),
            school_name: school_name.as_deref(),
            role: Role::User,
        };
        match db.create_user(&user) {
            Ok(()) => Ok(true),
            // lost a race with a concurrent registration
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e),
        }
    })
    .await?;
    if !created {
        return Err(ApiError::DuplicateEmail);
    }

    info!("Registered user {} ({})", user_id, email);

    let token = create_token(&state.jwt_secret, user_id, &email, state.token_ttl)
        .internal("Failed to generate token")?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            message: "registration successful".to_string(),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(mut req) = payload?;
    req.email = req.email.trim().to_ascii_lowercase();
    req.validate()?;
    let email = req.email;

    let user = run_db(&state, "Failed to load account", move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized("Invalid email or password"))?;

    // Accounts created through an external provider have no password
    let Some(stored_hash) = user.password.as_deref() else {
        return Err(ApiError::validation(
            "This account has no password. Sign in with the provider it was created with",
        ));
    };

    if !verify_password(&req.password, stored_hash).internal("Failed to verify password")? {
        return Err(ApiError::Unauthorized("Invalid email or password"));
    }

    let user_id: Uuid = user.id.parse().internal("Corrupt user id")?;
    let token = create_token(&state.jwt_secret, user_id, &user.email, state.token_ttl)
        .internal("Failed to generate token")?;

    Ok(Json(TokenResponse {
        message: "login success".to_string(),
        token,
    }))
}

/// Create the configured admin account unless that email is already taken.
/// Returns true when an account was created.
pub fn seed_admin(db: &Database, name: &str, email: &str, password: &str) -> anyhow::Result<bool> {
    let email = email.trim().to_ascii_lowercase();
    if db.get_user_by_email(&email)?.is_some() {
        return Ok(false);
    }

    let password_hash = hash_password(password)?;
    let id = Uuid::new_v4().to_string();
    db.create_user(&NewUser {
        id: &id,
        name,
        email: &email,
        password_hash: Some(&password_hash),
        school_name: None,
        role: Role::Admin,
    })?;

    info!("Seeded admin account {}", email);
    Ok(true)
}

pub fn create_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    ttl: chrono::Duration,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Hash with Argon2id and a random salt.
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("argon2 hash failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| anyhow::anyhow!("stored hash unreadable: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
