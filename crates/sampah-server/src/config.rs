use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

use sampah_types::time::{DEFAULT_UTC_OFFSET_HOURS, DisplayZone};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

/// Credentials for the admin account created at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub zone: DisplayZone,
    pub token_ttl: chrono::Duration,
    pub max_upload_bytes: usize,
    pub admin: Option<AdminSeed>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("SAMPAH_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SAMPAH_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let host = var("SAMPAH_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&var, "SAMPAH_PORT", 8080)?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let offset_hours: i32 = parse_or(&var, "SAMPAH_UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS)?;
        let zone = DisplayZone::from_hours(offset_hours)
            .with_context(|| format!("SAMPAH_UTC_OFFSET_HOURS out of range: {}", offset_hours))?;

        let ttl_hours: i64 = parse_or(&var, "SAMPAH_TOKEN_TTL_HOURS", 720)?;
        if ttl_hours <= 0 {
            bail!("SAMPAH_TOKEN_TTL_HOURS must be positive");
        }

        let max_upload_mb: usize = parse_or(&var, "SAMPAH_MAX_UPLOAD_MB", 10)?;
        let Some(max_upload_bytes) = max_upload_mb.checked_mul(1024 * 1024) else {
            bail!("SAMPAH_MAX_UPLOAD_MB too large: {}", max_upload_mb);
        };

        let admin = match (var("SAMPAH_ADMIN_EMAIL"), var("SAMPAH_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: var("SAMPAH_ADMIN_NAME").unwrap_or_else(|| "Admin".into()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            jwt_secret,
            db_path: var("SAMPAH_DB_PATH").unwrap_or_else(|| "sampah.db".into()).into(),
            addr,
            upload_dir: var("SAMPAH_UPLOAD_DIR").unwrap_or_else(|| "./uploads".into()).into(),
            zone,
            token_ttl: chrono::Duration::hours(ttl_hours),
            max_upload_bytes,
            admin,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {}", key, raw)),
        None => Ok(default),
    }
}
