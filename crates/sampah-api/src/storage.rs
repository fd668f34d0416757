use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

/// URL prefix the storage root is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Subdirectory of the storage root a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Deposits,
    Profiles,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposits => "deposits",
            Self::Profiles => "profiles",
        }
    }
}

/// Manages uploaded images on disk.
///
/// Files live at `{dir}/{category}/{generated name}` and are referenced from
/// records by their public path `/uploads/{category}/{generated name}`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Write `data` under a freshly generated name and return its public path.
    pub async fn save(
        &self,
        category: Category,
        original_name: Option<&str>,
        data: &[u8],
    ) -> Result<String> {
        let name = unique_file_name(original_name, Utc::now());
        let dir = self.dir.join(category.as_str());
        fs::create_dir_all(&dir).await?;

        let path = dir.join(&name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        info!("Stored upload {} ({} bytes)", path.display(), data.len());
        Ok(format!("{}/{}/{}", PUBLIC_PREFIX, category.as_str(), name))
    }
}

/// `{uuid}_{YYYYMMDDHHMMSS}{.ext}`, keeping the client's extension when it
/// is a plain alphanumeric suffix.
pub fn unique_file_name(original_name: Option<&str>, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}{}",
        Uuid::new_v4(),
        at.format("%Y%m%d%H%M%S"),
        extension_of(original_name)
    )
}

fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}
