use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::ApiError;

pub struct UploadedFile {
    pub file_name: Option<String>,
    pub data: Bytes,
}

/// A fully buffered multipart form: text fields plus file parts.
#[derive(Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_some() {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_string);
                let data = field.bytes().await?;
                // Browsers send an empty part for an untouched file input
                if data.is_empty() && file_name.is_none() {
                    continue;
                }
                form.files.insert(name, UploadedFile { file_name, data });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Trimmed value of a text field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.data.is_empty())
    }
}
