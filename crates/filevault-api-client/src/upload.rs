//! Local file payloads for multipart uploads.

use std::path::{Component, Path};

use bytes::Bytes;
use filevault_core::constants::UPLOAD_FIELD;
use filevault_core::{VaultError, VaultResult};
use reqwest::multipart::{Form, Part};

const FALLBACK_BINARY_MIME: &str = "application/octet-stream";
const FALLBACK_TEXT_MIME: &str = "text/plain";

/// One local file handed to the backend as-is. Deduplication happens server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    /// Wrap in-memory content, detecting its content type.
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            file_name: file_name.into(),
            mime_type: detect_mime(&bytes).to_string(),
            bytes,
        }
    }

    /// Read a file from disk. Paths containing `..` are rejected.
    pub async fn from_path(path: impl AsRef<Path>) -> VaultResult<Self> {
        let path = path.as_ref();
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(VaultError::InvalidInput(format!(
                "Invalid path: {}",
                path.display()
            )));
        }
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            VaultError::InvalidInput(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn to_part(&self) -> VaultResult<Part> {
        Part::bytes(self.bytes.to_vec())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime_type)
            .map_err(|e| {
                VaultError::InvalidInput(format!(
                    "Invalid content type '{}' for {}: {}",
                    self.mime_type, self.file_name, e
                ))
            })
    }
}

/// Content type declared for a part. The backend compares its base type with
/// what it sniffs, so text content must not be declared as binary.
pub fn detect_mime(bytes: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type();
    }
    if std::str::from_utf8(bytes).is_ok() {
        FALLBACK_TEXT_MIME
    } else {
        FALLBACK_BINARY_MIME
    }
}

/// One multipart form carrying every file under the same field name.
pub(crate) fn build_form(files: &[UploadFile]) -> VaultResult<Form> {
    let mut form = Form::new();
    for file in files {
        form = form.part(UPLOAD_FIELD, file.to_part()?);
    }
    Ok(form)
}
