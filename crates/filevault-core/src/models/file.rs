use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only snapshot of a stored file as listed by the backend.
///
/// The listing nests size and type under `content` and the owner under `user`;
/// decoding flattens both. Serialization is flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FileRecordWire")]
pub struct FileRecord {
    pub id: u64,
    pub original_filename: String,
    pub size: i64,
    pub mime_type: String,
    pub owner_username: String,
    pub created_at: DateTime<Utc>,
    pub download_count: i64,
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
struct FileRecordWire {
    id: u64,
    original_filename: String,
    #[serde(default)]
    content: FileContentWire,
    #[serde(default)]
    user: FileOwnerWire,
    created_at: DateTime<Utc>,
    #[serde(default)]
    download_count: i64,
    #[serde(default)]
    is_public: bool,
}

#[derive(Debug, Default, Deserialize)]
struct FileContentWire {
    #[serde(default)]
    file_size: i64,
    #[serde(default)]
    mime_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct FileOwnerWire {
    #[serde(default)]
    username: String,
}

impl From<FileRecordWire> for FileRecord {
    fn from(wire: FileRecordWire) -> Self {
        FileRecord {
            id: wire.id,
            original_filename: wire.original_filename,
            size: wire.content.file_size,
            mime_type: wire.content.mime_type,
            owner_username: wire.user.username,
            created_at: wire.created_at,
            download_count: wire.download_count,
            is_public: wire.is_public,
        }
    }
}

/// One file accepted by `POST /files/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: u64,
    pub original_filename: String,
    pub size: i64,
    pub mime_type: String,
}

/// Outcome of a batch upload: the backend's message plus the accepted files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub message: String,
    pub files: Vec<UploadedFile>,
}

impl UploadReceipt {
    pub fn total_bytes(&self) -> i64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_record_flattens_nested_listing() {
        let body = serde_json::json!({
            "id": 42,
            "user_id": 1,
            "original_filename": "report.pdf",
            "is_public": false,
            "download_count": 3,
            "created_at": "2024-05-01T10:20:30.123456+02:00",
            "updated_at": "2024-05-01T10:20:30.123456+02:00",
            "user": {"id": 1, "username": "alice", "email": "a@b.com"},
            "content": {"sha256_hash": "ab", "file_size": 2048, "mime_type": "application/pdf"}
        });
        let record: FileRecord = serde_json::from_value(body).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.size, 2048);
        assert_eq!(record.mime_type, "application/pdf");
        assert_eq!(record.owner_username, "alice");
        assert_eq!(record.download_count, 3);
        assert_eq!(record.created_at.to_rfc3339(), "2024-05-01T08:20:30.123456+00:00");
    }

    #[test]
    fn file_record_serializes_flat() {
        let body = serde_json::json!({
            "id": 1,
            "original_filename": "a.txt",
            "created_at": "2024-05-01T00:00:00Z",
            "content": {"file_size": 5, "mime_type": "text/plain"},
            "user": {"username": "bob"}
        });
        let record: FileRecord = serde_json::from_value(body).unwrap();
        let flat = serde_json::to_value(&record).unwrap();
        assert_eq!(flat["size"], 5);
        assert_eq!(flat["owner_username"], "bob");
        assert!(flat.get("content").is_none());
    }

    #[test]
    fn upload_receipt_total() {
        let receipt = UploadReceipt {
            message: "Successfully uploaded 2 file(s)".to_string(),
            files: vec![
                UploadedFile {
                    id: 1,
                    original_filename: "a".to_string(),
                    size: 10,
                    mime_type: "text/plain".to_string(),
                },
                UploadedFile {
                    id: 2,
                    original_filename: "b".to_string(),
                    size: 15,
                    mime_type: "text/plain".to_string(),
                },
            ],
        };
        assert_eq!(receipt.total_bytes(), 25);
    }
}
