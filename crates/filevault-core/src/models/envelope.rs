use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{VaultError, VaultResult};

/// Standard backend response wrapper: `{success, message, data, error}`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    /// Decode an envelope from a raw JSON body.
    pub fn from_value(value: serde_json::Value) -> VaultResult<Self> {
        serde_json::from_value(value).map_err(VaultError::from)
    }

    /// Take `data`, failing if the backend sent none.
    pub fn into_data(self) -> VaultResult<T> {
        self.data
            .ok_or_else(|| VaultError::Decode("response has no data field".to_string()))
    }
}

/// `data` of the file listing endpoint.
#[derive(Debug, Deserialize)]
pub struct FileListData<T> {
    #[serde(
        default = "Vec::new",
        deserialize_with = "null_as_empty",
        bound(deserialize = "T: Deserialize<'de>")
    )]
    pub files: Vec<T>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_without_data_is_decode_error() {
        let env: ApiEnvelope<serde_json::Value> =
            ApiEnvelope::from_value(serde_json::json!({"success": true, "message": "ok"})).unwrap();
        assert_eq!(env.message, "ok");
        assert!(matches!(env.into_data(), Err(VaultError::Decode(_))));
    }

    #[test]
    fn null_file_list_is_empty() {
        let data: FileListData<u32> =
            serde_json::from_value(serde_json::json!({"files": null})).unwrap();
        assert!(data.files.is_empty());
    }

    #[test]
    fn missing_file_list_is_empty() {
        let data: FileListData<u32> = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(data.files.is_empty());

        let data: FileListData<u32> =
            serde_json::from_value(serde_json::json!({"files": [1, 2]})).unwrap();
        assert_eq!(data.files, vec![1, 2]);
    }
}
