//! Gateway behaviour against a mocked backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use filevault_api_client::{
    ApiClient, Credential, CredentialStore, FileCredentialStore, Session, SessionEndReason,
    SessionState, UploadFile,
};
use filevault_core::constants::{CREDENTIAL_KEY, UNKNOWN_ERROR_MESSAGE, UNREACHABLE_MESSAGE};
use filevault_core::{ClientConfig, FilterState, Pagination, VaultError};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

async fn setup() -> (ServerGuard, ApiClient) {
    let server = Server::new_async().await;
    let client = ApiClient::new(format!("{}/api/v1", server.url()), Session::in_memory()).unwrap();
    (server, client)
}

fn envelope(data: serde_json::Value) -> String {
    json!({"success": true, "message": "ok", "data": data}).to_string()
}

fn file_json(id: u64, name: &str, size: i64) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": 1,
        "original_filename": name,
        "is_public": false,
        "download_count": 0,
        "created_at": "2024-05-01T10:00:00Z",
        "user": {"id": 1, "username": "alice"},
        "content": {"file_size": size, "mime_type": "text/plain"}
    })
}

#[tokio::test]
async fn attaches_bearer_credential() {
    let (mut server, client) = setup().await;
    client
        .session()
        .set_credential(Credential::new("t1"))
        .await
        .unwrap();

    let mock = server
        .mock("GET", "/api/v1/profile")
        .match_header("authorization", "Bearer t1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({"id": 1, "username": "alice", "email": "a@b.com"})))
        .create_async()
        .await;

    let profile = client.profile().await.unwrap();
    assert_eq!(profile.username, "alice");
    mock.assert_async().await;
}

#[tokio::test]
async fn omits_authorization_without_credential() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("POST", "/api/v1/auth/login")
        .match_header("authorization", Matcher::Missing)
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"email": "a@b.com", "password": "secret1"})))
        .with_status(200)
        .with_body(envelope(json!({
            "token": "t1",
            "user": {"id": 1, "username": "a", "email": "a@b.com"}
        })))
        .create_async()
        .await;

    let auth = client.login("a@b.com", "secret1").await.unwrap();
    assert_eq!(auth.token, "t1");
    assert_eq!(auth.user.email, "a@b.com");
    mock.assert_async().await;
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn unauthorized_clears_session_and_persisted_credential() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));
    let session = Session::restore(store.clone()).await.unwrap();
    session.set_credential(Credential::new("stale")).await.unwrap();

    let mut server = Server::new_async().await;
    let client = ApiClient::new(format!("{}/api/v1", server.url()), session.clone()).unwrap();
    let _mock = server
        .mock("GET", "/api/v1/storage/stats")
        .with_status(401)
        .with_body(json!({"success": false, "error": "Invalid token"}).to_string())
        .create_async()
        .await;

    let err = client.storage_stats().await.unwrap_err();
    assert_eq!(err, VaultError::Unauthorized("Invalid token".to_string()));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state(), SessionState::Unauthenticated);
    assert_eq!(snapshot.ended, Some(SessionEndReason::Expired));
    assert_eq!(store.load(CREDENTIAL_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn error_message_comes_from_body() {
    let (mut server, client) = setup().await;
    let _mock = server
        .mock("DELETE", "/api/v1/files/7")
        .with_status(403)
        .with_body(
            json!({"success": false, "error": "Access denied: you do not own this file"})
                .to_string(),
        )
        .create_async()
        .await;

    let err = client.delete_file(7).await.unwrap_err();
    assert_eq!(
        err,
        VaultError::Validation {
            status: 403,
            message: "Access denied: you do not own this file".to_string()
        }
    );
}

#[tokio::test]
async fn non_json_error_body_uses_generic_message() {
    let (mut server, client) = setup().await;
    let _mock = server
        .mock("GET", "/api/v1/storage/stats")
        .with_status(500)
        .with_body("<html>Internal Server Error</html>")
        .create_async()
        .await;

    let err = client.storage_stats().await.unwrap_err();
    assert_eq!(
        err,
        VaultError::Server {
            status: 500,
            message: UNKNOWN_ERROR_MESSAGE.to_string()
        }
    );
}

#[tokio::test]
async fn json_error_without_message_reports_status() {
    let (mut server, client) = setup().await;
    let _mock = server
        .mock("GET", "/api/v1/files/3/download")
        .with_status(404)
        .with_body(json!({"success": false}).to_string())
        .create_async()
        .await;

    let err = client.download_file(3).await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed with status 404");
}

#[tokio::test]
async fn no_content_is_success() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("DELETE", "/api/v1/files/9")
        .with_status(204)
        .create_async()
        .await;

    client.delete_file(9).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let client = ApiClient::new("http://127.0.0.1:9/api/v1", Session::in_memory()).unwrap();
    let err = client.profile().await.unwrap_err();
    assert_eq!(err, VaultError::Transport(UNREACHABLE_MESSAGE.to_string()));
}

#[tokio::test]
async fn list_files_sends_filters_and_flattens_records() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("GET", "/api/v1/files")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
            Matcher::UrlEncoded("filename".into(), "report".into()),
            Matcher::UrlEncoded("min_size".into(), "1024".into()),
        ]))
        .with_status(200)
        .with_body(envelope(json!({"files": [file_json(1, "report.txt", 2048)]})))
        .create_async()
        .await;

    let filter = FilterState {
        filename: Some("report".to_string()),
        min_size: Some(1024),
        ..FilterState::default()
    };
    let files = client
        .list_files(&filter, Pagination::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].size, 2048);
    assert_eq!(files[0].owner_username, "alice");
}

#[tokio::test]
async fn upload_sends_every_file_under_one_field() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("POST", "/api/v1/files/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="files"; filename="a.txt""#.to_string()),
            Matcher::Regex(r#"name="files"; filename="b.txt""#.to_string()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "message": "Successfully uploaded 2 file(s)",
                "data": {"files": [
                    {"id": 1, "original_filename": "a.txt", "size": 5, "mime_type": "text/plain"},
                    {"id": 2, "original_filename": "b.txt", "size": 3, "mime_type": "text/plain"}
                ]}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let files = vec![
        UploadFile::from_bytes("a.txt", &b"hello"[..]),
        UploadFile::from_bytes("b.txt", &b"abc"[..]),
    ];
    let receipt = client.upload_files(&files).await.unwrap();

    mock.assert_async().await;
    assert_eq!(receipt.message, "Successfully uploaded 2 file(s)");
    assert_eq!(receipt.files.len(), 2);
    assert_eq!(receipt.total_bytes(), 8);
}

#[tokio::test]
async fn empty_upload_is_rejected_locally() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("POST", "/api/v1/files/upload")
        .expect(0)
        .create_async()
        .await;

    let err = client.upload_files(&[]).await.unwrap_err();
    assert!(matches!(err, VaultError::InvalidInput(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn download_url_carries_encoded_token() {
    let client = ApiClient::new("http://localhost:8080/api/v1", Session::in_memory()).unwrap();
    assert_eq!(
        client.download_url(5, true).unwrap_err(),
        VaultError::AuthRequired
    );

    client
        .session()
        .set_credential(Credential::new("a.b+c"))
        .await
        .unwrap();
    assert_eq!(
        client.download_url(5, true).unwrap(),
        "http://localhost:8080/api/v1/files/5/download?token=a.b%2Bc"
    );
    assert_eq!(
        client.download_url(5, false).unwrap(),
        "http://localhost:8080/api/v1/files/5/download"
    );
}

#[tokio::test]
async fn download_returns_raw_bytes() {
    let (mut server, client) = setup().await;
    let _mock = server
        .mock("GET", "/api/v1/files/5/download")
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body(vec![0u8, 1, 2, 3])
        .create_async()
        .await;

    let bytes = client.download_file(5).await.unwrap();
    assert_eq!(&bytes[..], &[0u8, 1, 2, 3]);
}

fn unreachable_client(transport_retries: u32) -> ApiClient {
    let config = ClientConfig {
        api_base_url: "http://127.0.0.1:9/api/v1".to_string(),
        transport_retries,
        ..ClientConfig::default()
    };
    ApiClient::from_config(&config, Session::in_memory()).unwrap()
}

#[tokio::test]
async fn get_is_retried_once_after_connect_failure() {
    let started = Instant::now();
    let err = unreachable_client(1).storage_stats().await.unwrap_err();

    assert_eq!(err, VaultError::Transport(UNREACHABLE_MESSAGE.to_string()));
    assert!(started.elapsed() >= Duration::from_millis(250));
}

#[tokio::test]
async fn post_is_never_retried() {
    let started = Instant::now();
    let err = unreachable_client(1)
        .login("a@b.com", "secret1")
        .await
        .unwrap_err();

    assert_eq!(err, VaultError::Transport(UNREACHABLE_MESSAGE.to_string()));
    assert!(started.elapsed() < Duration::from_millis(250));
}

#[tokio::test]
async fn error_responses_are_not_retried() {
    let (mut server, client) = setup().await;
    let stats = server
        .mock("GET", "/api/v1/storage/stats")
        .with_status(503)
        .with_body(json!({"success": false, "error": "Service unavailable"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/api/v1/files/3")
        .with_status(404)
        .with_body(json!({"success": false, "error": "File not found"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let err = client.storage_stats().await.unwrap_err();
    assert!(matches!(err, VaultError::Server { status: 503, .. }));
    let err = client.delete_file(3).await.unwrap_err();
    assert_eq!(err.to_string(), "File not found");

    stats.assert_async().await;
    delete.assert_async().await;
}
