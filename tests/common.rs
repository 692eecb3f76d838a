//! Common code for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use filedrop::{admin::StaticKey, config::Config, router, storage::StorageDir, AppState};

/// The admin key every test app is configured with.
pub const ADMIN_KEY: &str = "test-admin-key";

/// The fixed boundary used by test multipart bodies.
const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// An application router wired to throwaway directories.
pub struct TestApp {
    /// The router under test.
    pub router: Router,

    /// The canonical storage root backing it.
    pub storage_root: PathBuf,

    /// Owns every temporary directory for the app's lifetime.
    pub dirs: TempDir,
}

/// Builds an app over fresh temporary directories, with one known public
/// asset in place.
pub async fn spawn_app() -> TestApp {
    let dirs = tempfile::tempdir().expect("temp dir should be creatable");

    let public_dir = dirs.path().join("public");
    std::fs::create_dir_all(&public_dir).expect("public dir should be creatable");
    std::fs::write(public_dir.join("index.html"), "<h1>filedrop test page</h1>")
        .expect("index asset should be writable");

    let config = Config {
        address: "127.0.0.1:0".to_owned(),
        storage_dir: dirs.path().join("uploads"),
        public_dir,
        admin_key: ADMIN_KEY.to_owned(),
    };

    let storage = StorageDir::initialize(&config.storage_dir)
        .await
        .expect("storage should initialize");
    let storage_root = storage.root().to_path_buf();

    let state = AppState {
        storage,
        authenticator: Arc::new(StaticKey::new(&config.admin_key)),
    };

    TestApp {
        router: router::build(&config, state),
        storage_root,
        dirs,
    }
}

impl TestApp {
    /// The directory directly above the app's storage and public roots.
    pub fn outside_dir(&self) -> &Path {
        self.dirs.path()
    }

    /// Dispatches one request to the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("the router should be infallible")
    }

    /// Uploads `content` under `filename` through the API.
    pub async fn upload(&self, filename: &str, content: &[u8]) -> Response {
        let (content_type, body) = multipart_body(&[("file", filename, content)]);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("request should be valid");

        self.send(request).await
    }

    /// Uploads `content` under `filename` and returns the stored name the
    /// server chose for it.
    pub async fn upload_named(&self, filename: &str, content: &[u8]) -> String {
        let response = self.upload(filename, content).await;
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "the upload should succeed"
        );

        let body = json_body(response).await;
        body["file"]["filename"]
            .as_str()
            .expect("the stored filename should be a string")
            .to_owned()
    }
}

/// Builds a multipart body of named file parts, returning the request
/// content type and the body bytes.
pub fn multipart_body(parts: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    for (field, filename, content) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// Builds a multipart body with one plain text field and no file at all.
pub fn multipart_text_field(field: &str, value: &str) -> (String, Vec<u8>) {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"\r\n\r\n\
         {value}\r\n\
         --{BOUNDARY}--\r\n"
    );

    (
        format!("multipart/form-data; boundary={BOUNDARY}"),
        body.into_bytes(),
    )
}

/// A `GET` request with an empty body.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should be valid")
}

/// A `DELETE` request with an empty body.
pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .expect("request should be valid")
}

/// Collects a response body into bytes.
pub async fn body_bytes(response: Response) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("the body should collect")
        .to_bytes()
}

/// Collects a response body and parses it as JSON.
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("the body should be JSON")
}

/// The sorted names of visible regular files in a directory.
pub fn visible_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("the directory should be readable")
        .map(|entry| entry.expect("the entry should be readable"))
        .filter(|entry| {
            entry
                .file_type()
                .expect("the file type should be readable")
                .is_file()
        })
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();

    names.sort();
    names
}
