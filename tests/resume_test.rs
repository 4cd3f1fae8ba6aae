use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use resume_ai_backend::config::AppConfig;
use resume_ai_backend::models::{
    AtsReport, ContactInfo, ExtractedResumeData, FilledTemplate, SuggestionsReport,
};
use resume_ai_backend::services::ai_service::AnalysisProvider;
use resume_ai_backend::services::artifact_store::ArtifactStore;
use resume_ai_backend::services::resume_service::ResumeService;
use resume_ai_backend::services::user_service::UserService;
use resume_ai_backend::{AppState, create_app, infrastructure::database};
use sea_orm::Database;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Deterministic provider double: fixed score and contact name, switchable
/// failure mode, and call counters to assert on cache behavior.
struct StubProvider {
    score: i32,
    full_name: String,
    failing: AtomicBool,
    ats_calls: AtomicUsize,
    extract_calls: AtomicUsize,
}

impl StubProvider {
    fn new(score: i32, full_name: &str) -> Self {
        Self {
            score,
            full_name: full_name.to_string(),
            failing: AtomicBool::new(false),
            ats_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AnalysisProvider for StubProvider {
    async fn score_ats(&self, _file: &Path) -> AtsReport {
        self.ats_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return AtsReport {
                error: Some("provider unavailable".to_string()),
                ..AtsReport::default()
            };
        }
        AtsReport {
            score: self.score,
            strengths: vec!["Concise wording".to_string()],
            ..AtsReport::default()
        }
    }

    async fn suggest(&self, _file: &Path) -> SuggestionsReport {
        if self.failing.load(Ordering::SeqCst) {
            return SuggestionsReport {
                error: Some("provider unavailable".to_string()),
                ..SuggestionsReport::default()
            };
        }
        SuggestionsReport {
            overall_impression: "Solid resume".to_string(),
            top_priority: "Quantify achievements".to_string(),
            ..SuggestionsReport::default()
        }
    }

    async fn extract(&self, _file: &Path) -> ExtractedResumeData {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return ExtractedResumeData::with_error("provider unavailable");
        }
        ExtractedResumeData {
            extraction_version: "1.0".to_string(),
            extracted_at: "2024-01-01T00:00:00Z".to_string(),
            contact: ContactInfo {
                full_name: self.full_name.clone(),
                email: "jane@example.com".to_string(),
                ..ContactInfo::default()
            },
            summary: "Seasoned engineer".to_string(),
            technical_skills: vec!["Rust".to_string(), "SQL".to_string()],
            ..ExtractedResumeData::default()
        }
    }

    async fn fill_template(&self, data: &ExtractedResumeData, schema: &Value) -> FilledTemplate {
        FilledTemplate {
            template_id: schema["template_id"].as_str().unwrap_or_default().to_string(),
            filled_at: "2024-01-01T00:00:00Z".to_string(),
            data: json!({"full_name": data.contact.full_name}),
            error: None,
        }
    }
}

struct TestContext {
    app: Router,
    stub: Arc<StubProvider>,
    upload_dir: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

async fn setup_app(stub: StubProvider) -> TestContext {
    // A single pooled connection keeps every query on the same in-memory db
    let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().join("resumes");
    let config = AppConfig {
        upload_dir: upload_dir.to_string_lossy().into_owned(),
        extracted_dir: dir.path().join("extracted").to_string_lossy().into_owned(),
        ..AppConfig::default()
    };

    let stub = Arc::new(stub);
    let store = Arc::new(ArtifactStore::new(&config.upload_dir, &config.extracted_dir));
    let users = Arc::new(UserService::new(db.clone(), config.clone()));
    let resumes = Arc::new(ResumeService::new(
        db.clone(),
        store,
        stub.clone() as Arc<dyn AnalysisProvider>,
    ));

    let state = AppState {
        db,
        users,
        resumes,
        config,
    };

    TestContext {
        app: create_app(state),
        stub,
        upload_dir,
        _dir: dir,
    }
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn signup(app: &Router, email: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({"email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_resume(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/resumes",
        Some(token),
        Some(json!({"title": title})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn multipart_body(content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"resume.pdf\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(
    app: &Router,
    token: &str,
    resume_id: &str,
    content_type: &str,
    bytes: &[u8],
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/resumes/{}/upload", resume_id))
        .header("Authorization", format!("Bearer {}", token))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(content_type, bytes)))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_create_and_list_resumes() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;

    let (status, body) = request(&ctx.app, "GET", "/resumes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["resumes"].as_array().unwrap().len(), 0);

    let id = create_resume(&ctx.app, &token, "My First Resume").await;

    let (status, body) = request(&ctx.app, "GET", "/resumes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let entry = &body["resumes"][0];
    assert_eq!(entry["id"], id.as_str());
    assert_eq!(entry["title"], "My First Resume");
    assert_eq!(entry["ats_score"], 0);
    assert!(entry["file_path"].is_null());
    assert!(
        entry["thumbnail_color"]
            .as_str()
            .unwrap()
            .starts_with("bg-")
    );
}

#[tokio::test]
async fn test_partial_update_touches_only_sent_fields() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Original Title").await;

    let (_, before) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}", id),
        Some(&token),
        None,
    )
    .await;
    let color = before["thumbnail_color"].as_str().unwrap().to_string();

    let (status, body) = request(
        &ctx.app,
        "PATCH",
        &format!("/resumes/{}", id),
        Some(&token),
        Some(json!({"title": "Renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["ats_score"], 0);
    assert_eq!(body["thumbnail_color"], color.as_str());

    let (status, body) = request(
        &ctx.app,
        "PATCH",
        &format!("/resumes/{}", id),
        Some(&token),
        Some(json!({"ats_score": 55})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["ats_score"], 55);
}

#[tokio::test]
async fn test_cross_owner_access_is_not_found() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let owner = signup(&ctx.app, "owner@example.com").await;
    let intruder = signup(&ctx.app, "intruder@example.com").await;
    let id = create_resume(&ctx.app, &owner, "Private Resume").await;

    let uri = format!("/resumes/{}", id);

    let (status, body) = request(&ctx.app, "GET", &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["title"].is_null());

    let (status, _) = request(
        &ctx.app,
        "PATCH",
        &uri,
        Some(&intruder),
        Some(json!({"title": "Hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&ctx.app, "DELETE", &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unchanged and still visible to the owner
    let (status, body) = request(&ctx.app, "GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Private Resume");
}

#[tokio::test]
async fn test_upload_rejects_unsupported_type_before_any_write() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;

    let (status, body) = upload(&ctx.app, &token, &id, "text/plain", b"hello").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Invalid file type")
    );

    assert_eq!(files_in(&ctx.upload_dir), 0);

    let (_, body) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert!(body["file_path"].is_null());
    assert!(body["file_type"].is_null());
    assert!(body["file_size"].is_null());
}

#[tokio::test]
async fn test_upload_size_boundary() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;

    // Exactly 10 MiB is rejected before any storage write
    let at_limit = vec![0u8; 10 * 1024 * 1024];
    let (status, body) = upload(&ctx.app, &token, &id, "application/pdf", &at_limit).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("too large"));
    assert_eq!(files_in(&ctx.upload_dir), 0);

    // One byte under the limit goes through
    let under_limit = vec![0u8; 10 * 1024 * 1024 - 1];
    let (status, body) = upload(&ctx.app, &token, &id, "application/pdf", &under_limit).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_size"], (10 * 1024 * 1024 - 1) as i64);
    assert_eq!(files_in(&ctx.upload_dir), 1);
}

#[tokio::test]
async fn test_upload_persists_file_metadata_and_analysis() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Untitled").await;

    let content = b"%PDF-1.4 fake resume";
    let (status, body) = upload(&ctx.app, &token, &id, "application/pdf", content).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_type"], "pdf");
    assert_eq!(body["file_size"], content.len() as i64);
    assert_eq!(body["ats_score"], 87);
    assert!(body["extracted_data_path"].is_string());
    // Title is rewritten from the extracted contact name
    assert_eq!(body["title"], "Jane Doe");

    // Persisted, not just echoed
    let (_, body) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["ats_score"], 87);
    assert_eq!(body["title"], "Jane Doe");
}

#[tokio::test]
async fn test_upload_succeeds_when_every_analysis_fails() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    ctx.stub.set_failing(true);

    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;

    let (status, body) = upload(&ctx.app, &token, &id, "image/png", b"pngbytes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_type"], "png");
    assert_eq!(body["file_size"], 8);
    assert_eq!(body["ats_score"], 0);
    assert!(body["extracted_data_path"].is_null());
    assert_eq!(body["title"], "Resume");
}

#[tokio::test]
async fn test_ats_read_prefers_cache_and_never_persists() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;

    upload(&ctx.app, &token, &id, "application/pdf", b"%PDF-1.4").await;
    assert_eq!(ctx.stub.ats_calls.load(Ordering::SeqCst), 1);

    // Cached report served without a provider call
    let (status, body) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}/ats", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 87);
    assert_eq!(body["strengths"][0], "Concise wording");
    assert_eq!(ctx.stub.ats_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ats_fresh_read_does_not_persist_but_reanalyze_does() {
    let ctx = setup_app(StubProvider::new(91, "Jane Doe")).await;
    ctx.stub.set_failing(true);

    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;
    upload(&ctx.app, &token, &id, "application/pdf", b"%PDF-1.4").await;

    // Upload analysis failed, so there is no cached report
    ctx.stub.set_failing(false);
    let (status, body) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}/ats", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 91);

    // The fresh read did not write anything back
    let (_, body) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["ats_score"], 0);

    let (status, body) = request(
        &ctx.app,
        "POST",
        &format!("/resumes/{}/ats/reanalyze", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ats_score"], 91);

    let (_, body) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["ats_score"], 91);
}

#[tokio::test]
async fn test_analysis_endpoints_without_file() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;

    let (status, body) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}/ats", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 0);
    assert_eq!(body["error"], "No file uploaded for this resume");

    let (status, body) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}/suggestions", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_impression"], "No file uploaded");

    let (status, _) = request(
        &ctx.app,
        "POST",
        &format!("/resumes/{}/ats/reanalyze", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &ctx.app,
        "POST",
        &format!("/resumes/{}/extracted/reextract", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extracted_data_round_trip_served_from_cache() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;

    upload(&ctx.app, &token, &id, "application/pdf", b"%PDF-1.4").await;
    assert_eq!(ctx.stub.extract_calls.load(Ordering::SeqCst), 1);

    let uri = format!("/resumes/{}/extracted", id);
    let (status, first) = request(&ctx.app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["contact"]["full_name"], "Jane Doe");
    assert_eq!(first["extraction_version"], "1.0");

    let (status, second) = request(&ctx.app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Structurally identical, and the provider was never called again
    assert_eq!(first, second);
    assert_eq!(ctx.stub.extract_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_extracted_read_self_heals_missing_cache() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    ctx.stub.set_failing(true);

    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;
    upload(&ctx.app, &token, &id, "application/pdf", b"%PDF-1.4").await;
    assert_eq!(ctx.stub.extract_calls.load(Ordering::SeqCst), 1);

    // No document was persisted during upload; the read computes fresh and
    // populates the cache as a side effect
    ctx.stub.set_failing(false);
    let uri = format!("/resumes/{}/extracted", id);
    let (status, body) = request(&ctx.app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contact"]["full_name"], "Jane Doe");
    assert_eq!(ctx.stub.extract_calls.load(Ordering::SeqCst), 2);

    let (_, resume) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert!(resume["extracted_data_path"].is_string());

    // Subsequent reads hit the healed cache
    let (_, _) = request(&ctx.app, "GET", &uri, Some(&token), None).await;
    assert_eq!(ctx.stub.extract_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reextract_rederives_title() {
    let ctx = setup_app(StubProvider::new(87, "Grace Hopper")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;
    upload(&ctx.app, &token, &id, "application/pdf", b"%PDF-1.4").await;

    // Owner renames, then forces a re-extract; the extracted name wins again
    request(
        &ctx.app,
        "PATCH",
        &format!("/resumes/{}", id),
        Some(&token),
        Some(json!({"title": "Custom Title"})),
    )
    .await;

    let (status, body) = request(
        &ctx.app,
        "POST",
        &format!("/resumes/{}/extracted/reextract", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contact"]["full_name"], "Grace Hopper");

    let (_, resume) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(resume["title"], "Grace Hopper");
}

#[tokio::test]
async fn test_fill_template_short_circuits_without_file() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;

    let (status, body) = request(
        &ctx.app,
        "POST",
        &format!("/resumes/{}/fill-template", id),
        Some(&token),
        Some(json!({"template_id": "modern", "sections": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded for this resume");
}

#[tokio::test]
async fn test_fill_template_maps_extracted_data() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;
    upload(&ctx.app, &token, &id, "application/pdf", b"%PDF-1.4").await;

    let (status, body) = request(
        &ctx.app,
        "POST",
        &format!("/resumes/{}/fill-template", id),
        Some(&token),
        Some(json!({"template_id": "modern", "sections": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template_id"], "modern");
    assert_eq!(body["data"]["full_name"], "Jane Doe");
}

#[tokio::test]
async fn test_delete_removes_row_and_artifacts() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;
    upload(&ctx.app, &token, &id, "application/pdf", b"%PDF-1.4").await;
    assert_eq!(files_in(&ctx.upload_dir), 1);

    let uri = format!("/resumes/{}", id);
    let (status, _) = request(&ctx.app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(files_in(&ctx.upload_dir), 0);

    let (status, _) = request(&ctx.app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting again reports not-found rather than an error
    let (status, _) = request(&ctx.app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_round_trips_bytes() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;
    let id = create_resume(&ctx.app, &token, "Resume").await;

    let (status, _) = request(
        &ctx.app,
        "GET",
        &format!("/resumes/{}/download", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let content = b"%PDF-1.4 fake resume";
    upload(&ctx.app, &token, &id, "application/pdf", content).await;

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/resumes/{}/download", id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Content-Type").unwrap(),
        "application/pdf"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), content);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let token = signup(&ctx.app, "owner@example.com").await;

    let (status, body) = request(&ctx.app, "GET", "/resumes/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_resumes"], 0);
    assert_eq!(body["average_ats_score"], 0);
    assert_eq!(body["highest_ats_score"], 0);
    assert_eq!(body["resumes_this_week"], 0);

    let first = create_resume(&ctx.app, &token, "First").await;
    let second = create_resume(&ctx.app, &token, "Second").await;

    // Scores [10, 11]: the mean truncates to 10, it is not rounded to 11
    for (id, score) in [(&first, 10), (&second, 11)] {
        let (status, _) = request(
            &ctx.app,
            "PATCH",
            &format!("/resumes/{}", id),
            Some(&token),
            Some(json!({"ats_score": score})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = request(&ctx.app, "GET", "/resumes/stats", Some(&token), None).await;
    assert_eq!(body["total_resumes"], 2);
    assert_eq!(body["average_ats_score"], 10);
    assert_eq!(body["highest_ats_score"], 11);
    assert_eq!(body["resumes_this_week"], 2);

    // Scores [10, 90]: mean 50, highest 90
    request(
        &ctx.app,
        "PATCH",
        &format!("/resumes/{}", second),
        Some(&token),
        Some(json!({"ats_score": 90})),
    )
    .await;

    let (_, body) = request(&ctx.app, "GET", "/resumes/stats", Some(&token), None).await;
    assert_eq!(body["average_ats_score"], 50);
    assert_eq!(body["highest_ats_score"], 90);
}

#[tokio::test]
async fn test_stats_are_scoped_to_owner() {
    let ctx = setup_app(StubProvider::new(87, "Jane Doe")).await;
    let owner = signup(&ctx.app, "owner@example.com").await;
    let other = signup(&ctx.app, "other@example.com").await;

    create_resume(&ctx.app, &owner, "Mine").await;

    let (_, body) = request(&ctx.app, "GET", "/resumes/stats", Some(&other), None).await;
    assert_eq!(body["total_resumes"], 0);
}
