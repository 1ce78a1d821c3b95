//! Integration tests for the tracker API.

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::{api, create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    state: AppState,
    temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = Config {
            api_psk: psk.clone(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            json_logs: false,
            export_dir: temp_dir.path().join("exports"),
            import_path: None,
        };

        let state = AppState::new(config);
        let app = create_router(state.clone());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            state,
            temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn import(&self, query: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/import{}", query)))
            .body(serde_json::to_vec(&body).unwrap())
            .send()
            .await
            .unwrap()
    }

    async fn create(&self, school: &str, position: &str) -> Value {
        let resp = self
            .post(
                "/api/applications",
                json!({ "school": school, "position": position }),
            )
            .await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }
}

fn export_document(settings: Value, applications: Value) -> Value {
    json!({
        "fileFormat": {
            "version": "1.0.0",
            "type": "postdoc-tracker-export",
            "description": "Postdoc Application Tracker Export File"
        },
        "exportInfo": {
            "exportDate": "2024-05-01T12:00:00.000Z",
            "exportedBy": "Postdoc Application Tracker",
            "totalApplications": 1
        },
        "settings": settings,
        "applications": applications
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture.client.get(fixture.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_health_check_without_network() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let state = AppState::new(Config {
        api_psk: Some("secret-key".to_string()),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "warn".to_string(),
        json_logs: false,
        export_dir: "exports".into(),
        import_path: None,
    });

    let resp = create_router(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Request without API key
    let resp = Client::new()
        .get(fixture.url("/api/datastore"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/datastore"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_auth_bearer_token() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/datastore"))
        .header("authorization", "Bearer test-api-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_auth_disabled_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = fixture.get("/api/datastore").await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_get_datastore() {
    let fixture = TestFixture::new().await;

    let resp = fixture.get("/api/datastore").await;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["revisionId"], 0);
    assert_eq!(body["data"]["unsavedChanges"], false);
    assert_eq!(body["data"]["settings"]["referenceWriters"][0], "henrich");
    assert_eq!(
        body["data"]["settings"]["statusOptions"],
        json!(["pending", "in-progress", "submitted"])
    );
    assert_eq!(body["data"]["applications"], json!([]));
}

#[tokio::test]
async fn test_application_crud() {
    let fixture = TestFixture::new().await;

    // Create
    let resp = fixture
        .post(
            "/api/applications",
            json!({
                "school": "MIT",
                "position": "Postdoc in Physics",
                "deadline": "2030-01-15",
                "customFieldValues": { "unregistered": "kept" }
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"], 1);
    let app = &body["data"];
    assert_eq!(app["id"], 1);
    assert_eq!(app["status"], "pending");
    assert_eq!(app["numRefs"], 3);
    assert_eq!(app["refs"]["henrich"], false);
    assert_eq!(app["materials"]["cv"], false);
    assert_eq!(app["customFieldValues"]["unregistered"], "kept");

    // Read
    let resp = fixture.get("/api/applications/1").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["school"], "MIT");

    // Update
    let resp = fixture
        .client
        .put(fixture.url("/api/applications/1"))
        .json(&json!({ "status": "submitted", "comments": "Sent on time" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"], 2);
    assert_eq!(body["data"]["status"], "submitted");
    assert_eq!(body["data"]["comments"], "Sent on time");
    assert_eq!(body["data"]["school"], "MIT");

    // Delete
    let resp = fixture
        .client
        .delete(fixture.url("/api/applications/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture.get("/api/applications/1").await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["revisionId"], 3);
}

#[tokio::test]
async fn test_ids_not_reused_after_delete() {
    let fixture = TestFixture::new().await;

    fixture.create("A", "P").await;
    fixture.create("B", "P").await;
    fixture
        .client
        .delete(fixture.url("/api/applications/2"))
        .send()
        .await
        .unwrap();

    let app = fixture.create("C", "P").await;
    assert_eq!(app["id"], 3);
}

#[tokio::test]
async fn test_create_validation() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post("/api/applications", json!({ "school": "  ", "position": "P" }))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .post(
            "/api/applications",
            json!({ "school": "S", "position": "P", "status": "rejected" }),
        )
        .await;
    assert_eq!(resp.status(), 400);

    let resp = fixture.get("/api/datastore/revision").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["revisionId"], 0);
    assert_eq!(body["data"]["totalApplications"], 0);
}

#[tokio::test]
async fn test_toggle_cycles_item() {
    let fixture = TestFixture::new().await;
    fixture.create("MIT", "Postdoc").await;

    let mut seen = Vec::new();
    for _ in 0..3 {
        let resp = fixture
            .post(
                "/api/applications/1/toggle",
                json!({ "section": "reference", "key": "sandor" }),
            )
            .await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        seen.push(body["data"].clone());
    }
    assert_eq!(seen, vec![json!(true), json!("optional"), json!(false)]);

    let resp = fixture
        .post(
            "/api/applications/1/toggle",
            json!({ "section": "material", "key": "no-such-material" }),
        )
        .await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_listing_and_stats() {
    let fixture = TestFixture::new().await;
    fixture.create("Stanford", "Fellow").await;
    fixture.create("Berkeley", "Postdoc").await;
    fixture
        .post(
            "/api/applications",
            json!({ "school": "Caltech", "position": "Postdoc", "status": "submitted" }),
        )
        .await;

    let resp = fixture.get("/api/applications?sort=school").await;
    let body: Value = resp.json().await.unwrap();
    let schools: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["school"].as_str().unwrap())
        .collect();
    assert_eq!(schools, vec!["Berkeley", "Caltech", "Stanford"]);
    assert_eq!(body["data"][0]["progress"]["refsTotal"], 6);

    let resp = fixture.get("/api/applications?search=post&status=pending").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["school"], "Berkeley");

    let resp = fixture.get("/api/stats").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(
        body["data"]["byStatus"][0],
        json!({ "status": "pending", "count": 2 })
    );
}

#[tokio::test]
async fn test_settings_lists() {
    let fixture = TestFixture::new().await;
    fixture.create("MIT", "Postdoc").await;

    let resp = fixture
        .post("/api/settings/referenceWriters", json!({ "value": "Jane Doe" }))
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], "jane_doe");

    // Existing applications are backfilled
    let resp = fixture.get("/api/applications/1").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["refs"]["jane_doe"], false);

    let resp = fixture
        .post("/api/settings/statusOptions", json!({ "value": "On Hold" }))
        .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], "on-hold");

    // Duplicates are rejected
    let resp = fixture
        .post("/api/settings/materials", json!({ "value": "CV" }))
        .await;
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .put(fixture.url("/api/settings/materials/0"))
        .json(&json!({ "value": "Cover Letter" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .delete(fixture.url("/api/settings/materials/99"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .post("/api/settings/colors", json!({ "value": "red" }))
        .await;
    assert_eq!(resp.status(), 404);

    let resp = fixture.get("/api/settings").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["materials"][0], "cover_letter");
    assert_eq!(body["data"]["referenceWriters"][6], "jane_doe");
}

#[tokio::test]
async fn test_custom_fields_and_checklists() {
    let fixture = TestFixture::new().await;
    fixture.create("MIT", "Postdoc").await;

    let resp = fixture
        .post(
            "/api/settings/custom-fields",
            json!({ "name": "Department", "type": "text" }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], "department");

    // New applications start with an empty value for every custom field
    let app = fixture.create("Yale", "Fellow").await;
    assert_eq!(app["customFieldValues"]["department"], "");

    let resp = fixture
        .post(
            "/api/settings/custom-checklists",
            json!({ "name": "Interview Prep", "items": ["Slides", "Chalk talk"] }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .post(
            "/api/applications/1/toggle",
            json!({ "section": "checklist", "checklistId": "interview_prep", "key": "Slides" }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    let resp = fixture.get("/api/applications/1").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"]["customChecklistValues"]["interview_prep"],
        json!({ "Chalk talk": false, "Slides": true })
    );

    let resp = fixture
        .post(
            "/api/settings/custom-checklists",
            json!({ "name": "Empty", "items": [" "] }),
        )
        .await;
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .delete(fixture.url("/api/settings/custom-fields/department"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .delete(fixture.url("/api/settings/custom-fields/department"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_import_legacy_into_empty_tracker() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .import(
            "",
            json!({
                "applications": [{ "school": "X", "position": "Y" }],
                "config": { "referenceWriters": ["alice"] }
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["mode"], "replace");
    assert_eq!(body["data"]["format"]["kind"], "legacy");
    assert_eq!(body["data"]["totalImported"], 1);
    assert_eq!(
        body["data"]["message"],
        "Data imported successfully! (Legacy format)"
    );

    let resp = fixture.get("/api/datastore").await;
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["unsavedChanges"], false);
    assert_eq!(data["settings"]["referenceWriters"], json!(["alice"]));
    assert_eq!(data["settings"]["materials"], json!([]));
    assert_eq!(data["applications"][0]["refs"], json!({ "alice": false }));
    assert_eq!(data["applications"][0]["status"], "pending");
    assert_eq!(data["applications"][0]["numRefs"], 3);
}

#[tokio::test]
async fn test_import_requires_mode_when_not_empty() {
    let fixture = TestFixture::new().await;
    fixture.create("MIT", "Postdoc").await;

    let resp = fixture
        .import("", export_document(json!({}), json!([])))
        .await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "IMPORT_MODE_REQUIRED");
    assert_eq!(body["error"]["details"]["existingApplications"], 1);

    let resp = fixture
        .import("?mode=merge", export_document(json!({}), json!([])))
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_import_add_skips_duplicates() {
    let fixture = TestFixture::new().await;
    fixture.create("MIT", "Postdoc").await;

    let document = export_document(
        json!({ "referenceWriters": ["henrich", "new_writer"] }),
        json!([
            { "id": 1, "school": "MIT", "position": "Postdoc", "status": "pending" },
            { "id": 1, "school": "Caltech", "position": "Fellow", "status": "pending" }
        ]),
    );
    let resp = fixture.import("?mode=add", document).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let summary = &body["data"];
    assert_eq!(summary["format"]["kind"], "standardized");
    assert_eq!(summary["format"]["version"], "1.0.0");
    assert_eq!(summary["totalProcessed"], 2);
    assert_eq!(summary["totalImported"], 1);
    assert_eq!(summary["duplicatesSkipped"]["found"], 1);
    assert_eq!(
        summary["duplicatesSkipped"]["shown"][0],
        json!({ "school": "MIT", "position": "Postdoc" })
    );
    assert_eq!(summary["resultingTotal"], 2);

    let resp = fixture.get("/api/datastore").await;
    let body: Value = resp.json().await.unwrap();
    let apps = body["data"]["applications"].as_array().unwrap();
    assert_eq!(apps[1]["school"], "Caltech");
    assert_eq!(apps[1]["id"], 2);
    assert_eq!(apps[0]["refs"]["new_writer"], false);
    let writers = body["data"]["settings"]["referenceWriters"].as_array().unwrap();
    assert_eq!(writers.len(), 7);
}

#[tokio::test]
async fn test_import_refused_while_tracker_is_held() {
    let fixture = TestFixture::new().await;
    fixture.create("MIT", "Postdoc").await;

    // Any in-flight request holding the tracker, including a read, blocks an import
    let guard = fixture.state.tracker.lock().await;
    let resp = fixture
        .import(
            "?mode=replace",
            export_document(json!({}), json!([{ "school": "ETH", "position": "Fellow" }])),
        )
        .await;
    drop(guard);

    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "IMPORT_BUSY");

    let resp = fixture.get("/api/datastore").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"], 1);
    assert_eq!(body["data"]["applications"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["applications"][0]["school"], "MIT");
}

#[tokio::test]
async fn test_create_rejects_zero_references() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post(
            "/api/applications",
            json!({ "school": "MIT", "position": "Postdoc", "numRefs": 0 }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_import_invalid_json() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/import"))
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_JSON");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Error importing data. Please make sure the file is valid JSON."));
}

#[tokio::test]
async fn test_malformed_import_leaves_state_unchanged() {
    let fixture = TestFixture::new().await;
    fixture.create("MIT", "Postdoc").await;

    let resp = fixture
        .import(
            "?mode=replace",
            export_document(json!({}), json!([{ "school": "X", "refs": { "a": "maybe" } }])),
        )
        .await;
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "MALFORMED_DOCUMENT");

    let resp = fixture.import("?mode=replace", json!([1, 2, 3])).await;
    assert_eq!(resp.status(), 422);

    let resp = fixture.get("/api/datastore").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"], 1);
    assert_eq!(body["data"]["applications"][0]["school"], "MIT");
}

#[tokio::test]
async fn test_export_download_round_trip() {
    let fixture = TestFixture::new().await;
    fixture.create("MIT", "Postdoc").await;

    let resp = fixture.get("/api/export").await;
    assert_eq!(resp.status(), 200);
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"postdoc-tracker-"));
    assert!(disposition.ends_with(".json\""));

    let document: Value = resp.json().await.unwrap();
    assert_eq!(document["fileFormat"]["type"], "postdoc-tracker-export");
    assert_eq!(document["exportInfo"]["totalApplications"], 1);
    assert!(document["applications"][0]["lastModified"].is_string());

    let resp = fixture.get("/api/datastore/revision").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["unsavedChanges"], false);

    // Re-importing the export reproduces the same records
    let resp = fixture.import("?mode=replace", document).await;
    assert_eq!(resp.status(), 200);
    let resp = fixture.get("/api/applications/1").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["school"], "MIT");
    assert!(body["data"].get("lastModified").is_none());
}

#[tokio::test]
async fn test_save_export_writes_file() {
    let fixture = TestFixture::new().await;
    fixture.create("MIT", "Postdoc").await;

    let resp = fixture.post("/api/export/save", json!({})).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let file_name = body["data"]["fileName"].as_str().unwrap();

    let path = fixture.temp_dir.path().join("exports").join(file_name);
    let saved: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(saved["applications"][0]["school"], "MIT");
}

#[tokio::test]
async fn test_import_file_from_disk() {
    let fixture = TestFixture::new().await;

    let missing = fixture.temp_dir.path().join("missing.json");
    let err = api::import_file(&fixture.state, &missing).await.unwrap_err();
    assert_eq!(err.error_code(), "FILE_READ_ERROR");

    let path = fixture.temp_dir.path().join("seed.json");
    let document = export_document(
        json!({ "materials": ["cv"] }),
        json!([{ "id": 7, "school": "ETH", "position": "Postdoc" }]),
    );
    std::fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

    let summary = api::import_file(&fixture.state, &path).await.unwrap();
    assert_eq!(summary.total_imported, 1);

    let resp = fixture.get("/api/applications/7").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["materials"], json!({ "cv": false }));
}
