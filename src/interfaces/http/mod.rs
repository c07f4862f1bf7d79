mod state;

pub use state::AppState;

use crate::application::{AnalyzeRequest, MergeRequest};
use crate::domain::error::{AppError, Result};
use crate::domain::merged::MergedDataset;
use crate::infrastructure::config::ServerConfig;
use actix_cors::Cors;
use actix_web::error::{BlockingError, InternalError, JsonPayloadError};
use actix_web::http::header;
use actix_web::{
    dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const LOG_SOURCE: &str = "HttpApi";
const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
    pub json_limit_bytes: usize,
    pub max_upload_bytes: usize,
}

impl HttpState {
    pub fn new(
        app_state: Arc<AppState>,
        logs: Arc<Mutex<Vec<LogEntry>>>,
        server: &ServerConfig,
    ) -> Self {
        Self {
            app_state,
            logs,
            json_limit_bytes: server.json_limit_bytes,
            max_upload_bytes: server.max_upload_bytes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseQuery {
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[post("/parse")]
async fn parse_file(
    data: web::Data<HttpState>,
    query: web::Query<ParseQuery>,
    body: web::Bytes,
) -> impl Responder {
    let file_name = query.into_inner().file_name.unwrap_or_default();
    add_log(
        &data.logs,
        "INFO",
        LOG_SOURCE,
        &format!("Parsing {} ({} bytes)", file_name, body.len()),
    );

    let ingest = data.app_state.ingest_use_case.clone();
    let result = web::block(move || ingest.parse(&file_name, body.to_vec())).await;

    match flatten_blocking(result) {
        Ok(dataset) => HttpResponse::Ok().json(dataset),
        Err(e) => error_response(&data.logs, "Failed to parse file", &e),
    }
}

#[post("/analyze")]
async fn analyze(data: web::Data<HttpState>, req: web::Json<AnalyzeRequest>) -> impl Responder {
    let request_id = Uuid::new_v4();
    add_log(
        &data.logs,
        "INFO",
        LOG_SOURCE,
        &format!(
            "[{}] Analyzing columns ({} x {}, provider={:?} model={})",
            request_id,
            req.columns1.as_ref().map_or(0, Vec::len),
            req.columns2.as_ref().map_or(0, Vec::len),
            data.app_state.llm_config.provider,
            data.app_state.llm_config.model
        ),
    );

    match data.app_state.analyze_use_case.execute(req.into_inner()).await {
        Ok(suggestion) => {
            add_log(
                &data.logs,
                "INFO",
                LOG_SOURCE,
                &format!(
                    "[{}] Proposed {} mappings",
                    request_id,
                    suggestion.mappings.len()
                ),
            );
            HttpResponse::Ok().json(suggestion)
        }
        Err(e) => error_response(&data.logs, "Failed to analyze columns", &e),
    }
}

#[post("/merge")]
async fn merge_files(data: web::Data<HttpState>, req: web::Json<MergeRequest>) -> impl Responder {
    let request_id = Uuid::new_v4();
    add_log(
        &data.logs,
        "INFO",
        LOG_SOURCE,
        &format!("[{}] Merging files", request_id),
    );

    let merge_use_case = data.app_state.merge_use_case.clone();
    let request = req.into_inner();
    let result = web::block(move || merge_use_case.execute(request)).await;

    match flatten_blocking(result) {
        Ok(merged) => {
            add_log(
                &data.logs,
                "INFO",
                LOG_SOURCE,
                &format!(
                    "[{}] Merged {} rows into {} columns",
                    request_id,
                    merged.row_count,
                    merged.columns.len()
                ),
            );
            HttpResponse::Ok().json(merged)
        }
        Err(e) => error_response(&data.logs, "Failed to merge files", &e),
    }
}

#[post("/export")]
async fn export_csv(data: web::Data<HttpState>, req: web::Json<MergedDataset>) -> impl Responder {
    match data.app_state.export_use_case.execute(&req) {
        Ok(export) => {
            add_log(
                &data.logs,
                "INFO",
                LOG_SOURCE,
                &format!("Exported {} ({} bytes)", export.file_name, export.bytes.len()),
            );
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export.file_name),
                ))
                .body(export.bytes)
        }
        Err(e) => error_response(&data.logs, "Failed to export CSV", &e),
    }
}

#[get("/models")]
async fn list_models(data: web::Data<HttpState>) -> impl Responder {
    let config = &data.app_state.llm_config;
    add_log(
        &data.logs,
        "INFO",
        LOG_SOURCE,
        &format!(
            "Fetching models (provider={:?} base_url={})",
            config.provider, config.base_url
        ),
    );

    match data.app_state.llm_client.list_models(config).await {
        Ok(models) => HttpResponse::Ok().json(models),
        Err(e) => error_response(&data.logs, "Failed to list models", &e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data
        .logs
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    HttpResponse::Ok().json(&*logs)
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn flatten_blocking<T>(result: std::result::Result<Result<T>, BlockingError>) -> Result<T> {
    result
        .map_err(|e| AppError::Internal(format!("Worker pool unavailable: {}", e)))
        .and_then(|inner| inner)
}

/// Caller mistakes come back verbatim as 400. Anything else is logged in
/// full and reported as `failure`.
fn error_response(logs: &Mutex<Vec<LogEntry>>, failure: &str, err: &AppError) -> HttpResponse {
    if err.is_client_error() {
        add_log(logs, "WARN", LOG_SOURCE, &format!("Rejected request: {}", err));
        HttpResponse::BadRequest().json(ErrorBody::new(err.message()))
    } else {
        add_log(logs, "ERROR", LOG_SOURCE, &format!("{}: {}", failure, err));
        HttpResponse::InternalServerError().json(ErrorBody::new(failure))
    }
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = match &err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            HttpResponse::PayloadTooLarge().json(ErrorBody::new(err.to_string()))
        }
        _ => HttpResponse::BadRequest().json(ErrorBody::new(format!("Invalid JSON body: {}", err))),
    };
    InternalError::from_response(err, response).into()
}

/// Record an entry in the in-memory ring buffer and mirror it to tracing.
pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    match level {
        "ERROR" => error!(source = %source, "{}", message),
        "WARN" => warn!(source = %source, "{}", message),
        "DEBUG" => debug!(source = %source, "{}", message),
        _ => info!(source = %source, "{}", message),
    }

    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry);
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
}

/// Registers the `/api` routes plus body limits. Shared by the server and
/// the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<HttpState>) {
    let json_config = web::JsonConfig::default()
        .limit(state.json_limit_bytes)
        .error_handler(json_error_handler);
    let payload_config = web::PayloadConfig::new(state.max_upload_bytes);

    cfg.app_data(state)
        .app_data(json_config)
        .app_data(payload_config)
        .service(
            web::scope("/api")
                .service(parse_file)
                .service(analyze)
                .service(merge_files)
                .service(export_csv)
                .service(list_models)
                .service(get_logs)
                .service(health),
        );
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    server_config: &ServerConfig,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState::new(app_state, logs, server_config));

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool
        let state = state.clone();

        App::new()
            .wrap(cors)
            .configure(move |cfg| configure(cfg, state))
    })
    .bind((server_config.host.as_str(), server_config.port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::mapping_oracle::MappingOracle;
    use crate::domain::dataset::Record;
    use crate::domain::llm_config::LLMConfig;
    use crate::domain::mapping::{Correspondence, MappingSuggestion};
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::llm_clients::LLMClient;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct StubOracle {
        fail: bool,
    }

    #[async_trait]
    impl MappingOracle for StubOracle {
        async fn propose_mappings(
            &self,
            _columns1: &[String],
            _columns2: &[String],
            _samples1: &[Record],
            _samples2: &[Record],
        ) -> Result<MappingSuggestion> {
            if self.fail {
                return Err(AppError::LLMError("connection refused".to_string()));
            }
            Ok(MappingSuggestion {
                mappings: vec![Correspondence::new("email", "e-mail", "email")
                    .with_confidence(0.95, "same address field")],
                unmatched_columns1: vec![],
                unmatched_columns2: vec![],
            })
        }
    }

    struct StubClient;

    #[async_trait]
    impl LLMClient for StubClient {
        async fn generate(&self, _config: &LLMConfig, _system: &str, _user: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn list_models(&self, _config: &LLMConfig) -> Result<Vec<String>> {
            Ok(vec!["local-model".to_string()])
        }
    }

    fn http_state(fail_oracle: bool, max_upload_bytes: usize) -> web::Data<HttpState> {
        let mut config = AppConfig::default();
        config.server.max_upload_bytes = max_upload_bytes;
        let app_state = AppState::new(
            &config,
            Arc::new(StubClient),
            Arc::new(StubOracle { fail: fail_oracle }),
        );
        web::Data::new(HttpState::new(
            Arc::new(app_state),
            Arc::new(Mutex::new(Vec::new())),
            &config.server,
        ))
    }

    macro_rules! init_app {
        ($state:expr) => {{
            let state = $state.clone();
            test::init_service(App::new().configure(move |cfg| configure(cfg, state))).await
        }};
    }

    fn merge_payload() -> Value {
        json!({
            "file1": {
                "name": "a.csv",
                "columns": ["email", "name"],
                "rows": [{ "email": "a@x.com", "name": "Ann" }],
                "rowCount": 1
            },
            "file2": {
                "name": "b.csv",
                "columns": ["e-mail", "age"],
                "rows": [{ "e-mail": "b@x.com", "age": 30 }],
                "rowCount": 1
            },
            "mappings": [
                { "column1": "email", "column2": "e-mail", "mergedName": "email", "confidence": 0.9 }
            ]
        })
    }

    #[actix_web::test]
    async fn test_health() {
        let app = init_app!(http_state(false, 1024));
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn test_merge_endpoint() {
        let app = init_app!(http_state(false, 1024));
        let req = test::TestRequest::post()
            .uri("/api/merge")
            .set_json(merge_payload())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["columns"], json!(["name", "email", "age"]));
        assert_eq!(body["rowCount"], 2);
        assert_eq!(
            body["rows"][0],
            json!({ "name": "Ann", "email": "a@x.com", "age": null })
        );
        assert_eq!(
            body["rows"][1],
            json!({ "name": null, "email": "b@x.com", "age": 30 })
        );
    }

    #[actix_web::test]
    async fn test_merge_missing_file_is_bad_request() {
        let app = init_app!(http_state(false, 1024));
        let mut payload = merge_payload();
        payload.as_object_mut().unwrap().remove("file1");

        let req = test::TestRequest::post()
            .uri("/api/merge")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "file1 is required");
    }

    #[actix_web::test]
    async fn test_merge_rejects_duplicate_merged_names() {
        let app = init_app!(http_state(false, 1024));
        let mut payload = merge_payload();
        payload["mappings"] = json!([
            { "column1": "email", "column2": "e-mail", "mergedName": "contact" },
            { "column1": "name", "column2": "age", "mergedName": "contact" }
        ]);

        let req = test::TestRequest::post()
            .uri("/api/merge")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_merge_rejects_shared_unmapped_column() {
        let app = init_app!(http_state(false, 1024));
        let mut payload = merge_payload();
        payload["file1"]["columns"] = json!(["id", "x"]);
        payload["file1"]["rows"] = json!([{ "id": "A-1" }]);
        payload["file2"]["columns"] = json!(["id", "y"]);
        payload["file2"]["rows"] = json!([{ "id": "B-1" }]);
        payload["mappings"] = json!([]);

        let req = test::TestRequest::post()
            .uri("/api/merge")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("'id' exists in both"));
    }

    #[actix_web::test]
    async fn test_malformed_json_is_bad_request() {
        let app = init_app!(http_state(false, 1024));
        let req = test::TestRequest::post()
            .uri("/api/merge")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[actix_web::test]
    async fn test_analyze_endpoint() {
        let app = init_app!(http_state(false, 1024));
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(json!({
                "columns1": ["email", "name"],
                "columns2": ["e-mail", "age"],
                "sampleData1": [{ "email": "a@x.com", "name": "Ann" }]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["mappings"][0]["column1"], "email");
        assert_eq!(body["mappings"][0]["mergedName"], "email");
        assert_eq!(body["unmatchedColumns1"], json!(["name"]));
        assert_eq!(body["unmatchedColumns2"], json!(["age"]));
    }

    #[actix_web::test]
    async fn test_analyze_upstream_failure_is_generic() {
        let state = http_state(true, 1024);
        let app = init_app!(state);
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(json!({ "columns1": ["a"], "columns2": ["b"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Failed to analyze columns");

        let logs = state.logs.lock().unwrap();
        assert!(logs
            .iter()
            .any(|entry| entry.level == "ERROR" && entry.message.contains("connection refused")));
    }

    #[actix_web::test]
    async fn test_parse_endpoint() {
        let app = init_app!(http_state(false, 1024));
        let req = test::TestRequest::post()
            .uri("/api/parse?fileName=people.csv")
            .set_payload("id,name\n1,Ann\n2,Bob\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["name"], "people.csv");
        assert_eq!(body["columns"], json!(["id", "name"]));
        assert_eq!(body["rowCount"], 2);
        assert_eq!(body["rows"][1]["name"], "Bob");
    }

    #[actix_web::test]
    async fn test_parse_rejects_unsupported_type() {
        let app = init_app!(http_state(false, 1024));
        let req = test::TestRequest::post()
            .uri("/api/parse?fileName=slides.pptx")
            .set_payload("x")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_parse_rejects_oversized_upload() {
        let app = init_app!(http_state(false, 16));
        let req = test::TestRequest::post()
            .uri("/api/parse?fileName=big.csv")
            .set_payload("a,b\n".repeat(64))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn test_export_endpoint() {
        let app = init_app!(http_state(false, 1024));
        let req = test::TestRequest::post()
            .uri("/api/export")
            .set_json(json!({
                "columns": ["name", "note"],
                "rows": [{ "name": "Ann", "note": "a, b" }, { "name": null, "note": "x" }],
                "file1Name": "a.csv",
                "file2Name": "b.csv"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"merged_a_b.csv\""
        );
        assert!(resp
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv"));

        let body = test::read_body(resp).await;
        assert_eq!(&body[..], b"name,note\nAnn,\"a, b\"\n,x\n");
    }

    #[actix_web::test]
    async fn test_models_and_logs() {
        let state = http_state(false, 1024);
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/api/models").to_request();
        let models: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(models, vec!["local-model"]);

        let req = test::TestRequest::get().uri("/api/logs").to_request();
        let logs: Vec<LogEntry> = test::call_and_read_body_json(&app, req).await;
        assert!(logs.iter().any(|entry| entry.message.starts_with("Fetching models")));
    }

    #[::core::prelude::v1::test]
    fn test_log_buffer_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }
}
