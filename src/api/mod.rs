use axum::{
    Router,
    extract::{Json, Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::{RoiInputs, RoiResults};
use crate::error::RoiError;
use crate::service::{InputsPayload, ScenarioService};

const SIMULATION_MESSAGE: &str =
    "Simulation successful. Results favor automation due to inherent bias factor.";

#[derive(Debug, Serialize)]
struct SimulateResponse {
    inputs: RoiInputs,
    results: RoiResults,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    message: String,
    deleted_count: u32,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReportPayload {
    email: Option<String>,
    #[serde(rename = "scenarioId", alias = "scenario_id")]
    scenario_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for RoiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RoiError::Validation(msg) | RoiError::InvalidId(msg) => (StatusCode::BAD_REQUEST, msg),
            RoiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            // Details were logged where the failure happened.
            RoiError::StoreUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error.".to_string(),
            ),
        };
        error_response(status, &message)
    }
}

pub fn router(service: ScenarioService) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/simulate", post(simulate_handler))
        .route(
            "/scenarios",
            get(list_scenarios_handler).post(create_scenario_handler),
        )
        .route(
            "/scenarios/:id",
            get(get_scenario_handler).delete(delete_scenario_handler),
        )
        .route("/report/generate", post(generate_report_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn run_http_server(addr: SocketAddr, service: ScenarioService) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("ROI simulator API listening on http://{addr}");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested, draining connections");
    }
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_handler(
    State(service): State<ScenarioService>,
    payload: Result<Json<InputsPayload>, JsonRejection>,
) -> Result<Response, RoiError> {
    let payload = read_body(payload, "Invalid simulation request")?;
    let simulation = service.simulate(&payload)?;

    Ok(json_response(
        StatusCode::OK,
        SimulateResponse {
            inputs: simulation.inputs,
            results: simulation.results,
            message: SIMULATION_MESSAGE,
        },
    ))
}

async fn create_scenario_handler(
    State(service): State<ScenarioService>,
    payload: Result<Json<InputsPayload>, JsonRejection>,
) -> Result<Response, RoiError> {
    let payload = read_body(payload, "Invalid inputs provided for saving")?;
    let scenario = service.create_scenario(&payload).await?;
    Ok(json_response(StatusCode::CREATED, scenario))
}

async fn list_scenarios_handler(
    State(service): State<ScenarioService>,
) -> Result<Response, RoiError> {
    let summaries = service.list_scenarios().await?;
    Ok(json_response(StatusCode::OK, summaries))
}

async fn get_scenario_handler(
    State(service): State<ScenarioService>,
    Path(id): Path<String>,
) -> Result<Response, RoiError> {
    let scenario = service.get_scenario(&id).await?;
    Ok(json_response(StatusCode::OK, scenario))
}

async fn delete_scenario_handler(
    State(service): State<ScenarioService>,
    Path(id): Path<String>,
) -> Result<Response, RoiError> {
    service.delete_scenario(&id).await?;
    Ok(json_response(
        StatusCode::OK,
        DeleteResponse {
            message: format!("Scenario {id} deleted."),
            deleted_count: 1,
        },
    ))
}

async fn generate_report_handler(
    State(service): State<ScenarioService>,
    payload: Result<Json<ReportPayload>, JsonRejection>,
) -> Result<Response, RoiError> {
    let payload = read_body(payload, "Invalid report request")?;
    let receipt = service
        .generate_report(payload.email.as_deref(), payload.scenario_id.as_deref())
        .await?;
    Ok(json_response(StatusCode::OK, receipt))
}

fn read_body<T>(payload: Result<Json<T>, JsonRejection>, context: &str) -> Result<T, RoiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| RoiError::Validation(format!("{context}: {}", rejection.body_text())))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{
        InMemoryScenarioRepository, Scenario, ScenarioId, ScenarioRepository, ScenarioSummary,
        UuidGenerator,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::fs;
    use std::sync::Arc;
    use std::time::Instant;
    use tower::ServiceExt;

    fn assert_golden_snapshot(path: &str, actual: &str) {
        let update = matches!(
            std::env::var("UPDATE_GOLDEN").as_deref(),
            Ok("1") | Ok("true") | Ok("TRUE")
        );
        let snapshot_path = std::path::Path::new(path);

        if update {
            if let Some(parent) = snapshot_path.parent() {
                fs::create_dir_all(parent).expect("failed to create snapshot directory");
            }
            fs::write(snapshot_path, actual).expect("failed to write golden snapshot");
            return;
        }

        let expected = fs::read_to_string(snapshot_path).unwrap_or_else(|_| {
            panic!("missing golden snapshot at {path}; run with UPDATE_GOLDEN=1 to generate")
        });
        assert_eq!(
            actual, expected,
            "snapshot mismatch for {path}; run with UPDATE_GOLDEN=1 to refresh if expected"
        );
    }

    fn test_router() -> Router {
        router(ScenarioService::new(
            Arc::new(InMemoryScenarioRepository::new()),
            Arc::new(UuidGenerator),
        ))
    }

    fn sample_body() -> Value {
        json!({
            "monthly_invoice_volume": 1000,
            "num_ap_staff": 2,
            "avg_hours_per_invoice": 0.2,
            "hourly_wage": 25,
            "error_rate_manual": 3,
            "error_cost": 50,
            "time_horizon_months": 12,
            "one_time_implementation_cost": 5000
        })
    }

    fn named_body(name: &str) -> Value {
        let mut body = sample_body();
        body["scenario_name"] = json!(name);
        body
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = app.clone().oneshot(request).await.expect("router responds");
        let status = response.status();
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    struct FailingRepository;

    #[async_trait]
    impl ScenarioRepository for FailingRepository {
        async fn insert(&self, _scenario: Scenario, _deadline: Instant) -> Result<(), StoreError> {
            Err(std::io::Error::other("disk full").into())
        }

        async fn list(&self) -> Result<Vec<ScenarioSummary>, StoreError> {
            Err(std::io::Error::other("disk full").into())
        }

        async fn get(&self, _id: &ScenarioId) -> Result<Option<Scenario>, StoreError> {
            Err(std::io::Error::other("disk full").into())
        }

        async fn delete(&self, _id: &ScenarioId, _deadline: Instant) -> Result<bool, StoreError> {
            Err(std::io::Error::other("disk full").into())
        }
    }

    #[test]
    fn golden_snapshot_simulate_worked_example_json() {
        let service = ScenarioService::new(
            Arc::new(InMemoryScenarioRepository::new()),
            Arc::new(UuidGenerator),
        );
        let payload: InputsPayload =
            serde_json::from_value(sample_body()).expect("payload should parse");
        let simulation = service.simulate(&payload).expect("valid simulation");
        let response = SimulateResponse {
            inputs: simulation.inputs,
            results: simulation.results,
            message: SIMULATION_MESSAGE,
        };
        let json = format!(
            "{}\n",
            serde_json::to_string(&response).expect("response should serialize")
        );

        assert_golden_snapshot("tests/golden/simulate_worked_example.json", &json);
    }

    #[tokio::test]
    async fn simulate_returns_inputs_results_and_message() {
        let app = test_router();
        let (status, body) = send(&app, "POST", "/simulate", Some(sample_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"]["monthly_savings"], "6875.00");
        assert_eq!(body["results"]["roi_percentage"], "1550.0");
        assert_eq!(body["results"]["time_horizon_months"], 12);
        assert_eq!(body["inputs"]["monthly_invoice_volume"], 1000.0);
        assert_eq!(body["message"], SIMULATION_MESSAGE);
    }

    #[tokio::test]
    async fn simulate_rejects_zero_volume() {
        let app = test_router();
        let mut payload = sample_body();
        payload["monthly_invoice_volume"] = json!(0);

        let (status, body) = send(&app, "POST", "/simulate", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid invoice volume");
    }

    #[tokio::test]
    async fn overflowing_inputs_are_bad_requests() {
        let app = test_router();
        let mut payload = named_body("huge");
        payload["monthly_invoice_volume"] = json!(1e200);
        payload["avg_hours_per_invoice"] = json!(1e200);

        let (status, body) = send(&app, "POST", "/simulate", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Inputs are too large to project");

        let (status, _) = send(&app, "POST", "/scenarios", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (_, listed) = send(&app, "GET", "/scenarios", None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn simulate_rejects_unknown_fields_and_bad_json() {
        let app = test_router();
        let mut payload = sample_body();
        payload["discount_rate"] = json!(4);

        let (status, body) = send(&app, "POST", "/simulate", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").contains("discount_rate"));

        let mut payload = sample_body();
        payload["hourly_wage"] = json!("twenty");
        let (status, _) = send(&app, "POST", "/simulate", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn scenario_lifecycle_over_http() {
        let app = test_router();

        let (status, created) =
            send(&app, "POST", "/scenarios", Some(named_body("Baseline"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().expect("id string").to_string();
        assert_eq!(created["scenario_name"], "Baseline");
        assert_eq!(created["results"]["net_savings"], "77500.00");
        assert!(created["created_at"].is_string());
        assert!(created["inputs"].get("scenario_name").is_none());

        let (status, listed) = send(&app, "GET", "/scenarios", None).await;
        assert_eq!(status, StatusCode::OK);
        let summaries = listed.as_array().expect("array");
        assert_eq!(summaries.len(), 1);
        let summary = summaries[0].as_object().expect("object");
        let mut keys: Vec<_> = summary.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["created_at", "id", "monthly_savings", "scenario_name"]);
        assert_eq!(summary["monthly_savings"], "6875.00");

        let (status, fetched) = send(&app, "GET", &format!("/scenarios/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, deleted) = send(&app, "DELETE", &format!("/scenarios/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["deleted_count"], 1);
        assert_eq!(deleted["message"], format!("Scenario {id} deleted."));

        let (status, body) = send(&app, "DELETE", &format!("/scenarios/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Scenario not found.");

        let (status, _) = send(&app, "GET", &format!("/scenarios/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_without_name_is_bad_request() {
        let app = test_router();

        let (status, body) = send(&app, "POST", "/scenarios", Some(sample_body())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Scenario name is required.");

        let (_, listed) = send(&app, "GET", "/scenarios", None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let app = test_router();

        let (status, body) = send(&app, "GET", "/scenarios/not-an-id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid scenario ID format.");

        let (status, _) = send(&app, "DELETE", "/scenarios/not-an-id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn report_confirms_without_sending() {
        let app = test_router();
        let (_, created) = send(&app, "POST", "/scenarios", Some(named_body("Board deck"))).await;
        let id = created["id"].as_str().expect("id").to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/report/generate",
            Some(json!({ "email": "cfo@example.com", "scenarioId": id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report_url"], format!("/report.html?id={id}"));
        assert_eq!(body["scenario_data"], created);
        assert!(body["message"].as_str().expect("message").contains("cfo@example.com"));

        let (status, _) = send(
            &app,
            "POST",
            "/report/generate",
            Some(json!({ "email": "cfo.example.com", "scenarioId": id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/report/generate",
            Some(json!({ "email": "cfo@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "POST",
            "/report/generate",
            Some(json!({ "email": "cfo@example.com", "scenarioId": "abc" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid scenario ID format.");

        let absent = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let (status, _) = send(
            &app,
            "POST",
            "/report/generate",
            Some(json!({ "email": "cfo@example.com", "scenarioId": absent })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failure_hides_details() {
        let app = router(ScenarioService::new(
            Arc::new(FailingRepository),
            Arc::new(UuidGenerator),
        ));

        let (status, body) = send(&app, "GET", "/scenarios", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error.");

        let (status, body) = send(&app, "POST", "/scenarios", Some(named_body("x"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().expect("message").contains("disk full"));

        let uri = "/scenarios/67e55044-10b1-426f-9247-bb680e5fe0c8";
        for method in ["GET", "DELETE"] {
            let (status, body) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method}");
            assert_eq!(body["error"], "Internal server error.");
        }
    }

    #[tokio::test]
    async fn health_and_unknown_routes() {
        let app = test_router();

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app, "GET", "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }
}
