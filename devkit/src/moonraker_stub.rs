/*!
Stub Moonraker API pour tests sans imprimante

Serves `/printer/info` and `/printer/objects/query` from an in-memory status map on a
local port. Every request is recorded so tests can assert on what the exporter asked
for, and each route can be switched to fail.
*/

use anyhow::Result;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How a stub route answers.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteMode {
    Ok,
    /// Answer with this HTTP status and an error body.
    Status(u16),
    /// Answer 200 with a body that is not a Moonraker envelope.
    Malformed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    /// Raw query string, undecoded.
    pub query: Option<String>,
}

impl RecordedRequest {
    /// Object names requested by a status query, decoded, in order.
    pub fn object_names(&self) -> Vec<String> {
        split_query(self.query.as_deref())
    }
}

struct StubState {
    status: Mutex<Map<String, Value>>,
    info_mode: Mutex<RouteMode>,
    query_mode: Mutex<RouteMode>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process Moonraker stand-in bound to `127.0.0.1:<random>`.
pub struct MoonrakerStub {
    addr: SocketAddr,
    state: Arc<StubState>,
    handle: JoinHandle<()>,
}

impl MoonrakerStub {
    pub async fn start() -> Result<Self> {
        let state = Arc::new(StubState {
            status: Mutex::new(Map::new()),
            info_mode: Mutex::new(RouteMode::Ok),
            query_mode: Mutex::new(RouteMode::Ok),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/printer/info", get(printer_info))
            .route("/printer/objects/query", get(objects_query))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("[stub] server stopped: {}", e);
            }
        });
        log::info!("[stub] moonraker stub listening on {}", addr);

        Ok(Self { addr, state, handle })
    }

    /// Base URL to hand to the exporter as its Moonraker endpoint.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replaces the full status map (`{object_name: {field: value}}`).
    pub fn set_status(&self, status: Value) {
        let map = match status {
            Value::Object(map) => map,
            other => panic!("status must be a JSON object, got {other}"),
        };
        *self.state.status.lock().unwrap() = map;
    }

    pub fn set_info_mode(&self, mode: RouteMode) {
        *self.state.info_mode.lock().unwrap() = mode;
    }

    pub fn set_query_mode(&self, mode: RouteMode) {
        *self.state.query_mode.lock().unwrap() = mode;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests received on the given path.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn clear(&self) {
        self.state.requests.lock().unwrap().clear();
    }

    /// URL of a local port with nothing listening, for connection-failure tests.
    pub async fn unreachable_endpoint() -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);
        Ok(format!("http://{}", addr))
    }
}

impl Drop for MoonrakerStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn record(state: &StubState, path: &str, query: Option<String>) {
    state.requests.lock().unwrap().push(RecordedRequest { path: path.to_string(), query });
}

fn failure(mode: &RouteMode) -> Option<Response> {
    match mode {
        RouteMode::Ok => None,
        RouteMode::Status(code) => {
            let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Some((status, Json(json!({"error": {"code": code, "message": "stub failure"}}))).into_response())
        }
        RouteMode::Malformed => Some((StatusCode::OK, "<html>klippy not ready</html>").into_response()),
    }
}

async fn printer_info(State(state): State<Arc<StubState>>) -> Response {
    record(&state, "/printer/info", None);
    let mode = state.info_mode.lock().unwrap().clone();
    if let Some(resp) = failure(&mode) {
        return resp;
    }
    Json(json!({
        "result": {
            "state": "ready",
            "state_message": "Printer is ready",
            "hostname": "stub",
            "software_version": "v0.12.0-stub"
        }
    }))
    .into_response()
}

async fn objects_query(State(state): State<Arc<StubState>>, RawQuery(query): RawQuery) -> Response {
    record(&state, "/printer/objects/query", query.clone());
    let mode = state.query_mode.lock().unwrap().clone();
    if let Some(resp) = failure(&mode) {
        return resp;
    }

    // Moonraker only returns the objects that were asked for and exist.
    let all = state.status.lock().unwrap().clone();
    let mut status = Map::new();
    for name in split_query(query.as_deref()) {
        if let Some(value) = all.get(&name) {
            status.insert(name, value.clone());
        }
    }

    Json(json!({"result": {"eventtime": 1234.56, "status": status}})).into_response()
}

fn split_query(query: Option<&str>) -> Vec<String> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            urlencoding::decode(part)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| part.to_string())
        })
        .collect()
}
