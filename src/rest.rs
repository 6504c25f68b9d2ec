/*!
duckdb-loader REST API Server

Serves the interactive web UI and the JSON endpoints behind it.

## Usage

```bash
duckdb-loader-rest --host 127.0.0.1 --port 5000
```

## Endpoints

- `GET  /` - Interactive UI page
- `POST /connect` - Switch between an in-memory and a file-backed database
- `POST /generate` - Generate a synthetic CSV file
- `POST /load` - Load a CSV or Parquet file into a table
- `POST /rename` - Rename a table
- `POST /query/run` - Run SQL (results capped at `--max-rows`)
- `GET  /tables/json` - Tables and their schemas
- `GET  /health` - Health check

Every response carries `"ok"`. Failures answer with HTTP 400 and
`{"ok": false, "error": ..., "kind": ...}`.

This server can read any path on the machine it runs on. It binds to
loopback by default; do not expose it on a shared network.
*/

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duckdb_loader::reader::{ConnectionMode, DuckDBManager};
use duckdb_loader::sample::{generate_sample_csv, SampleSpec};
use duckdb_loader::{LoaderError, QueryResult, MAX_ROWS, VERSION};

static INDEX_HTML: &str = include_str!("templates/index.html");

/// CLI arguments for the REST API server
#[derive(Parser)]
#[command(name = "duckdb-loader-rest")]
#[command(about = "duckdb-loader web UI and REST API server")]
#[command(version = VERSION)]
struct Cli {
    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind to
    #[arg(long, default_value = "5000")]
    port: u16,

    /// Initial database (duckdb://memory or duckdb://<path>)
    #[arg(long, default_value = "duckdb://memory")]
    db: String,

    /// Load data from file(s) into the initial database
    /// Supports: CSV, Parquet
    /// Example: --load-data data.csv --load-data other.parquet
    #[arg(long = "load-data")]
    load_data_files: Vec<String>,

    /// Maximum rows returned by /query/run
    #[arg(long, default_value_t = MAX_ROWS)]
    max_rows: usize,

    /// CORS allowed origins (comma-separated, "*" for any); no CORS when omitted
    #[arg(long)]
    cors_origin: Option<String>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    /// The one active connection, replaced wholesale by /connect.
    /// Wrapped in Arc<Mutex> since DuckDB Connection is not Sync
    manager: Arc<Mutex<DuckDBManager>>,

    /// Row cap applied to every query result
    max_rows: usize,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for /connect
#[derive(Debug, Deserialize)]
struct ConnectRequest {
    #[serde(default)]
    mode: String,
    db_path: Option<String>,
}

/// Request body for /generate
#[derive(Debug, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    rows: i64,
    #[serde(default)]
    string_cols: i64,
    #[serde(default)]
    double_cols: i64,
    #[serde(default = "default_distribution")]
    distribution: String,
}

fn default_distribution() -> String {
    "uniform".to_string()
}

/// Request body for /load
#[derive(Debug, Deserialize)]
struct LoadRequest {
    #[serde(default)]
    path: String,
    table_name: Option<String>,
}

/// Request body for /rename
#[derive(Debug, Deserialize)]
struct RenameRequest {
    #[serde(default)]
    old: String,
    #[serde(default)]
    new: String,
}

/// Request body for /query/run
#[derive(Debug, Deserialize)]
struct SqlRequest {
    #[serde(default)]
    sql: String,
}

/// Successful API response; `data` fields sit next to `ok`
#[derive(Debug, Serialize)]
struct ApiSuccess<T> {
    ok: bool,
    #[serde(flatten)]
    data: T,
}

impl<T> ApiSuccess<T> {
    fn new(data: T) -> Json<Self> {
        Json(ApiSuccess { ok: true, data })
    }
}

/// No payload beyond `ok`
#[derive(Debug, Serialize)]
struct Empty {}

#[derive(Debug, Serialize)]
struct GenerateResult {
    path: String,
}

#[derive(Debug, Serialize)]
struct LoadResult {
    table: String,
}

#[derive(Debug, Serialize)]
struct TablesResult {
    tables: Vec<String>,
    schemas: BTreeMap<String, Vec<(String, String)>>,
}

#[derive(Debug, Serialize)]
struct HealthResult {
    version: String,
    mode: Option<&'static str>,
}

/// Error API response
#[derive(Debug, Serialize)]
struct ApiError {
    ok: bool,
    error: String,
    kind: String,
}

// ============================================================================
// Error Handling
// ============================================================================

/// Every failure is reported as 400 with the raw message
struct ApiErrorResponse {
    status: StatusCode,
    error: ApiError,
}

impl ApiErrorResponse {
    fn new(kind: &str, message: String) -> Self {
        ApiErrorResponse {
            status: StatusCode::BAD_REQUEST,
            error: ApiError {
                ok: false,
                error: message,
                kind: kind.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<LoaderError> for ApiErrorResponse {
    fn from(err: LoaderError) -> Self {
        ApiErrorResponse::new(err.kind(), err.to_string())
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        ApiErrorResponse::new("BadRequest", rejection.body_text())
    }
}

type ApiResult<T> = Result<Json<ApiSuccess<T>>, ApiErrorResponse>;

// ============================================================================
// Helper Functions
// ============================================================================

/// Lock the manager, recovering from poison.
///
/// `connect` swaps the connection in a single assignment, so a panicking
/// request never leaves the manager half-updated.
fn lock_manager(state: &AppState) -> MutexGuard<'_, DuckDBManager> {
    state.manager.lock().unwrap_or_else(|poisoned| {
        warn!("Recovering database connection from poisoned mutex");
        poisoned.into_inner()
    })
}

fn load_data_files(manager: &DuckDBManager, files: &[String]) -> Result<(), LoaderError> {
    for file_path in files {
        let table = manager.load_file(file_path, None)?;
        info!("Successfully loaded {} as table '{}'", file_path, table);
    }
    Ok(())
}

// ============================================================================
// Handler Functions
// ============================================================================

/// GET / - Interactive UI
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// POST /connect - Replace the active connection
async fn connect_handler(
    State(state): State<AppState>,
    payload: Result<Json<ConnectRequest>, JsonRejection>,
) -> ApiResult<Empty> {
    let Json(request) = payload?;
    let mode = ConnectionMode::from_request(&request.mode, request.db_path.as_deref())?;

    let mut manager = lock_manager(&state);
    manager.connect(mode)?;

    Ok(ApiSuccess::new(Empty {}))
}

/// POST /generate - Write a synthetic CSV file
async fn generate_handler(
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<GenerateResult> {
    let Json(request) = payload?;
    let spec = SampleSpec::new(
        request.rows,
        request.string_cols,
        request.double_cols,
        &request.distribution,
    )?;
    let path = tokio::task::spawn_blocking(move || generate_sample_csv(&spec))
        .await
        .map_err(|e| {
            ApiErrorResponse::new("InternalError", format!("Sample generation failed: {}", e))
        })??;

    Ok(ApiSuccess::new(GenerateResult {
        path: path.display().to_string(),
    }))
}

/// POST /load - Load a file into a table
async fn load_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoadRequest>, JsonRejection>,
) -> ApiResult<LoadResult> {
    let Json(request) = payload?;
    let manager = lock_manager(&state);
    let table = manager.load_file(&request.path, request.table_name.as_deref())?;

    Ok(ApiSuccess::new(LoadResult { table }))
}

/// POST /rename - Rename a table
async fn rename_handler(
    State(state): State<AppState>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> ApiResult<Empty> {
    let Json(request) = payload?;
    let manager = lock_manager(&state);
    manager.rename_table(&request.old, &request.new)?;

    Ok(ApiSuccess::new(Empty {}))
}

/// POST /query/run - Run SQL with the server's row cap
async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<SqlRequest>, JsonRejection>,
) -> ApiResult<QueryResult> {
    let Json(request) = payload?;
    info!("Executing SQL: {} chars", request.sql.len());

    let manager = lock_manager(&state);
    let result = manager.run_query(&request.sql, state.max_rows)?;

    Ok(ApiSuccess::new(result))
}

/// GET /tables/json - All tables with their schemas
async fn tables_handler(State(state): State<AppState>) -> ApiResult<TablesResult> {
    let manager = lock_manager(&state);
    let tables = manager.list_tables()?;
    let schemas = tables
        .iter()
        .map(|table| Ok((table.clone(), manager.get_schema(table)?)))
        .collect::<Result<BTreeMap<_, _>, LoaderError>>()?;

    Ok(ApiSuccess::new(TablesResult { tables, schemas }))
}

/// GET /health - Health check
async fn health_handler(State(state): State<AppState>) -> ApiResult<HealthResult> {
    let manager = lock_manager(&state);
    Ok(ApiSuccess::new(HealthResult {
        version: VERSION.to_string(),
        mode: manager.mode().map(|m| m.name()),
    }))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/connect", post(connect_handler))
        .route("/generate", post(generate_handler))
        .route("/load", post(load_handler))
        .route("/rename", post(rename_handler))
        .route("/query/run", post(query_handler))
        .route("/tables/json", get(tables_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "duckdb_loader=info,duckdb_loader_rest=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Opening {}", cli.db);
    let manager = DuckDBManager::from_connection_string(&cli.db)?;
    if !cli.load_data_files.is_empty() {
        info!("Loading {} data file(s)", cli.load_data_files.len());
        load_data_files(&manager, &cli.load_data_files)?;
    }

    let state = AppState {
        manager: Arc::new(Mutex::new(manager)),
        max_rows: cli.max_rows,
    };

    let mut app = router(state);

    if let Some(cors_origin) = &cli.cors_origin {
        let cors = if cors_origin == "*" {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(vec![header::CONTENT_TYPE])
        } else {
            let origins: Vec<_> = cors_origin
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(vec![header::CONTENT_TYPE])
        };
        app = app.layer(cors);
    }

    let app = app.layer(tower_http::trace::TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;

    warn!("This app can access any path on this machine. Do not expose it on a shared network.");
    info!("Starting duckdb-loader on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
