use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{Student, StudentId},
    error::{ApiError, ErrorCode},
    protocol::{AttendanceResponse, DeleteResponse, UpdateStudentRequest},
};
use storage::Storage;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{ApiContext, AttendanceBody, CreateStudentBody};
use app_state::AppState;
use config::{load_settings, normalize_database_url};

type HttpResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = connect_with_retry(
        &database_url,
        settings.db_connect_attempts,
        settings.db_connect_retry_delay,
    )
    .await
    .map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "record service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn connect_with_retry(
    database_url: &str,
    attempts: u32,
    delay: Duration,
) -> anyhow::Result<Storage> {
    let mut last_error = None;
    for attempt in 1..=attempts {
        match Storage::new(database_url).await {
            Ok(storage) => {
                info!(attempt, "records: connected to database");
                return Ok(storage);
            }
            Err(error) => {
                warn!(attempt, attempts, %error, "records: database connection failed");
                last_error = Some(error);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow!("no connection attempts configured"))
        .context(format!(
            "could not connect to the database after {attempts} attempts"
        )))
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/students", get(http_list_students).post(http_create_student))
        .route(
            "/students/:student_id",
            get(http_get_student)
                .put(http_update_student)
                .delete(http_delete_student),
        )
        .route("/students/:student_id/attendance", post(http_record_attendance))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => {
            error!(message = %err.message, "records: internal error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err))
}

fn bad_json(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    reject(ApiError::validation(rejection.body_text()))
}

fn bad_path(rejection: PathRejection) -> (StatusCode, Json<ApiError>) {
    reject(ApiError::validation(rejection.body_text()))
}

async fn home() -> &'static str {
    "student records service is running"
}

async fn http_list_students(State(state): State<Arc<AppState>>) -> HttpResult<Json<Vec<Student>>> {
    api::list_students(&state.api).await.map(Json).map_err(reject)
}

async fn http_get_student(
    State(state): State<Arc<AppState>>,
    student_id: Result<Path<i64>, PathRejection>,
) -> HttpResult<Json<Student>> {
    let Path(student_id) = student_id.map_err(bad_path)?;
    api::get_student(&state.api, StudentId(student_id))
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_create_student(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateStudentBody>, JsonRejection>,
) -> HttpResult<(StatusCode, Json<Student>)> {
    let Json(body) = payload.map_err(bad_json)?;
    let student = api::create_student(&state.api, body)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn http_update_student(
    State(state): State<Arc<AppState>>,
    student_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateStudentRequest>, JsonRejection>,
) -> HttpResult<Json<Student>> {
    let Path(student_id) = student_id.map_err(bad_path)?;
    let Json(body) = payload.map_err(bad_json)?;
    api::update_student(&state.api, StudentId(student_id), body)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_delete_student(
    State(state): State<Arc<AppState>>,
    student_id: Result<Path<i64>, PathRejection>,
) -> HttpResult<Json<DeleteResponse>> {
    let Path(student_id) = student_id.map_err(bad_path)?;
    api::delete_student(&state.api, StudentId(student_id))
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_record_attendance(
    State(state): State<Arc<AppState>>,
    student_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AttendanceBody>, JsonRejection>,
) -> HttpResult<Json<AttendanceResponse>> {
    let Path(student_id) = student_id.map_err(bad_path)?;
    let Json(body) = payload.map_err(bad_json)?;
    api::record_attendance(&state.api, StudentId(student_id), body)
        .await
        .map(Json)
        .map_err(reject)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
