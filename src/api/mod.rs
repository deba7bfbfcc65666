use std::convert::Infallible;

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Query};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::extraction::ImageInput;
use crate::models::*;
use crate::services::{ClassmateGroups, UploadPipeline, classmates};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserQueryParams {
    exclude_user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleQueryParams {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScheduleRequest {
    pub user_id: String,
    pub schedule: ExtractedSchedule,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub schedule: Option<ExtractedSchedule>,
    pub classmates: ClassmateGroups,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseDump {
    pub users: Vec<User>,
    pub courses: Vec<Course>,
    pub schedules: Vec<Schedule>,
    pub enrollments: Vec<Enrollment>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users).post(register_user))
        .route("/schedules", get(get_schedule).post(save_schedule))
        .route("/generate", post(generate))
        .route("/debug/db", get(dump_database).delete(clear_database))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<NewUserRequest>
) -> Result<Json<User>, AppError> {
    if req.id.trim().is_empty() {
        return Err(AppError::BadRequest("User ID required".to_string()));
    }
    let user = repository::upsert_user(&state.db, req).await?;
    Ok(Json(user))
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserQueryParams>
) -> Result<Json<UsersResponse>, AppError> {
    let users = repository::fetch_users_with_schedule(&state.db, params.exclude_user_id.as_deref()).await?;
    Ok(Json(UsersResponse { users }))
}

async fn save_schedule(
    State(state): State<AppState>,
    Json(req): Json<SaveScheduleRequest>
) -> Result<Json<Schedule>, AppError> {
    if state.config.skip_database {
        return Err(AppError::BadRequest("database writes are disabled in preview mode".to_string()));
    }
    let schedule = state.schedules.save_schedule(&req.user_id, &req.schedule).await?;
    Ok(Json(schedule))
}

async fn get_schedule(
    State(state): State<AppState>,
    Query(params): Query<ScheduleQueryParams>
) -> Result<Json<ScheduleResponse>, AppError> {
    let user_id = params
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("User ID required".to_string()))?;

    let empty = ScheduleResponse {
        schedule: None,
        classmates: ClassmateGroups::new(),
        schedule_id: None,
    };
    if state.config.skip_database {
        return Ok(Json(empty));
    }

    let own = repository::fetch_enrollment_details(&state.db, &user_id).await?;
    let Some(stored) = crate::services::schedule_service::stored_schedule(&own) else {
        return Ok(Json(empty));
    };
    let classmates = classmates::group_classmates(&state.db, &user_id, &own).await?;

    Ok(Json(ScheduleResponse {
        schedule: Some(stored.schedule),
        classmates,
        schedule_id: Some(stored.schedule_id),
    }))
}

async fn generate(
    State(state): State<AppState>,
    mut multipart: Multipart
) -> Result<Response, AppError> {
    let mut image = None;
    let mut user_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read image: {}", e)))?;
                image = Some(ImageInput {
                    mime_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("userId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read userId: {}", e)))?;
                user_id = Some(text).filter(|id| !id.is_empty());
            }
            _ => {}
        }
    }

    let image = image
        .filter(|image| !image.bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("No image provided".to_string()))?;
    let user_id = user_id.ok_or(AppError::Unauthorized)?;

    info!("processing upload from user {} ({} bytes)", user_id, image.bytes.len());
    let pipeline = UploadPipeline::new(
        state.extractor.clone(),
        state.schedules.clone(),
        state.config.skip_database,
    );
    let events = pipeline
        .run(user_id, image)
        .map(|event| Ok::<_, Infallible>(event.to_ndjson()));

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(events),
    )
        .into_response())
}

async fn dump_database(State(state): State<AppState>) -> Result<Json<DatabaseDump>, AppError> {
    if !state.config.enable_debug_routes {
        return Err(AppError::NotFound);
    }
    Ok(Json(DatabaseDump {
        users: repository::fetch_all_users(&state.db).await?,
        courses: repository::fetch_all_courses(&state.db).await?,
        schedules: repository::fetch_all_schedules(&state.db).await?,
        enrollments: repository::fetch_all_enrollments(&state.db).await?,
    }))
}

async fn clear_database(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    if !state.config.enable_debug_routes {
        return Err(AppError::NotFound);
    }
    repository::clear_all(&state.db).await?;
    info!("database cleared");
    Ok(StatusCode::NO_CONTENT)
}
