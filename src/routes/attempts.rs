use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::SubmissionRequest;
use crate::middleware::auth::AuthUser;
use crate::AppState;

#[axum::debug_handler]
pub async fn start_attempt(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(test_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let attempt = state.attempt_service.start_attempt(test_id, &user).await?;
    Ok(Json(attempt).into_response())
}

#[axum::debug_handler]
pub async fn get_in_progress(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(test_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let attempt = state.attempt_service.get_in_progress(test_id, &user).await?;
    Ok(Json(attempt).into_response())
}

#[axum::debug_handler]
pub async fn fetch_questions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((test_id, attempt_id)): Path<(Uuid, Uuid)>,
) -> crate::error::Result<Response> {
    let questions = state
        .attempt_service
        .fetch_questions(test_id, attempt_id, &user)
        .await?;
    Ok(Json(questions).into_response())
}

#[axum::debug_handler]
pub async fn submit_attempt(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<SubmissionRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let result = state
        .attempt_service
        .submit(attempt_id, &user, &req.answers)
        .await?;
    Ok(Json(result).into_response())
}

#[axum::debug_handler]
pub async fn get_attempt_details(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let details = state.attempt_service.attempt_details(attempt_id, &user).await?;
    Ok(Json(details).into_response())
}

#[axum::debug_handler]
pub async fn my_results(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> crate::error::Result<Response> {
    let results = state.attempt_service.student_results(&user).await?;
    Ok(Json(results).into_response())
}

#[axum::debug_handler]
pub async fn test_results(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(test_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let results = state.attempt_service.test_results(test_id, &user).await?;
    Ok(Json(results).into_response())
}
