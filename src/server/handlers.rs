//! HTTP request handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    extract::{json_body, ClientContext, SessionId},
    AppState,
};
use crate::session::ServiceResult;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendQuestionRequest {
    pub question: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateSessionRequest {
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenameSessionRequest {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FollowUpRequest {
    pub topic: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImproveAnswerRequest {
    pub question: String,
    pub answer: String,
}

type CookieResponse = ServiceResult<(SignedCookieJar, Json<Value>)>;

pub async fn send_question(
    State(state): State<AppState>,
    ctx: ClientContext,
    payload: Result<Json<SendQuestionRequest>, JsonRejection>,
) -> ServiceResult<Json<Value>> {
    let request = json_body(payload)?;
    let answered = state.service.submit_question(&ctx.active, &request.question).await?;

    Ok(Json(json!({
        "success": true,
        "question": answered.question,
        "answer": answered.answer,
        "timestamp": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "session_id": answered.session_id,
    })))
}

pub async fn list_sessions(State(state): State<AppState>) -> ServiceResult<Json<Value>> {
    let sessions = state.service.list_sessions().await?;
    Ok(Json(json!({ "success": true, "sessions": sessions })))
}

pub async fn create_session(
    State(state): State<AppState>,
    mut ctx: ClientContext,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> CookieResponse {
    // A bodiless request simply means "no title".
    let request = match payload {
        Err(JsonRejection::MissingJsonContentType(_)) => CreateSessionRequest::default(),
        other => json_body(other)?,
    };

    let session = state
        .service
        .create_session(&mut ctx.active, request.title.as_deref())
        .await?;

    Ok((ctx.into_jar(), Json(json!({ "success": true, "session": session }))))
}

pub async fn get_session(State(state): State<AppState>, SessionId(id): SessionId) -> ServiceResult<Json<Value>> {
    let detail = state.service.get_session_detail(id).await?;
    Ok(Json(json!({
        "success": true,
        "session": detail.session,
        "interactions": detail.interactions,
    })))
}

pub async fn activate_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    mut ctx: ClientContext,
) -> CookieResponse {
    let session = state.service.activate_session(&mut ctx.active, id).await?;
    Ok((ctx.into_jar(), Json(json!({ "success": true, "session": session }))))
}

pub async fn delete_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    mut ctx: ClientContext,
) -> CookieResponse {
    state.service.delete_session(&mut ctx.active, id).await?;
    Ok((
        ctx.into_jar(),
        Json(json!({ "success": true, "message": "Session deleted successfully" })),
    ))
}

pub async fn rename_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    payload: Result<Json<RenameSessionRequest>, JsonRejection>,
) -> ServiceResult<Json<Value>> {
    let request = json_body(payload)?;
    let session = state.service.rename_session(id, &request.title).await?;
    Ok(Json(json!({ "success": true, "session": session })))
}

pub async fn current_session(State(state): State<AppState>, mut ctx: ClientContext) -> CookieResponse {
    let session = state.service.current_session(&mut ctx.active).await?;
    Ok((ctx.into_jar(), Json(json!({ "success": true, "session": session }))))
}

pub async fn follow_up_questions(
    State(state): State<AppState>,
    payload: Result<Json<FollowUpRequest>, JsonRejection>,
) -> ServiceResult<Json<Value>> {
    let request = json_body(payload)?;
    let questions = state.service.follow_up_questions(&request.topic).await?;
    Ok(Json(json!({ "success": true, "questions": questions })))
}

pub async fn improve_answer(
    State(state): State<AppState>,
    payload: Result<Json<ImproveAnswerRequest>, JsonRejection>,
) -> ServiceResult<Json<Value>> {
    let request = json_body(payload)?;
    let answer = state
        .service
        .improve_answer(&request.question, &request.answer)
        .await?;
    Ok(Json(json!({
        "success": true,
        "question": request.question.trim(),
        "answer": answer,
    })))
}
