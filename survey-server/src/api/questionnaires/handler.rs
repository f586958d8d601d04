//! Questionnaire API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{Questionnaire, QuestionnaireCreate, QuestionnaireUpdate};
use crate::db::repository::QuestionnaireRepository;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_TEXT_LEN, validate_questions, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/questionnaires - 获取所有问卷
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Questionnaire>>> {
    let repo = QuestionnaireRepository::new(state.db.clone());
    let questionnaires = repo.find_all().await?;
    Ok(Json(questionnaires))
}

/// GET /api/questionnaires/:id - 获取单个问卷
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Questionnaire>> {
    let repo = QuestionnaireRepository::new(state.db.clone());
    let questionnaire = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Questionnaire {} not found", id)))?;
    Ok(Json(questionnaire))
}

/// POST /api/questionnaires - 创建问卷
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<QuestionnaireCreate>,
) -> AppResult<Json<Questionnaire>> {
    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    if payload.description.len() > MAX_TEXT_LEN {
        return Err(AppError::validation("description is too long"));
    }
    validate_questions(&payload.questions)?;

    let repo = QuestionnaireRepository::new(state.db.clone());
    let questionnaire = repo.create(payload).await?;
    Ok(Json(questionnaire))
}

/// PUT /api/questionnaires/:id - 更新问卷 (含激活/停用)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<QuestionnaireUpdate>,
) -> AppResult<Json<Questionnaire>> {
    if let Some(title) = &payload.title {
        validate_required_text(title, "title", MAX_NAME_LEN)?;
    }
    if let Some(questions) = &payload.questions {
        validate_questions(questions)?;
    }

    let repo = QuestionnaireRepository::new(state.db.clone());
    let questionnaire = repo.update(&id, payload).await?;
    Ok(Json(questionnaire))
}

/// DELETE /api/questionnaires/:id - 删除问卷 (级联分配和回答)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = QuestionnaireRepository::new(state.db.clone());
    repo.find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Questionnaire {} not found", id)))?;
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
