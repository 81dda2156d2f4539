//! Axum route handlers for the insight history and generation endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::insights::generate_insight;
use crate::models::insight::AiInsight;
use crate::state::AppState;
use crate::store::handlers::UserIdQuery;

/// GET /api/v1/insights
///
/// Insight history, newest first by generation time.
pub async fn handle_list_insights(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<AiInsight>>, AppError> {
    let session = state.sessions.get(params.user_id).await?;
    let store = session.lock().await;
    Ok(Json(store.insights().to_vec()))
}

#[derive(Deserialize)]
pub struct GenerateInsightRequest {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct GenerateInsightResponse {
    pub insight: AiInsight,
    /// Non-blocking notes, e.g. attachments that could not be loaded.
    pub warnings: Vec<String>,
}

/// POST /api/v1/insights/generate
///
/// Analyzes the user's full journal and appends the resulting report to the
/// insight history. Fails without recording anything if analysis fails.
pub async fn handle_generate_insight(
    State(state): State<AppState>,
    Json(req): Json<GenerateInsightRequest>,
) -> Result<Json<GenerateInsightResponse>, AppError> {
    let session = state.sessions.get(req.user_id).await?;
    let mut store = session.lock().await;

    let entries = store.entries().to_vec();
    let (new_insight, warnings) =
        generate_insight(state.media.as_ref(), state.analyzer.as_ref(), &entries).await?;
    let insight = store.append_insight(new_insight).await?;

    Ok(Json(GenerateInsightResponse { insight, warnings }))
}

#[derive(Deserialize)]
pub struct RecommendRequest {
    pub user_id: Uuid,
    pub themes: String,
    pub emotions: String,
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub actions: String,
}

/// POST /api/v1/insights/recommend
///
/// Recommends concrete actions from already-identified themes and emotions.
pub async fn handle_recommend_actions(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    // Only signed-in users may spend analysis calls.
    state.sessions.get(req.user_id).await?;

    let actions = state.analyzer.recommend(&req.themes, &req.emotions).await?;
    Ok(Json(RecommendResponse { actions }))
}
