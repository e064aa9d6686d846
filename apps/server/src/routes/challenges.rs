use std::sync::Arc;

use axum::{Extension, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    ApiError, AppJson, AppState,
    auth::AuthUser,
    state::{ChallengeCompletion, ChallengeId, LeaderboardEntry},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub challenge_id: ChallengeId,
}

pub async fn complete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    AppJson(body): AppJson<CompleteRequest>,
) -> Result<(StatusCode, AppJson<ChallengeCompletion>), ApiError> {
    let completion = state
        .db
        .write()
        .await
        .complete_challenge(user.id, body.challenge_id);
    Ok((StatusCode::CREATED, AppJson(completion)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> AppJson<Vec<ChallengeCompletion>> {
    AppJson(state.db.read().await.completions_for(user.id))
}

pub async fn leaderboard(State(state): State<Arc<AppState>>) -> AppJson<Vec<LeaderboardEntry>> {
    AppJson(state.db.read().await.leaderboard())
}
