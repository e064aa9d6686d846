use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub doctor: String,
}

impl RecordInput {
    pub fn new(
        kind: impl Into<String>,
        description: impl Into<String>,
        doctor: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
            doctor: doctor.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Record {
    pub id: u64,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub doctor: String,
    pub patient: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChallengeId {
    Number(u64),
    Text(String),
}

impl From<u64> for ChallengeId {
    fn from(id: u64) -> Self {
        ChallengeId::Number(id)
    }
}

impl From<&str> for ChallengeId {
    fn from(id: &str) -> Self {
        ChallengeId::Text(id.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteChallengeRequest {
    pub challenge_id: ChallengeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeCompletion {
    pub id: u64,
    pub user: u64,
    pub challenge_id: ChallengeId,
    pub completed_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}
