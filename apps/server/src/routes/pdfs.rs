use std::io::ErrorKind;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    Extension,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::{ApiError, AppJson, AppState, auth::AuthUser};

const FIELD_NAME: &str = "pdf";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

fn owner_prefix(user_id: u64) -> String {
    format!("user_{}_", user_id)
}

/// Only plain names inside the caller's own namespace are served.
pub fn may_access(user_id: u64, filename: &str) -> bool {
    filename.starts_with(&owner_prefix(user_id))
        && !filename.contains(|c: char| c == '/' || c == '\\')
        && !filename.contains("..")
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<AppJson<UploadResponse>, ApiError> {
    let mut content: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() == Some(FIELD_NAME) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            content = Some(bytes);
            break;
        }
    }

    let Some(content) = content else {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    };

    tokio::fs::create_dir_all(&state.pdf_dir)
        .await
        .map_err(ApiError::internal)?;
    let filename = write_new_file(&state.pdf_dir, user.id, &content).await?;

    tracing::info!(user_id = user.id, filename = %filename, size = content.len(), "pdf_uploaded");
    Ok(AppJson(UploadResponse {
        message: "PDF uploaded successfully".to_string(),
        filename,
    }))
}

// Names are `user_<id>_<millis>.pdf`; a taken millisecond moves on to the next.
async fn write_new_file(dir: &FsPath, user_id: u64, content: &[u8]) -> Result<String, ApiError> {
    let mut millis = chrono::Utc::now().timestamp_millis();

    loop {
        let filename = format!("{}{}.pdf", owner_prefix(user_id), millis);
        let opened = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&filename))
            .await;

        match opened {
            Ok(mut file) => {
                file.write_all(content).await.map_err(ApiError::internal)?;
                file.flush().await.map_err(ApiError::internal)?;
                return Ok(filename);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => millis += 1,
            Err(e) => return Err(ApiError::internal(e)),
        }
    }
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<AppJson<Vec<String>>, ApiError> {
    let prefix = owner_prefix(user.id);

    let mut entries = match tokio::fs::read_dir(&state.pdf_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AppJson(Vec::new())),
        Err(e) => return Err(ApiError::internal(e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(ApiError::internal)? {
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(&prefix) {
                files.push(name.to_string());
            }
        }
    }

    files.sort();
    Ok(AppJson(files))
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !may_access(user.id, &filename) {
        tracing::warn!(user_id = user.id, filename = %filename, "pdf_access_denied");
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    let content = match tokio::fs::read(state.pdf_dir.join(&filename)).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::NotFound("File not found".to_string()));
        }
        Err(e) => return Err(ApiError::internal(e)),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        content,
    )
        .into_response())
}
