//! `/documents*` (§6.1): upload, inspect, commit, download, and delete
//! documents owned by the authenticated principal.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use docforge_core::{CommitMode, Document, Error, SectionTree};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub filename: String,
    pub tree: SectionTree,
}

fn require_owner(state: &AppState, document_id: &str, principal_id: &str) -> Result<Document, ApiError> {
    let document = state
        .documents
        .get(document_id)
        .ok_or_else(|| Error::NotFound(format!("document {document_id}")))?;
    if document.owner != principal_id {
        return Err(Error::NotFound(format!("document {document_id}")).into());
    }
    Ok(document)
}

pub async fn upload(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut filename = "document.docx".to_string();
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            if let Some(name) = field.file_name() {
                filename = name.to_string();
            }
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(format!("could not read upload: {e}")))?;
            if data.len() as u64 > state.config.max_upload_bytes {
                return Err(Error::Validation("upload exceeds max_upload_bytes".to_string()).into());
            }
            bytes = Some(data.to_vec());
        }
    }

    let bytes = bytes.ok_or_else(|| Error::Validation("missing 'file' field".to_string()))?;
    let document_id = uuid::Uuid::new_v4().to_string();

    let storage_path = state.storage.store_document(&document_id, &bytes)?;
    let tree = state.store.load(&document_id, &bytes)?;

    state.documents.insert(Document {
        id: document_id.clone(),
        filename: filename.clone(),
        storage_path: storage_path.display().to_string(),
        owner: principal_id,
        uploaded_at: Utc::now(),
    });

    Ok(Json(UploadResponse {
        document_id,
        filename,
        tree,
    }))
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: Document,
    pub tree: SectionTree,
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = require_owner(&state, &id, &principal_id)?;
    let tree = state.store.tree(&id)?;
    Ok(Json(DocumentResponse { document, tree }))
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
) -> Json<Vec<Document>> {
    Json(state.documents.list_for_owner(&principal_id))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
    Path(id): Path<String>,
) -> Result<(), ApiError> {
    require_owner(&state, &id, &principal_id)?;
    state.documents.remove(&id);
    state.store.remove(&id);
    Ok(())
}

pub async fn download(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_owner(&state, &id, &principal_id)?;
    let bytes = state.storage.read_document(&id)?;
    Ok((
        [(
            axum::http::header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        )],
        bytes,
    ))
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub section_id: String,
    pub content: String,
    pub mode: CommitMode,
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub section_hash: String,
}

pub async fn commit(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<CommitRequest>,
) -> Result<Json<CommitResponse>, ApiError> {
    require_owner(&state, &id, &principal_id)?;
    let tree = state.store.tree(&id)?;
    let section = tree
        .find_by_id(&body.section_id)
        .ok_or_else(|| Error::NotFound(format!("section {}", body.section_id)))?
        .clone();

    state.commit.commit(
        &state.store,
        &id,
        &section.full_path,
        &section.heading,
        &section.section_hash,
        &body.content,
        body.mode,
    )?;

    Ok(Json(CommitResponse {
        section_hash: section.section_hash,
    }))
}
