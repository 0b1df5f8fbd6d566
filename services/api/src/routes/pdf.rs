//! `/api/pdf` routes

use auth::models::AuthUser;
use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use notes::SourceKind;
use tracing::{info, warn};

use super::answer_question;
use crate::{
    error::{ApiError, ApiResult},
    middleware::require_auth,
    models::{
        Pagination,
        chat::{
            ChatHistoriesResponse, ChatHistoryResponse, ChatMessageResponse, ChatRequest,
            ChatTarget, PdfChatHistoryItem,
        },
        pdf::{
            NewPdf, Pdf, PdfDeleteResponse, PdfGenerateResponse, PdfListResponse, PdfResponse,
            PdfUploadResponse,
        },
    },
    state::AppState,
};

const PDF_NOT_FOUND: &str = "PDF not found";
const NOTES_NOT_READY: &str = "PDF notes not generated yet. Please generate notes first.";

/// Room for multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router<AppState> {
    let body_limit = state.config.uploads.max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/upload",
            post(upload_pdf).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/", get(list_pdfs))
        .route("/chat/histories", get(chat_histories))
        .route("/:id", get(get_pdf).delete(delete_pdf))
        .route("/:id/generate", post(generate_notes))
        .route("/:id/chat", post(send_message).get(chat_history))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

async fn owned_pdf(state: &AppState, id: i64, user: &AuthUser) -> ApiResult<Pdf> {
    state
        .pdfs
        .find_for_user(id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found(PDF_NOT_FOUND))
}

fn is_pdf_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf")
}

fn size_limit_message(max_file_size: usize) -> String {
    format!(
        "File size exceeds maximum allowed size ({}MB)",
        max_file_size / (1024 * 1024)
    )
}

/// Store an uploaded PDF and extract its text
pub async fn upload_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let max_file_size = state.config.uploads.max_file_size;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if !is_pdf_name(&file_name) {
            return Err(ApiError::bad_request("Only PDF files are allowed"));
        }
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if bytes.len() > max_file_size {
        return Err(ApiError::bad_request(size_limit_message(max_file_size)));
    }

    let path = state.uploads.save(user.id, &file_name, &bytes).await?;
    let extracted = state
        .notes
        .pdf_extractor
        .extract(&path)
        .await
        .filter(|text| text.has_text());
    let status = if extracted.is_some() { "processing" } else { "failed" };

    let stored_path = path.to_string_lossy().to_string();
    let new_pdf = NewPdf {
        user_id: user.id,
        file_name,
        file_path: stored_path.clone(),
        file_size: bytes.len() as i64,
        page_count: extracted.as_ref().map(|t| t.page_count),
        extracted_text: extracted.map(|t| t.text),
    };

    let pdf = match state.pdfs.create(&new_pdf).await {
        Ok(pdf) => pdf,
        Err(e) => {
            state.uploads.remove(&stored_path).await;
            return Err(e.into());
        }
    };
    info!("User {} uploaded PDF {} ({} bytes)", user.id, pdf.id, pdf.file_size);

    Ok((
        StatusCode::CREATED,
        Json(PdfUploadResponse {
            message: "PDF uploaded successfully".to_string(),
            pdf_id: pdf.id,
            file_name: pdf.file_name,
            file_size: pdf.file_size,
            page_count: pdf.page_count,
            status: status.to_string(),
        }),
    ))
}

/// Generate notes for an uploaded PDF, re-extracting text when needed
pub async fn generate_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf = owned_pdf(&state, id, &user).await?;
    if pdf.is_ready() {
        return Ok(Json(PdfGenerateResponse::completed(
            "Notes already generated",
            pdf,
        )));
    }

    let text = match pdf.extracted_text.clone().filter(|t| !t.trim().is_empty()) {
        Some(text) => text,
        None => {
            let extracted = state
                .notes
                .pdf_extractor
                .extract(std::path::Path::new(&pdf.file_path))
                .await
                .filter(|text| text.has_text())
                .ok_or_else(|| {
                    ApiError::ProcessingFailed("Failed to extract text from PDF".to_string())
                })?;
            state
                .pdfs
                .update_text(pdf.id, &extracted.text, extracted.page_count)
                .await?;
            extracted.text
        }
    };

    let notes = state
        .notes
        .generator
        .generate(SourceKind::Pdf, &pdf.file_name, &text)
        .await
        .ok_or_else(|| {
            warn!("Note generation failed for PDF {}", pdf.id);
            ApiError::ProcessingFailed("Failed to generate notes. Please try again.".to_string())
        })?;

    let pdf = state.pdfs.save_notes(pdf.id, &notes).await?;
    info!("Stored notes for PDF {} (user {})", pdf.id, user.id);

    Ok(Json(PdfGenerateResponse::completed(
        "Notes generated successfully",
        pdf,
    )))
}

pub async fn get_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf = owned_pdf(&state, id, &user).await?;
    if !pdf.is_ready() {
        return Err(ApiError::not_found(NOTES_NOT_READY));
    }
    Ok(Json(PdfResponse::from(pdf)))
}

pub async fn list_pdfs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let (skip, limit) = page.resolve(50);
    let (pdfs, total) = state.pdfs.list_ready(user.id, skip, limit).await?;

    Ok(Json(PdfListResponse {
        pdfs: pdfs.into_iter().map(PdfResponse::from).collect(),
        total,
    }))
}

/// Delete a PDF, its chat rows and the stored file
pub async fn delete_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf = owned_pdf(&state, id, &user).await?;
    if let Some(path) = state.pdfs.delete(pdf.id).await? {
        state.uploads.remove(&path).await;
    }
    info!("User {} deleted PDF {}", user.id, id);

    Ok(Json(PdfDeleteResponse {
        message: "PDF deleted successfully".to_string(),
        pdf_id: id,
    }))
}

/// Ask a question about a PDF's notes
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    WithRejection(Json(request), _): WithRejection<Json<ChatRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let question = request.question().map_err(ApiError::BadRequest)?;
    let pdf = owned_pdf(&state, id, &user).await?;
    let notes = pdf
        .notes()
        .ok_or_else(|| ApiError::bad_request(NOTES_NOT_READY))?;

    let answer = answer_question(&state, ChatTarget::Pdf, &pdf.file_name, &notes, question).await;
    let chat = state
        .chats
        .record_exchange(ChatTarget::Pdf, pdf.id, user.id, question, &answer)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ChatMessageResponse {
            id: chat.id,
            message: chat.message,
            response: Some(answer),
            is_user_message: true,
            created_at: chat.created_at,
        }),
    ))
}

pub async fn chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf = owned_pdf(&state, id, &user).await?;
    let (skip, limit) = page.resolve(100);
    let (messages, total) = state
        .chats
        .history(ChatTarget::Pdf, pdf.id, user.id, skip, limit)
        .await?;

    Ok(Json(ChatHistoryResponse {
        messages: messages.into_iter().map(ChatMessageResponse::from).collect(),
        total,
    }))
}

pub async fn chat_histories(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let (skip, limit) = page.resolve(50);
    let (summaries, total) = state
        .chats
        .summaries(ChatTarget::Pdf, user.id, skip, limit)
        .await?;

    Ok(Json(ChatHistoriesResponse {
        histories: summaries.into_iter().map(PdfChatHistoryItem::from).collect(),
        total,
    }))
}
