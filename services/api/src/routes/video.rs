//! `/api/video` routes

use auth::models::{AuthUser, MessageResponse};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use common::error::DatabaseError;
use notes::{SourceKind, extract_video_id, placeholder_video_notes};
use tracing::{info, warn};

use super::answer_question;
use crate::{
    error::{ApiError, ApiResult},
    middleware::require_auth,
    models::{
        Pagination,
        chat::{
            ChatHistoriesResponse, ChatHistoryResponse, ChatMessageResponse, ChatRequest,
            ChatTarget, VideoChatHistoryItem,
        },
        video::{
            GenerateVideoRequest, NewVideo, Video, VideoGenerateResponse, VideoListResponse,
            VideoResponse,
        },
    },
    state::AppState,
};

const VIDEO_NOT_FOUND: &str = "Video not found";
const NOTES_NOT_READY: &str = "Video notes not generated yet. Please generate notes first.";
const ALREADY_GENERATED: &str = "Video notes already generated. Use GET endpoint to retrieve.";

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_notes))
        .route("/", get(list_videos))
        .route("/chat/histories", get(chat_histories))
        .route("/youtube/:youtube_video_id", get(get_by_youtube_id))
        .route("/:id", get(get_video).delete(delete_video))
        .route("/:id/save", post(save_video))
        .route("/:id/chat", post(send_message).get(chat_history))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

async fn owned_video(state: &AppState, id: i64, user: &AuthUser) -> ApiResult<Video> {
    state
        .videos
        .find_for_user(id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found(VIDEO_NOT_FOUND))
}

/// Fetch a video's details and insert its row.
///
/// `None` when a concurrent request inserted the same video first.
async fn store_video(
    state: &AppState,
    user: &AuthUser,
    youtube_id: &str,
    video_url: &str,
) -> ApiResult<Option<Video>> {
    let info = state.notes.transcripts.fetch(youtube_id).await.map_err(|e| {
        warn!("Could not fetch video {}: {}", youtube_id, e);
        ApiError::bad_request("Could not fetch video information. Please check the video URL.")
    })?;

    let new_video = NewVideo {
        user_id: user.id,
        video_id: youtube_id.to_string(),
        video_url: video_url.trim().to_string(),
        title: info.title,
        thumbnail_url: Some(info.thumbnail_url),
        duration: info.duration,
        transcript: info.transcript,
    };

    match state.videos.create(&new_video).await {
        Ok(video) => Ok(Some(video)),
        Err(DatabaseError::Duplicate(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fetch a video's details and transcript, then store it with generated notes
pub async fn generate_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(request), _): WithRejection<Json<GenerateVideoRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let youtube_id = extract_video_id(&request.video_url).ok_or_else(|| {
        ApiError::bad_request("Invalid YouTube URL. Please provide a valid YouTube video URL.")
    })?;

    let video = match state.videos.find_by_youtube_id(user.id, &youtube_id).await? {
        Some(existing) if existing.notes().is_some() => {
            return Ok((
                StatusCode::CREATED,
                Json(VideoGenerateResponse::completed(ALREADY_GENERATED, existing)),
            ));
        }
        // An earlier attempt stored the row but never its notes
        Some(existing) => {
            info!("Resuming note generation for video {}", existing.id);
            existing
        }
        None => match store_video(&state, &user, &youtube_id, &request.video_url).await? {
            Some(video) => video,
            None => {
                let existing = state
                    .videos
                    .find_by_youtube_id(user.id, &youtube_id)
                    .await?
                    .ok_or_else(|| ApiError::internal("Video vanished after duplicate insert"))?;
                if existing.notes().is_some() {
                    return Ok((
                        StatusCode::CREATED,
                        Json(VideoGenerateResponse::completed(ALREADY_GENERATED, existing)),
                    ));
                }
                existing
            }
        },
    };

    let generated = match video.transcript.as_deref() {
        Some(transcript) => {
            state
                .notes
                .generator
                .generate(SourceKind::Video, &video.title, transcript)
                .await
        }
        None => None,
    };
    let notes = generated.unwrap_or_else(|| {
        info!("Using placeholder notes for video {}", youtube_id);
        placeholder_video_notes(&video.title)
    });

    let video = state.videos.save_notes(video.id, &notes).await?;
    info!("Stored notes for video {} (user {})", video.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(VideoGenerateResponse::completed(
            "Video notes generated successfully",
            video,
        )),
    ))
}

pub async fn get_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let video = owned_video(&state, id, &user).await?;
    if video.notes().is_none() {
        return Err(ApiError::not_found(NOTES_NOT_READY));
    }
    Ok(Json(VideoResponse::from(video)))
}

pub async fn get_by_youtube_id(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(youtube_video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video = state
        .videos
        .find_by_youtube_id(user.id, &youtube_video_id)
        .await?
        .filter(|video| video.notes().is_some())
        .ok_or_else(|| ApiError::not_found("Video not found. Please generate notes first."))?;
    Ok(Json(VideoResponse::from(video)))
}

pub async fn list_videos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let (skip, limit) = page.resolve(20);
    let (videos, total) = state.videos.list_ready(user.id, skip, limit).await?;

    Ok(Json(VideoListResponse {
        videos: videos.into_iter().map(VideoResponse::from).collect(),
        total,
    }))
}

pub async fn save_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let video = state
        .videos
        .mark_saved(id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found(VIDEO_NOT_FOUND))?;
    Ok(Json(VideoResponse::from(video)))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.videos.delete(id, user.id).await? {
        return Err(ApiError::not_found(VIDEO_NOT_FOUND));
    }
    info!("User {} deleted video {}", user.id, id);
    Ok(Json(MessageResponse::new("Video deleted successfully")))
}

/// Ask a question about a video's notes
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    WithRejection(Json(request), _): WithRejection<Json<ChatRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let question = request.question().map_err(ApiError::BadRequest)?;
    let video = owned_video(&state, id, &user).await?;
    let notes = video
        .notes()
        .ok_or_else(|| ApiError::bad_request(NOTES_NOT_READY))?;

    let answer = answer_question(&state, ChatTarget::Video, &video.title, &notes, question).await;
    let chat = state
        .chats
        .record_exchange(ChatTarget::Video, video.id, user.id, question, &answer)
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
    let video = owned_video(&state, id, &user).await?;
    let (skip, limit) = page.resolve(100);
    let (messages, total) = state
        .chats
        .history(ChatTarget::Video, video.id, user.id, skip, limit)
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
        .summaries(ChatTarget::Video, user.id, skip, limit)
        .await?;

    Ok(Json(ChatHistoriesResponse {
        histories: summaries
            .into_iter()
            .map(VideoChatHistoryItem::from)
            .collect(),
        total,
    }))
}
