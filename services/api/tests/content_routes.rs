//! Video routes against a live PostgreSQL
//!
//! Run with `--ignored`. `TEST_DATABASE_URL` overrides the default database URL.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use api::models::video::NewVideo;
use api::repositories::VideoRepository;
use api::{AppState, NoteServices, create_router};
use async_trait::async_trait;
use auth::models::OtpPurpose;
use auth::repositories::memory::{MemoryBlacklist, RecordingEmailSender};
use auth::repositories::{PgOtpRepository, PgUserRepository};
use auth::{AuthService, AuthStores};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header, request},
};
use common::AppConfig;
use common::database::{init_pool, run_migrations};
use notes::{
    NoteGenerator, Notes, NotesResult, PdfExtractor, PdfText, SourceKind, TranscriptSource,
    VideoInfo,
};
use serde_json::{Value, json};
use serial_test::serial;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
struct Calls {
    fetches: AtomicUsize,
    generations: AtomicUsize,
    /// When set, the next fetch stores the video with notes for this user first
    racing_user: Mutex<Option<i64>>,
}

struct FixedTranscripts {
    calls: Arc<Calls>,
    pool: PgPool,
}

#[async_trait]
impl TranscriptSource for FixedTranscripts {
    async fn fetch(&self, video_id: &str) -> NotesResult<VideoInfo> {
        self.calls.fetches.fetch_add(1, Ordering::SeqCst);
        let racing = self.calls.racing_user.lock().unwrap().take();
        if let Some(user_id) = racing {
            let videos = VideoRepository::new(self.pool.clone());
            let video = videos
                .create(&NewVideo {
                    user_id,
                    video_id: video_id.to_string(),
                    video_url: format!("https://youtu.be/{}", video_id),
                    title: "Lifetimes explained".to_string(),
                    thumbnail_url: None,
                    duration: None,
                    transcript: None,
                })
                .await
                .unwrap();
            let notes = Notes {
                summary: "Stored by the first request.".to_string(),
                key_points: "• First writer wins".to_string(),
                bullet_notes: "• Unique per user and video".to_string(),
            };
            videos.save_notes(video.id, &notes).await.unwrap();
        }

        Ok(VideoInfo {
            video_id: video_id.to_string(),
            title: "Lifetimes explained".to_string(),
            thumbnail_url: format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id),
            duration: Some("8:02".to_string()),
            transcript: Some("a lifetime names a region of code".to_string()),
        })
    }
}

struct NoText;

#[async_trait]
impl PdfExtractor for NoText {
    async fn extract(&self, _path: &Path) -> Option<PdfText> {
        None
    }
}

struct FixedNotes(Arc<Calls>);

#[async_trait]
impl NoteGenerator for FixedNotes {
    async fn generate(&self, _kind: SourceKind, _title: &str, _text: &str) -> Option<Notes> {
        self.0.generations.fetch_add(1, Ordering::SeqCst);
        Some(Notes {
            summary: "Lifetimes describe how long references stay valid.".to_string(),
            key_points: "• Borrows cannot outlive owners".to_string(),
            bullet_notes: "• Elision covers most signatures".to_string(),
        })
    }

    async fn answer(&self, _question: &str, _context: &str) -> Option<String> {
        Some("Until its owner goes out of scope.".to_string())
    }
}

struct TestApp {
    router: Router,
    pool: PgPool,
    mailer: Arc<RecordingEmailSender>,
    calls: Arc<Calls>,
}

async fn app() -> TestApp {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "content-test-secret-content-test".to_string();
    if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
        config.database.url = url;
    }

    let pool = init_pool(&config.database).await.unwrap();
    run_migrations(&pool, concat!(env!("CARGO_MANIFEST_DIR"), "/migrations"))
        .await
        .unwrap();

    let mailer = Arc::new(RecordingEmailSender::new());
    let auth = AuthService::new(
        &config.auth,
        AuthStores {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            otps: Arc::new(PgOtpRepository::new(pool.clone())),
            blacklist: Arc::new(MemoryBlacklist::new()),
            email: mailer.clone(),
        },
    );

    let calls = Arc::new(Calls::default());
    let notes = NoteServices {
        transcripts: Arc::new(FixedTranscripts {
            calls: calls.clone(),
            pool: pool.clone(),
        }),
        pdf_extractor: Arc::new(NoText),
        generator: Arc::new(FixedNotes(calls.clone())),
    };

    TestApp {
        router: create_router(AppState::new(config, pool.clone(), auth, notes)),
        pool,
        mailer,
        calls,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn authed(builder: request::Builder, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn get_as(app: &TestApp, uri: &str, token: &str) -> (StatusCode, Value) {
    send(&app.router, authed(Request::get(uri), token, None)).await
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Register and verify a fresh account, returning its token and user id
async fn signed_up(app: &TestApp, name: &str) -> (String, i64) {
    let email = format!("{}-{}@routes.test", name, Uuid::new_v4().simple());
    let (status, _) = send(
        &app.router,
        post_json(
            "/api/auth/register",
            json!({"name": name, "email": email, "password": "secret1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let code = app.mailer.last_code(&email, OtpPurpose::Signup).unwrap();
    let (status, body) = send(
        &app.router,
        post_json(
            "/api/auth/verify-otp",
            json!({"email": email, "otp_code": code, "purpose": "signup"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = get_as(app, "/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    (token, me["id"].as_i64().unwrap())
}

fn youtube_id() -> String {
    Uuid::new_v4().simple().to_string()[..11].to_string()
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL"]
async fn test_stranded_video_resumes_generation() {
    let app = app().await;
    let (token, user_id) = signed_up(&app, "stranded").await;
    let yt = youtube_id();
    let url = format!("https://www.youtube.com/watch?v={}", yt);

    // A row left behind by a generation that never stored notes
    let stranded = VideoRepository::new(app.pool.clone())
        .create(&NewVideo {
            user_id,
            video_id: yt.clone(),
            video_url: url.clone(),
            title: "Lifetimes explained".to_string(),
            thumbnail_url: None,
            duration: None,
            transcript: Some("a lifetime names a region of code".to_string()),
        })
        .await
        .unwrap();

    let uri = format!("/api/video/{}", stranded.id);
    let (status, body) = get_as(&app, &uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "Video notes not generated yet. Please generate notes first."
    );

    let by_youtube = format!("/api/video/youtube/{}", yt);
    let (status, _) = get_as(&app, &by_youtube, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get_as(&app, "/api/video", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let generate = || {
        authed(
            Request::post("/api/video/generate"),
            &token,
            Some(json!({"video_url": url})),
        )
    };
    let (status, body) = send(&app.router, generate()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Video notes generated successfully");
    assert_eq!(body["video_id"], stranded.id);
    assert_eq!(
        body["summary"],
        "Lifetimes describe how long references stay valid."
    );
    // The stored row is reused, so the video is not fetched again
    assert_eq!(app.calls.fetches.load(Ordering::SeqCst), 0);
    assert_eq!(app.calls.generations.load(Ordering::SeqCst), 1);

    let (status, body) = send(&app.router, generate()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["message"],
        "Video notes already generated. Use GET endpoint to retrieve."
    );
    assert!(body["summary"].is_string());
    assert_eq!(app.calls.generations.load(Ordering::SeqCst), 1);

    let (status, body) = get_as(&app, &uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["video_id"], yt);
    let (status, _) = get_as(&app, &by_youtube, &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_as(&app, "/api/video", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL"]
async fn test_video_chat_and_delete() {
    let app = app().await;
    let (token, _) = signed_up(&app, "chatter").await;
    let (stranger, _) = signed_up(&app, "stranger").await;
    let url = format!("https://youtu.be/{}", youtube_id());

    let (status, body) = send(
        &app.router,
        authed(
            Request::post("/api/video/generate"),
            &token,
            Some(json!({"video_url": url})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.calls.fetches.load(Ordering::SeqCst), 1);
    let id = body["video_id"].as_i64().unwrap();

    let chat_uri = format!("/api/video/{}/chat", id);
    let (status, body) = send(
        &app.router,
        authed(
            Request::post(&chat_uri),
            &token,
            Some(json!({"message": "How long does a borrow last?"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_user_message"], true);
    assert_eq!(body["response"], "Until its owner goes out of scope.");

    let (status, body) = get_as(&app, &chat_uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["messages"][0]["message"], "How long does a borrow last?");
    assert_eq!(
        body["messages"][1]["response"],
        "Until its owner goes out of scope."
    );

    let (status, body) = get_as(&app, "/api/video/chat/histories", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["histories"][0]["video_id"], id);
    assert_eq!(body["histories"][0]["message_count"], 1);

    let video_uri = format!("/api/video/{}", id);
    let (status, body) = get_as(&app, &video_uri, &stranger).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Video not found");

    let delete = authed(Request::delete(&video_uri), &token, None);
    let (status, body) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Video deleted successfully");

    let (status, _) = get_as(&app, &chat_uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = get_as(&app, "/api/video/chat/histories", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL"]
async fn test_concurrent_generation_returns_stored_notes() {
    let app = app().await;
    let (token, user_id) = signed_up(&app, "racer").await;
    *app.calls.racing_user.lock().unwrap() = Some(user_id);

    let url = format!("https://www.youtube.com/watch?v={}", youtube_id());
    let (status, body) = send(
        &app.router,
        authed(
            Request::post("/api/video/generate"),
            &token,
            Some(json!({"video_url": url})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["message"],
        "Video notes already generated. Use GET endpoint to retrieve."
    );
    assert_eq!(body["summary"], "Stored by the first request.");
    assert_eq!(app.calls.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(app.calls.generations.load(Ordering::SeqCst), 0);

    let (status, body) = get_as(&app, "/api/video", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
}
