//! Repositories against a live PostgreSQL
//!
//! Run with `--ignored`. `TEST_DATABASE_URL` overrides the default database URL.

use api::models::chat::ChatTarget;
use api::models::pdf::NewPdf;
use api::models::video::NewVideo;
use api::repositories::{AdminRepository, ChatRepository, PdfRepository, VideoRepository};
use auth::models::{NewOtp, NewUser, OtpPurpose};
use auth::repositories::{OtpRepository, PgOtpRepository, PgUserRepository, UserRepository};
use chrono::{Duration, Utc};
use common::database::{init_pool, run_migrations};
use common::error::DatabaseError;
use common::settings::DatabaseConfig;
use notes::Notes;
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let mut config = DatabaseConfig::default();
    if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
        config.url = url;
    }
    let pool = init_pool(&config).await.unwrap();
    run_migrations(&pool, concat!(env!("CARGO_MANIFEST_DIR"), "/migrations"))
        .await
        .unwrap();
    pool
}

fn suffix() -> String {
    Uuid::new_v4().simple().to_string()
}

async fn create_user(pool: &PgPool, name: &str) -> i64 {
    PgUserRepository::new(pool.clone())
        .create(&NewUser {
            name: name.to_string(),
            email: format!("{}-{}@store.test", name.to_lowercase(), suffix()),
            password_hash: "$argon2id$unused".to_string(),
            is_verified: true,
            is_admin: false,
        })
        .await
        .unwrap()
        .id
}

fn new_video(user_id: i64) -> NewVideo {
    let youtube_id = suffix()[..11].to_string();
    NewVideo {
        user_id,
        video_url: format!("https://www.youtube.com/watch?v={}", youtube_id),
        video_id: youtube_id,
        title: "Ownership in Rust".to_string(),
        thumbnail_url: None,
        duration: Some("12:34".to_string()),
        transcript: Some("values have one owner".to_string()),
    }
}

fn notes() -> Notes {
    Notes {
        summary: "Ownership and borrowing keep memory safe without a collector.".to_string(),
        key_points: "• One owner per value\n• Borrows are scoped".to_string(),
        bullet_notes: "• Moves transfer ownership\n• Drop runs at scope end".to_string(),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL"]
async fn test_video_lists_only_ready_rows_of_owner() {
    let pool = pool().await;
    let videos = VideoRepository::new(pool.clone());
    let owner = create_user(&pool, "Owner").await;
    let other = create_user(&pool, "Other").await;

    let video = videos.create(&new_video(owner)).await.unwrap();
    let (listed, total) = videos.list_ready(owner, 0, 20).await.unwrap();
    assert!(listed.is_empty());
    assert_eq!(total, 0);

    videos.save_notes(video.id, &notes()).await.unwrap();
    let (listed, total) = videos.list_ready(owner, 0, 20).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(listed[0].id, video.id);
    assert!(listed[0].notes().is_some());

    assert!(videos.find_for_user(video.id, other).await.unwrap().is_none());
    assert!(videos.mark_saved(video.id, other).await.unwrap().is_none());
    assert!(!videos.delete(video.id, other).await.unwrap());
    assert_eq!(videos.list_ready(other, 0, 20).await.unwrap().1, 0);

    let saved = videos.mark_saved(video.id, owner).await.unwrap().unwrap();
    assert!(saved.is_saved);
    assert!(videos.delete(video.id, owner).await.unwrap());
    assert!(videos.find_for_user(video.id, owner).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL"]
async fn test_same_video_twice_is_duplicate() {
    let pool = pool().await;
    let videos = VideoRepository::new(pool.clone());
    let owner = create_user(&pool, "Owner").await;

    let video = new_video(owner);
    videos.create(&video).await.unwrap();
    let err = videos.create(&video).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Duplicate(_)));

    // Another user may store the same YouTube video
    let other = create_user(&pool, "Other").await;
    let theirs = NewVideo {
        user_id: other,
        ..video
    };
    assert!(videos.create(&theirs).await.is_ok());
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL"]
async fn test_chat_exchange_history_and_cascade() {
    let pool = pool().await;
    let pdfs = PdfRepository::new(pool.clone());
    let chats = ChatRepository::new(pool.clone());
    let owner = create_user(&pool, "Owner").await;

    let pdf = pdfs
        .create(&NewPdf {
            user_id: owner,
            file_name: "rust.pdf".to_string(),
            file_path: format!("/tmp/{}_rust.pdf", suffix()),
            file_size: 2048,
            page_count: Some(3),
            extracted_text: Some("ownership".to_string()),
        })
        .await
        .unwrap();
    assert!(!pdf.is_ready());

    // Documents without notes have no chat history entry
    let (_, total) = chats.summaries(ChatTarget::Pdf, owner, 0, 50).await.unwrap();
    assert_eq!(total, 0);
    pdfs.save_notes(pdf.id, &notes()).await.unwrap();

    let asked = chats
        .record_exchange(ChatTarget::Pdf, pdf.id, owner, "What is a move?", "A transfer.")
        .await
        .unwrap();
    assert!(asked.is_user_message);
    assert_eq!(asked.message, "What is a move?");

    let (messages, total) = chats
        .history(ChatTarget::Pdf, pdf.id, owner, 0, 100)
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert!(messages[0].is_user_message);
    assert_eq!(messages[0].message, "What is a move?");
    assert!(!messages[1].is_user_message);
    assert_eq!(messages[1].message, "");
    assert_eq!(messages[1].response.as_deref(), Some("A transfer."));

    let (summaries, total) = chats.summaries(ChatTarget::Pdf, owner, 0, 50).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(summaries[0].document_id, pdf.id);
    assert_eq!(summaries[0].message_count, 1);
    assert_eq!(
        summaries[0].last_user_message.as_deref(),
        Some("What is a move?")
    );

    let path = pdfs.delete(pdf.id).await.unwrap();
    assert_eq!(path.as_deref(), Some(pdf.file_path.as_str()));
    let (_, total) = chats
        .history(ChatTarget::Pdf, pdf.id, owner, 0, 100)
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert!(pdfs.delete(pdf.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL"]
async fn test_dashboard_counts_new_content() {
    let pool = pool().await;
    let admin = AdminRepository::new(pool.clone());
    let videos = VideoRepository::new(pool.clone());
    let chats = ChatRepository::new(pool.clone());

    let before = admin.dashboard_stats().await.unwrap();

    let owner = create_user(&pool, "Counted").await;
    let bare = videos.create(&new_video(owner)).await.unwrap();
    let ready = videos.create(&new_video(owner)).await.unwrap();
    videos.save_notes(ready.id, &notes()).await.unwrap();
    chats
        .record_exchange(ChatTarget::Video, ready.id, owner, "Why?", "Because.")
        .await
        .unwrap();

    let after = admin.dashboard_stats().await.unwrap();
    assert_eq!(after.users.total, before.users.total + 1);
    assert_eq!(after.users.new_today, before.users.new_today + 1);
    assert_eq!(after.users.verified, before.users.verified + 1);
    assert_eq!(after.videos.total, before.videos.total + 2);
    assert_eq!(after.videos.with_notes, before.videos.with_notes + 1);
    assert_eq!(after.videos.new_last_7_days, before.videos.new_last_7_days + 2);
    assert_eq!(after.chats.total, before.chats.total + 2);
    assert_eq!(after.pdfs.total, before.pdfs.total);

    let (users, total) = admin
        .list_users(Some("%counted-%"), None, Some(true), 0, 50)
        .await
        .unwrap();
    assert!(total >= 1);
    let listed = users.iter().find(|u| u.id == owner).unwrap();
    assert_eq!(listed.video_count, 2);
    assert_eq!(listed.chat_count, 2);

    let (listed_videos, total) = admin.list_videos(None, Some(owner), 0, 50).await.unwrap();
    assert_eq!(total, 2);
    let bare_row = listed_videos.iter().find(|v| v.id == bare.id).unwrap();
    assert!(!bare_row.has_notes);
    assert_eq!(bare_row.user_name, "Counted");

    assert!(admin.delete_video(bare.id).await.unwrap());
    assert!(!admin.delete_video(bare.id).await.unwrap());

    assert_eq!(admin.toggle_active(owner).await.unwrap(), Some(false));
    assert_eq!(admin.toggle_active(owner).await.unwrap(), Some(true));
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL"]
async fn test_new_otp_retires_older_codes() {
    let pool = pool().await;
    let otps = PgOtpRepository::new(pool);
    let email = format!("otp-{}@store.test", suffix());
    let otp = |code: &str| NewOtp {
        email: email.clone(),
        code: code.to_string(),
        purpose: OtpPurpose::ForgotPassword,
        expires_at: Utc::now() + Duration::minutes(60),
    };

    let first = otps.insert(&otp("111111")).await.unwrap();
    let signup = otps
        .insert(&NewOtp {
            purpose: OtpPurpose::Signup,
            ..otp("333333")
        })
        .await
        .unwrap();
    let second = otps.insert(&otp("222222")).await.unwrap();

    let latest = otps
        .latest_unused(&email, OtpPurpose::ForgotPassword)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, second.id);
    assert!(!otps.consume(first.id).await.unwrap());

    assert!(otps.consume(second.id).await.unwrap());
    assert!(
        otps.latest_unused(&email, OtpPurpose::ForgotPassword)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        otps.latest_is_used(&email, OtpPurpose::ForgotPassword)
            .await
            .unwrap()
    );

    // Other purposes keep their own live code
    let live = otps.latest_unused(&email, OtpPurpose::Signup).await.unwrap();
    assert_eq!(live.map(|o| o.id), Some(signup.id));
}
