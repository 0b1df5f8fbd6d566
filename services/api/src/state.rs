//! Application state shared across handlers

use auth::AuthService;
use common::AppConfig;
use notes::{NoteGenerator, PdfExtractor, TranscriptSource};
use sqlx::PgPool;
use std::sync::Arc;

use crate::repositories::{AdminRepository, ChatRepository, PdfRepository, VideoRepository};
use crate::storage::UploadStore;

/// External collaborators of the note pipeline
#[derive(Clone)]
pub struct NoteServices {
    pub transcripts: Arc<dyn TranscriptSource>,
    pub pdf_extractor: Arc<dyn PdfExtractor>,
    pub generator: Arc<dyn NoteGenerator>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub videos: VideoRepository,
    pub pdfs: PdfRepository,
    pub chats: ChatRepository,
    pub admin: AdminRepository,
    pub uploads: UploadStore,
    pub notes: NoteServices,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool, auth: AuthService, notes: NoteServices) -> Self {
        let uploads = UploadStore::new(&config.uploads.dir);
        Self {
            config: Arc::new(config),
            auth,
            videos: VideoRepository::new(pool.clone()),
            pdfs: PdfRepository::new(pool.clone()),
            chats: ChatRepository::new(pool.clone()),
            admin: AdminRepository::new(pool),
            uploads,
            notes,
        }
    }
}
