//! Repositories for database operations
//!
//! Every query a user can trigger is scoped by `user_id`; rows owned by
//! someone else are reported as missing.

pub mod admin;
pub mod chat;
pub mod pdf;
pub mod video;

pub use admin::AdminRepository;
pub use chat::ChatRepository;
pub use pdf::PdfRepository;
pub use video::VideoRepository;

/// SQL condition selecting documents with all three note sections
pub(crate) const READY: &str =
    "summary IS NOT NULL AND key_points IS NOT NULL AND bullet_notes IS NOT NULL";
