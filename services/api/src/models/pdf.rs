//! Uploaded PDF records and payloads

use chrono::{DateTime, Utc};
use notes::Notes;
use serde::Serialize;

/// Stored PDF row
#[derive(Debug, Clone)]
pub struct Pdf {
    pub id: i64,
    pub user_id: i64,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub page_count: Option<i32>,
    pub extracted_text: Option<String>,
    pub summary: Option<String>,
    pub key_points: Option<String>,
    pub bullet_notes: Option<String>,
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pdf {
    /// Stored notes, when all three sections are present
    pub fn notes(&self) -> Option<Notes> {
        Some(Notes {
            summary: self.summary.clone()?,
            key_points: self.key_points.clone()?,
            bullet_notes: self.bullet_notes.clone()?,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.summary.is_some() && self.key_points.is_some() && self.bullet_notes.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewPdf {
    pub user_id: i64,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub page_count: Option<i32>,
    pub extracted_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfUploadResponse {
    pub message: String,
    pub pdf_id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub page_count: Option<i32>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfGenerateResponse {
    pub message: String,
    pub pdf_id: i64,
    pub file_name: String,
    pub summary: Option<String>,
    pub key_points: Option<String>,
    pub bullet_notes: Option<String>,
    pub status: String,
}

impl PdfGenerateResponse {
    pub fn completed(message: impl Into<String>, pdf: Pdf) -> Self {
        Self {
            message: message.into(),
            pdf_id: pdf.id,
            file_name: pdf.file_name,
            summary: pdf.summary,
            key_points: pdf.key_points,
            bullet_notes: pdf.bullet_notes,
            status: "completed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfResponse {
    pub id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub page_count: Option<i32>,
    pub summary: Option<String>,
    pub key_points: Option<String>,
    pub bullet_notes: Option<String>,
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Pdf> for PdfResponse {
    fn from(pdf: Pdf) -> Self {
        Self {
            id: pdf.id,
            file_name: pdf.file_name,
            file_size: pdf.file_size,
            page_count: pdf.page_count,
            summary: pdf.summary,
            key_points: pdf.key_points,
            bullet_notes: pdf.bullet_notes,
            is_saved: pdf.is_saved,
            created_at: pdf.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfListResponse {
    pub pdfs: Vec<PdfResponse>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfDeleteResponse {
    pub message: String,
    pub pdf_id: i64,
}
