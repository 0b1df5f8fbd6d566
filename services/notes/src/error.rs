//! Errors raised while gathering source text and generating notes

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotesError {
    /// Video metadata could not be fetched at all
    #[error("Video lookup failed: {0}")]
    VideoLookup(String),

    #[error("PDF extraction failed: {0}")]
    PdfExtraction(String),

    /// The model API answered with an error or unusable payload
    #[error("Generation request failed: {0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NotesResult<T> = Result<T, NotesError>;
