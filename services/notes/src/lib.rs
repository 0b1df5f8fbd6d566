//! Source text gathering and AI note generation for TubeMind

pub mod error;
pub mod gemini;
pub mod generator;
pub mod parser;
pub mod pdf;
pub mod prompt;
pub mod youtube;

pub use error::{NotesError, NotesResult};
pub use generator::{GeminiNoteGenerator, NoteGenerator, placeholder_video_notes};
pub use parser::{Notes, ParseOutcome, parse_notes};
pub use pdf::{LopdfExtractor, PdfExtractor, PdfText};
pub use prompt::{SourceKind, chat_context};
pub use youtube::{TranscriptSource, VideoInfo, YoutubeTranscriptSource, extract_video_id};
