//! Note generation and document chat on top of Gemini

use async_trait::async_trait;
use common::settings::AiConfig;
use tracing::{info, warn};

use crate::error::NotesResult;
use crate::gemini::GeminiClient;
use crate::parser::{Notes, ParseOutcome, parse_notes};
use crate::prompt::{SourceKind, chat_prompt, notes_prompt};

/// Turns source text into notes and answers questions about them
#[async_trait]
pub trait NoteGenerator: Send + Sync {
    /// Notes for `text`, or `None` when no model produced usable notes
    async fn generate(&self, kind: SourceKind, title: &str, text: &str) -> Option<Notes>;

    /// Answer `question` given a notes context block
    async fn answer(&self, question: &str, context: &str) -> Option<String>;
}

/// Notes stored for a video whose transcript could not be turned into notes
pub fn placeholder_video_notes(title: &str) -> Notes {
    Notes {
        summary: format!(
            "This video titled '{}' contains valuable content. Watch the video to get detailed insights and information.",
            title
        ),
        key_points: "• Watch the video for key insights\n• Take notes while watching\n• Review important sections"
            .to_string(),
        bullet_notes: "• Video content analysis\n• Important concepts\n• Practical applications"
            .to_string(),
    }
}

/// [`NoteGenerator`] trying each configured Gemini model in turn
#[derive(Clone)]
pub struct GeminiNoteGenerator {
    client: Option<GeminiClient>,
}

impl GeminiNoteGenerator {
    pub fn from_settings(settings: &AiConfig) -> NotesResult<Self> {
        let client = GeminiClient::from_settings(settings)?;
        if client.is_none() {
            warn!("No AI API key configured; note generation is disabled");
        }
        Ok(Self { client })
    }
}

#[async_trait]
impl NoteGenerator for GeminiNoteGenerator {
    async fn generate(&self, kind: SourceKind, title: &str, text: &str) -> Option<Notes> {
        let client = self.client.as_ref()?;
        if text.trim().is_empty() {
            return None;
        }

        let prompt = notes_prompt(kind, title, text);
        for model in client.models() {
            match client.generate(model, &prompt).await {
                Ok(response) => match parse_notes(&response) {
                    ParseOutcome::Parsed(notes) => {
                        info!("Generated notes for '{}' with {}", title, model);
                        return Some(notes);
                    }
                    outcome => warn!("{} response for '{}' rejected: {:?}", model, title, outcome),
                },
                Err(e) => warn!("Note generation with {} failed: {}", model, e),
            }
        }

        None
    }

    async fn answer(&self, question: &str, context: &str) -> Option<String> {
        let client = self.client.as_ref()?;

        let prompt = chat_prompt(question, context);
        for model in client.models() {
            match client.generate(model, &prompt).await {
                Ok(response) => return Some(response.trim().to_string()),
                Err(e) => warn!("Chat answer with {} failed: {}", model, e),
            }
        }

        None
    }
}
