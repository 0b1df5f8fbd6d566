//! Per-document chat transcripts
//!
//! Videos and PDFs each keep an append-only transcript. Every exchange is
//! stored as two rows: the user's question and the assistant's answer.

use chrono::{DateTime, Utc};
use notes::SourceKind;
use serde::{Deserialize, Serialize};

pub const MAX_MESSAGE_CHARS: usize = 2000;

pub const CHAT_FALLBACK_RESPONSE: &str =
    "I apologize, but I couldn't generate a response. Please try again.";

/// Document a transcript belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTarget {
    Video,
    Pdf,
}

impl ChatTarget {
    /// Table holding the documents
    pub(crate) fn document_table(&self) -> &'static str {
        match self {
            ChatTarget::Video => "videos",
            ChatTarget::Pdf => "pdfs",
        }
    }

    /// Column shown as the document's title
    pub(crate) fn title_column(&self) -> &'static str {
        match self {
            ChatTarget::Video => "title",
            ChatTarget::Pdf => "file_name",
        }
    }

    /// Table holding the chat rows
    pub(crate) fn chat_table(&self) -> &'static str {
        match self {
            ChatTarget::Video => "chats",
            ChatTarget::Pdf => "pdf_chats",
        }
    }

    /// Chat row column referencing the document
    pub(crate) fn document_column(&self) -> &'static str {
        match self {
            ChatTarget::Video => "video_id",
            ChatTarget::Pdf => "pdf_id",
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            ChatTarget::Video => SourceKind::Video,
            ChatTarget::Pdf => SourceKind::Pdf,
        }
    }

    /// Placeholder shown for documents nobody has chatted about yet
    pub fn empty_history_message(&self) -> &'static str {
        match self {
            ChatTarget::Video => "Click to start chatting about this video",
            ChatTarget::Pdf => "Click to start chatting about this PDF",
        }
    }
}

/// Stored chat row
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub response: Option<String>,
    pub is_user_message: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    /// Trimmed question, or a message describing why it was rejected
    pub fn question(&self) -> Result<&str, String> {
        let question = self.message.trim();
        if question.is_empty() || question.chars().count() > MAX_MESSAGE_CHARS {
            return Err(format!(
                "Message must be between 1 and {} characters",
                MAX_MESSAGE_CHARS
            ));
        }
        Ok(question)
    }
}

/// One transcript entry as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageResponse {
    pub id: i64,
    pub message: String,
    pub response: Option<String>,
    pub is_user_message: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for ChatMessageResponse {
    fn from(chat: ChatMessage) -> Self {
        Self {
            id: chat.id,
            message: if chat.is_user_message {
                chat.message
            } else {
                String::new()
            },
            response: if chat.is_user_message {
                None
            } else {
                chat.response
            },
            is_user_message: chat.is_user_message,
            created_at: chat.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessageResponse>,
    pub total: i64,
}

/// Per-document chat activity, shared by both document kinds
#[derive(Debug, Clone)]
pub struct ChatSummary {
    pub document_id: i64,
    pub title: String,
    pub document_created_at: DateTime<Utc>,
    pub last_user_message: Option<String>,
    pub last_user_at: Option<DateTime<Utc>>,
    pub last_response: Option<String>,
    pub last_response_at: Option<DateTime<Utc>>,
    /// Questions asked, assistant rows excluded
    pub message_count: i64,
}

impl ChatSummary {
    /// Last thing said about the document and when, falling back to the
    /// placeholder and the document's creation time
    pub fn last_message(&self, target: ChatTarget) -> (String, DateTime<Utc>) {
        if let Some(message) = self.last_user_message.as_ref().filter(|m| !m.is_empty()) {
            return (
                message.clone(),
                self.last_user_at.unwrap_or(self.document_created_at),
            );
        }
        if let Some(response) = self.last_response.as_ref().filter(|r| !r.is_empty()) {
            return (
                response.clone(),
                self.last_response_at.unwrap_or(self.document_created_at),
            );
        }
        (
            target.empty_history_message().to_string(),
            self.last_user_at
                .or(self.last_response_at)
                .unwrap_or(self.document_created_at),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoChatHistoryItem {
    pub video_id: i64,
    pub video_title: String,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub message_count: i64,
}

impl From<ChatSummary> for VideoChatHistoryItem {
    fn from(summary: ChatSummary) -> Self {
        let (last_message, last_message_time) = summary.last_message(ChatTarget::Video);
        Self {
            video_id: summary.document_id,
            video_title: summary.title,
            last_message,
            last_message_time,
            message_count: summary.message_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfChatHistoryItem {
    pub pdf_id: i64,
    pub pdf_name: String,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub message_count: i64,
}

impl From<ChatSummary> for PdfChatHistoryItem {
    fn from(summary: ChatSummary) -> Self {
        let (last_message, last_message_time) = summary.last_message(ChatTarget::Pdf);
        Self {
            pdf_id: summary.document_id,
            pdf_name: summary.title,
            last_message,
            last_message_time,
            message_count: summary.message_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatHistoriesResponse<T> {
    pub histories: Vec<T>,
    pub total: i64,
}
