//! YouTube video ids, metadata and transcripts

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::error::{NotesError, NotesResult};

/// Caption languages tried in order
pub const TRANSCRIPT_LANGUAGES: &[&str] = &["en", "en-US", "en-GB", "en-CA", "en-AU"];

/// What note generation needs to know about a video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
    /// `MM:SS` or `HH:MM:SS`
    pub duration: Option<String>,
    /// Cleaned caption text, when captions exist
    pub transcript: Option<String>,
}

impl VideoInfo {
    /// Metadata used when the video page cannot be read
    pub fn fallback(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: fallback_title(video_id),
            thumbnail_url: thumbnail_url(video_id),
            duration: None,
            transcript: None,
        }
    }
}

/// Source of video metadata and captions
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> NotesResult<VideoInfo>;
}

/// Pull the 11 character video id out of a YouTube URL
pub fn extract_video_id(url: &str) -> Option<String> {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            Regex::new(
                r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
            )
            .expect("Failed to compile video id regex"),
            Regex::new(r"youtube\.com/watch\?.*v=([a-zA-Z0-9_-]{11})")
                .expect("Failed to compile video id regex"),
        ]
    });

    patterns
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
}

pub fn fallback_title(video_id: &str) -> String {
    format!("Video {}", video_id)
}

/// Seconds as `MM:SS`, or `HH:MM:SS` from one hour up. Zero means unknown.
pub fn format_duration(total_seconds: u64) -> Option<String> {
    if total_seconds == 0 {
        return None;
    }

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    Some(if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    })
}

/// Join caption snippets into plain text: markup removed, whitespace collapsed
pub fn clean_caption_text<'a>(snippets: impl IntoIterator<Item = &'a str>) -> Option<String> {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]+>").expect("Failed to compile tag regex"));

    let text = snippets
        .into_iter()
        .map(|s| tags.replace_all(s, " "))
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    (!text.is_empty()).then_some(text)
}

/// [`TranscriptSource`] backed by the public YouTube pages
pub struct YoutubeTranscriptSource {
    api: YouTubeTranscriptApi,
}

impl YoutubeTranscriptSource {
    pub fn new() -> NotesResult<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None).map_err(|e| {
            NotesError::VideoLookup(format!("Failed to setup YouTube API: {}", e))
        })?;
        Ok(Self { api })
    }

    async fn transcript(&self, video_id: &str) -> Option<String> {
        match self
            .api
            .fetch_transcript(video_id, TRANSCRIPT_LANGUAGES, false)
            .await
        {
            Ok(transcript) => {
                let text = clean_caption_text(transcript.snippets.iter().map(|s| s.text.as_str()));
                debug!(
                    "Transcript for {} has {} characters",
                    video_id,
                    text.as_ref().map_or(0, |t| t.chars().count())
                );
                text
            }
            Err(e) => {
                info!("No transcript available for {}: {}", video_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    async fn fetch(&self, video_id: &str) -> NotesResult<VideoInfo> {
        let mut info = match self.api.fetch_video_details(video_id).await {
            Ok(details) => VideoInfo {
                video_id: video_id.to_string(),
                title: if details.title.trim().is_empty() {
                    fallback_title(video_id)
                } else {
                    details.title
                },
                thumbnail_url: thumbnail_url(video_id),
                duration: format_duration(u64::from(details.length_seconds)),
                transcript: None,
            },
            Err(e) => {
                warn!("Could not fetch details for video {}: {}", video_id, e);
                VideoInfo::fallback(video_id)
            }
        };

        info.transcript = self.transcript(video_id).await;
        Ok(info)
    }
}
