//! Parser for the tagged note format returned by the model
//!
//! The expected response has `SUMMARY:`, `KEY POINTS:` and `BULLET NOTES:`
//! headers, the two list sections holding `•` bullets. Models drift from the
//! format, so the parser falls back to splitting on blank lines and then
//! checks that every section carries real content.

use serde::{Deserialize, Serialize};

pub const MIN_SUMMARY_CHARS: usize = 40;
pub const MIN_LIST_CHARS: usize = 10;

const BULLET: char = '•';

/// Filler text that must never be stored as notes
pub const PLACEHOLDER_TEXTS: &[&str] = &[
    "• Key insights from the video\n• Important concepts discussed\n• Practical applications",
    "• Detailed notes from the video content\n• Important points to remember\n• Additional information",
    "• Watch the video for key insights\n• Take notes while watching\n• Review important sections",
    "• Video content analysis\n• Important concepts\n• Practical applications",
];

/// Generated notes for a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notes {
    pub summary: String,
    pub key_points: String,
    pub bullet_notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(Notes),
    /// Sections were recognised but at least one is missing, too short or filler
    Incomplete,
    /// Nothing resembling the format
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    KeyPoints,
    BulletNotes,
}

impl Section {
    const ALL: [(Section, &'static str); 3] = [
        (Section::Summary, "SUMMARY:"),
        (Section::KeyPoints, "KEY POINTS:"),
        (Section::BulletNotes, "BULLET NOTES:"),
    ];

    fn is_list(&self) -> bool {
        !matches!(self, Section::Summary)
    }
}

/// Match a header line, returning the section and the text after the header
fn header(line: &str) -> Option<(Section, &str)> {
    let line = line.trim_start_matches(['*', '#', ' ']);
    Section::ALL.iter().find_map(|(section, tag)| {
        let prefix = line.get(..tag.len())?;
        prefix
            .eq_ignore_ascii_case(tag)
            .then(|| (*section, line[tag.len()..].trim_matches(['*', ' '])))
    })
}

#[derive(Default)]
struct Collected {
    summary: Vec<String>,
    key_points: Vec<String>,
    bullet_notes: Vec<String>,
    saw_header: bool,
}

impl Collected {
    fn lines(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Summary => &mut self.summary,
            Section::KeyPoints => &mut self.key_points,
            Section::BulletNotes => &mut self.bullet_notes,
        }
    }

    fn push(&mut self, section: Section, line: &str) {
        if line.is_empty() {
            return;
        }
        if section.is_list() && !line.starts_with(BULLET) {
            return;
        }
        self.lines(section).push(line.to_string());
    }
}

fn walk_lines(text: &str) -> Collected {
    let mut collected = Collected::default();
    let mut current: Option<Section> = None;

    for line in text.lines().map(str::trim) {
        if let Some((section, rest)) = header(line) {
            collected.saw_header = true;
            current = Some(section);
            collected.push(section, rest);
            continue;
        }
        if let Some(section) = current {
            collected.push(section, line);
        }
    }

    collected
}

fn strip_tag(part: &str, tag: &str) -> String {
    let part = part.trim();
    match part.get(..tag.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(tag) => part[tag.len()..].trim().to_string(),
        _ => part.to_string(),
    }
}

/// First three blank-line separated paragraphs as the three sections
fn split_paragraphs(text: &str) -> Option<Notes> {
    let parts: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }

    Some(Notes {
        summary: strip_tag(parts[0], "SUMMARY:"),
        key_points: strip_tag(parts[1], "KEY POINTS:"),
        bullet_notes: strip_tag(parts[2], "BULLET NOTES:"),
    })
}

fn is_placeholder(text: &str) -> bool {
    PLACEHOLDER_TEXTS.iter().any(|p| p.trim() == text.trim())
}

/// Whether notes are substantial enough to store
pub fn is_substantial(notes: &Notes) -> bool {
    notes.summary.chars().count() >= MIN_SUMMARY_CHARS
        && notes.key_points.chars().count() >= MIN_LIST_CHARS
        && notes.bullet_notes.chars().count() >= MIN_LIST_CHARS
        && !is_placeholder(&notes.key_points)
        && !is_placeholder(&notes.bullet_notes)
}

/// Parse a model response into notes
pub fn parse_notes(text: &str) -> ParseOutcome {
    let collected = walk_lines(text);
    let walked = Notes {
        summary: collected.summary.join("\n").trim().to_string(),
        key_points: collected.key_points.join("\n").trim().to_string(),
        bullet_notes: collected.bullet_notes.join("\n").trim().to_string(),
    };

    let complete = !walked.summary.is_empty()
        && !walked.key_points.is_empty()
        && !walked.bullet_notes.is_empty();

    let notes = if complete {
        walked
    } else {
        match split_paragraphs(text) {
            Some(notes) => notes,
            None if collected.saw_header => return ParseOutcome::Incomplete,
            None => return ParseOutcome::Malformed,
        }
    };

    if is_substantial(&notes) {
        ParseOutcome::Parsed(notes)
    } else if collected.saw_header {
        ParseOutcome::Incomplete
    } else {
        ParseOutcome::Malformed
    }
}
