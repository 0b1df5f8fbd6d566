//! Prompt construction for note generation and chat

use std::fmt;

/// Longest input passed through untouched
const FULL_LIMIT: usize = 30_000;
/// Above this, a middle sample is kept as well
const SAMPLED_LIMIT: usize = 50_000;
const EDGE_CHARS: usize = 20_000;
const MIDDLE_HALF_CHARS: usize = 5_000;

const MIDDLE_MARKER: &str = "\n\n[... middle content ...]\n\n";
const MORE_MARKER: &str = "\n\n[... more content ...]\n\n";

/// What the source text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Video,
    Pdf,
}

impl SourceKind {
    /// Label used in chat context headers
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Video => "Video",
            SourceKind::Pdf => "PDF",
        }
    }

    fn material(&self) -> &'static str {
        match self {
            SourceKind::Video => "a YouTube video transcript",
            SourceKind::Pdf => "the text of a PDF document",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map_or(text.len(), |(index, _)| index)
    };
    &text[byte_at(start)..byte_at(end)]
}

/// Shorten long input while keeping its opening, middle and end.
///
/// Lengths are counted in characters.
pub fn truncate_for_prompt(text: &str) -> String {
    let length = text.chars().count();

    if length > SAMPLED_LIMIT {
        let middle = length / 2;
        [
            char_slice(text, 0, EDGE_CHARS),
            MIDDLE_MARKER,
            char_slice(text, middle - MIDDLE_HALF_CHARS, middle + MIDDLE_HALF_CHARS),
            MORE_MARKER,
            char_slice(text, length - EDGE_CHARS, length),
        ]
        .concat()
    } else if length > FULL_LIMIT {
        [
            char_slice(text, 0, EDGE_CHARS),
            MIDDLE_MARKER,
            char_slice(text, length - EDGE_CHARS, length),
        ]
        .concat()
    } else {
        text.to_string()
    }
}

/// Prompt asking for the three tagged note sections
pub fn notes_prompt(kind: SourceKind, title: &str, text: &str) -> String {
    let material = kind.material();
    let body = truncate_for_prompt(text);

    format!(
        r#"You are an expert note-taker. Read {material} and write thorough, well organised study notes that keep every important fact, example, number, name, step and recommendation.

Title: {title}

CONTENT:
{body}

Answer in exactly this format, with nothing before SUMMARY:

SUMMARY:
Three to four paragraphs covering the purpose, the main ideas and the key takeaways.

KEY POINTS:
• Eight to twelve specific points, one per line, each starting with "•"

BULLET NOTES:
• Detailed notes grouped by topic, one per line, each starting with "•"
• Include definitions, processes, statistics, tools, warnings and action items

Prefer completeness over brevity and avoid vague or generic statements."#
    )
}

/// Prompt answering a question about notes already generated
pub fn chat_prompt(question: &str, context: &str) -> String {
    format!(
        r#"You are a helpful study assistant. Answer the user's question using the notes below. If the notes do not contain the answer, say so briefly and answer from general knowledge.

{context}

Question: {question}

Answer:"#
    )
}

/// Context block describing a document for chat
pub fn chat_context(
    kind: SourceKind,
    title: &str,
    summary: &str,
    key_points: &str,
    bullet_notes: &str,
) -> String {
    format!(
        "{kind} Title: {title}\n\nSummary: {summary}\n\nKey Points: {key_points}\n\nNotes: {bullet_notes}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        let text = "a".repeat(FULL_LIMIT);
        assert_eq!(truncate_for_prompt(&text), text);
    }

    #[test]
    fn test_medium_text_keeps_edges() {
        let text = format!("{}{}{}", "a".repeat(20_000), "b".repeat(5_000), "c".repeat(20_000));
        let truncated = truncate_for_prompt(&text);
        assert_eq!(
            truncated,
            format!("{}{}{}", "a".repeat(20_000), MIDDLE_MARKER, "c".repeat(20_000))
        );
    }

    #[test]
    fn test_long_text_keeps_middle_sample() {
        let text = format!("{}{}{}", "a".repeat(25_000), "m".repeat(20_000), "z".repeat(25_000));
        let truncated = truncate_for_prompt(&text);

        assert!(truncated.starts_with(&"a".repeat(20_000)));
        assert!(truncated.contains(&format!(
            "{}{}{}",
            MIDDLE_MARKER,
            "m".repeat(10_000),
            MORE_MARKER
        )));
        assert!(truncated.ends_with(&"z".repeat(20_000)));
        assert_eq!(
            truncated.chars().count(),
            50_000 + MIDDLE_MARKER.len() + MORE_MARKER.len()
        );
    }

    #[test]
    fn test_truncation_counts_characters() {
        let text = "é".repeat(40_000);
        let truncated = truncate_for_prompt(&text);
        assert_eq!(
            truncated.chars().count(),
            40_000 + MIDDLE_MARKER.chars().count()
        );
    }

    #[test]
    fn test_notes_prompt_mentions_sections() {
        let prompt = notes_prompt(SourceKind::Pdf, "Rust Book", "ownership and borrowing");
        assert!(prompt.contains("Title: Rust Book"));
        assert!(prompt.contains("ownership and borrowing"));
        for header in ["SUMMARY:", "KEY POINTS:", "BULLET NOTES:"] {
            assert!(prompt.contains(header));
        }
    }

    #[test]
    fn test_chat_context_layout() {
        let context = chat_context(SourceKind::Pdf, "a.pdf", "S", "K", "N");
        assert_eq!(context, "PDF Title: a.pdf\n\nSummary: S\n\nKey Points: K\n\nNotes: N");
    }
}
