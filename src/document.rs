/*!
 * Document and chapter model.
 *
 * A `Document` is the immutable, line-ending-normalized source text of a novel.
 * The segmenter turns it into ordered `Chapter`s whose translated text is only
 * ever written through `Chapter::commit_translation`.
 */

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unify `\r\n` and lone `\r` line endings to `\n`
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Raw source text of a novel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Optional human readable title
    title: Option<String>,
    /// Source language tag (ISO code or "auto")
    source_language: String,
    /// Text with `\n` line endings
    text: String,
}

impl Document {
    /// Ingest text, normalizing line endings
    pub fn new(text: &str, source_language: impl Into<String>) -> Self {
        Self {
            title: None,
            source_language: source_language.into(),
            text: normalize_line_endings(text).into_owned(),
        }
    }

    /// Attach a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Translation status of a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterStatus {
    #[default]
    Untranslated,
    InProgress,
    Translated,
    Failed,
}

impl fmt::Display for ChapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Untranslated => "untranslated",
            Self::InProgress => "in progress",
            Self::Translated => "translated",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// A chapter produced by the segmenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based position in the document
    order: usize,
    /// Heading line, when one was detected
    title: Option<String>,
    /// Source body, heading excluded
    body: String,
    /// Name of the heading pattern that opened this chapter
    heading_kind: Option<String>,
    /// Committed translation
    translated_text: Option<String>,
    status: ChapterStatus,
    translated_at: Option<DateTime<Utc>>,
}

impl Chapter {
    pub fn new(order: usize, title: Option<String>, body: impl Into<String>) -> Self {
        Self {
            order,
            title,
            body: body.into(),
            heading_kind: None,
            translated_text: None,
            status: ChapterStatus::Untranslated,
            translated_at: None,
        }
    }

    /// Record which heading pattern produced the chapter
    pub fn with_heading_kind(mut self, kind: impl Into<String>) -> Self {
        self.heading_kind = Some(kind.into());
        self
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn heading_kind(&self) -> Option<&str> {
        self.heading_kind.as_deref()
    }

    pub fn translated_text(&self) -> Option<&str> {
        self.translated_text.as_deref()
    }

    pub fn status(&self) -> ChapterStatus {
        self.status
    }

    pub fn translated_at(&self) -> Option<DateTime<Utc>> {
        self.translated_at
    }

    /// Explicit title, or a synthesized "Chapter N"
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => format!("Chapter {}", self.order),
        }
    }

    /// Translated text when available, otherwise the source body
    pub fn resolved_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.body)
    }

    /// Flag the chapter as being translated, returning the previous status
    pub(crate) fn mark_in_progress(&mut self) -> ChapterStatus {
        std::mem::replace(&mut self.status, ChapterStatus::InProgress)
    }

    /// Atomically store a finished translation
    pub(crate) fn commit_translation(&mut self, text: String) {
        self.translated_text = Some(text);
        self.status = ChapterStatus::Translated;
        self.translated_at = Some(Utc::now());
    }

    /// Record a failed attempt without touching any earlier translation
    pub(crate) fn record_failure(&mut self, previous: ChapterStatus) {
        self.status = if self.translated_text.is_some() {
            previous
        } else {
            ChapterStatus::Failed
        };
    }
}
