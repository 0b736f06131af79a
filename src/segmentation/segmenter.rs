/*!
 * Chapter boundary detection.
 *
 * Every heading match marks a boundary; a chapter runs from one boundary to the
 * next. The heading line becomes the chapter title and is excluded from the
 * body. When no heading is found the text is cut into fixed-size pieces, and a
 * document that still ends up as a single oversized chapter is re-split into
 * "Part N" sections at paragraph breaks where possible.
 */

use std::ops::Range;

use log::debug;

use crate::app_config::SegmentationConfig;
use crate::document::{Chapter, normalize_line_endings};
use crate::errors::SegmentationError;

use super::patterns::{CompiledPattern, compile};

/// A detected heading position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// Byte offset of the heading's first character
    pub start: usize,
    /// Name of the winning pattern
    pub kind: String,
    /// Priority of the winning pattern
    pub priority: u32,
}

/// An untrimmed slice of the input between two boundaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSpan<'a> {
    /// Byte range in the input
    pub range: Range<usize>,
    /// The slice itself
    pub text: &'a str,
    /// Pattern that opened the span, `None` for leading text or fallback pieces
    pub kind: Option<String>,
}

/// Splits raw novel text into chapters
#[derive(Debug, Clone)]
pub struct Segmenter {
    patterns: Vec<CompiledPattern>,
    fallback_chapter_chars: usize,
    large_chapter_threshold: usize,
    part_chars: usize,
    part_min_chars: usize,
}

impl Segmenter {
    /// Compile the configured pattern table
    pub fn new(config: &SegmentationConfig) -> Result<Self, SegmentationError> {
        Ok(Self {
            patterns: compile(&config.patterns)?,
            fallback_chapter_chars: config.fallback_chapter_chars,
            large_chapter_threshold: config.large_chapter_threshold,
            part_chars: config.part_chars,
            part_min_chars: config.part_min_chars,
        })
    }

    /// All heading positions, leftmost first, one per position
    pub fn boundaries(&self, text: &str) -> Vec<Boundary> {
        let mut candidates: Vec<(usize, u32, usize, &str)> = Vec::new();
        for (declared, pattern) in self.patterns.iter().enumerate() {
            for m in pattern.regex.find_iter(text) {
                candidates.push((m.start(), pattern.priority, declared, &pattern.name));
            }
        }

        candidates.sort_by_key(|&(start, priority, declared, _)| (start, priority, declared));
        candidates.dedup_by_key(|candidate| candidate.0);

        candidates
            .into_iter()
            .map(|(start, priority, _, kind)| Boundary {
                start,
                kind: kind.to_string(),
                priority,
            })
            .collect()
    }

    /// Contiguous spans covering the whole text
    ///
    /// Concatenating the `text` of every span gives back the input exactly.
    pub fn raw_spans<'a>(&self, text: &'a str) -> Vec<RawSpan<'a>> {
        let boundaries = self.boundaries(text);
        let mut spans = Vec::with_capacity(boundaries.len() + 1);

        let first_start = boundaries.first().map_or(text.len(), |b| b.start);
        if first_start > 0 {
            spans.push(RawSpan {
                range: 0..first_start,
                text: &text[..first_start],
                kind: None,
            });
        }

        for (i, boundary) in boundaries.iter().enumerate() {
            let end = boundaries.get(i + 1).map_or(text.len(), |next| next.start);
            spans.push(RawSpan {
                range: boundary.start..end,
                text: &text[boundary.start..end],
                kind: Some(boundary.kind.clone()),
            });
        }

        spans
    }

    /// Run the full segmentation, fallbacks included
    pub fn split(&self, text: &str) -> Vec<Chapter> {
        let text = normalize_line_endings(text);
        let text = text.as_ref();

        let mut chapters: Vec<Chapter> = if self.boundaries(text).is_empty() {
            debug!(
                "No chapter headings found, falling back to {}-character pieces",
                self.fallback_chapter_chars
            );
            split_fixed(text, self.fallback_chapter_chars)
                .into_iter()
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .enumerate()
                .map(|(i, piece)| Chapter::new(i + 1, None, piece))
                .collect()
        } else {
            self.raw_spans(text)
                .iter()
                .filter_map(chapter_parts)
                .enumerate()
                .map(|(i, (title, body, kind))| {
                    let chapter = Chapter::new(i + 1, title, body);
                    match kind {
                        Some(kind) => chapter.with_heading_kind(kind),
                        None => chapter,
                    }
                })
                .collect()
        };

        let char_len = text.chars().count();
        if chapters.len() <= 1 && char_len > self.large_chapter_threshold {
            debug!(
                "Single chapter of {} characters exceeds {}, re-splitting into parts",
                char_len, self.large_chapter_threshold
            );
            chapters = split_into_parts(text, self.part_chars, self.part_min_chars)
                .into_iter()
                .enumerate()
                .map(|(i, part)| Chapter::new(i + 1, Some(format!("Part {}", i + 1)), part))
                .collect();
        }

        debug!("Segmented {} characters into {} chapters", char_len, chapters.len());
        chapters
    }
}

/// Title, body and heading kind of a span, or `None` for a blank span
fn chapter_parts(span: &RawSpan<'_>) -> Option<(Option<String>, String, Option<String>)> {
    let trimmed = span.text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match &span.kind {
        Some(kind) => {
            let (heading, body) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
            Some((Some(heading.trim().to_string()), body.trim().to_string(), Some(kind.clone())))
        }
        None => Some((None, trimmed.to_string(), None)),
    }
}

/// Byte offsets of every char boundary, including the end of the text
fn char_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}

/// Cut text into consecutive pieces of `size` characters, the last one shorter
///
/// Pieces are returned untrimmed; joining them gives back the input.
pub fn split_fixed(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let offsets = char_offsets(text);
    let char_count = offsets.len() - 1;

    (0..char_count)
        .step_by(size)
        .map(|start| {
            let end = (start + size).min(char_count);
            &text[offsets[start]..offsets[end]]
        })
        .collect()
}

/// Cut text into trimmed parts of at most `budget` characters
///
/// While the remaining text is longer than `budget`, each cut goes at the last
/// blank line that leaves more than `min_part` characters in the part, and
/// falls back to cutting exactly at the budget boundary.
pub fn split_into_parts(text: &str, budget: usize, min_part: usize) -> Vec<String> {
    let budget = budget.max(1);
    let text = text.trim();
    let offsets = char_offsets(text);
    let char_count = offsets.len() - 1;

    let mut parts = Vec::new();
    let mut start = 0;
    while start < char_count {
        let end = (start + budget).min(char_count);
        let mut cut = end;

        if end < char_count {
            let window_start = start + min_part + 1;
            if window_start < end {
                let window = &text[offsets[window_start]..offsets[end]];
                if let Some(pos) = window.rfind("\n\n") {
                    let byte = offsets[window_start] + pos;
                    if let Ok(index) = offsets.binary_search(&byte) {
                        cut = index;
                    }
                }
            }
        }

        let part = text[offsets[start]..offsets[cut]].trim();
        if !part.is_empty() {
            parts.push(part.to_string());
        }
        start = cut;
    }

    parts
}
