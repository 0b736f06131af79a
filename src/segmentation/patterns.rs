/*!
 * Heading recognizers used to find chapter boundaries.
 *
 * The table is plain data so it can be extended or replaced from configuration.
 * Every pattern is compiled case-insensitive and multi-line, and is expected
 * to be anchored with `^` so it only fires at the start of a line.
 */

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::errors::SegmentationError;

/// One entry of the boundary pattern table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryPattern {
    /// Short identifier reported on the chapters it produces
    pub name: String,
    /// Regular expression, anchored at line start
    pub pattern: String,
    /// Lower wins when several patterns match at the same position
    #[serde(default)]
    pub priority: u32,
}

impl BoundaryPattern {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            priority,
        }
    }
}

/// Built-in heading conventions, in declaration order
pub fn default_patterns() -> Vec<BoundaryPattern> {
    vec![
        BoundaryPattern::new("chapter", r"^chapter\s+(?:\d+|[ivxlcdm]+)\b", 0),
        // Chinese / Japanese: 第12章, 第 3 回, 第十二章, 第5話
        BoundaryPattern::new(
            "cjk-chapter",
            r"^第\s*[0-9０-９零〇一二三四五六七八九十百千两]+\s*[章回节節话話]",
            0,
        ),
        // Korean: 제1장, 제 12 화
        BoundaryPattern::new("korean", r"^제\s*\d+\s*[장화]", 0),
        BoundaryPattern::new(
            "volume",
            r"^(?:卷\s*[0-9０-９零〇一二三四五六七八九十百千]+|第\s*[0-9０-９零〇一二三四五六七八九十百千]+\s*卷|(?:volume|book)\s+\d+\b)",
            1,
        ),
        BoundaryPattern::new("special", r"^(?:prologue|epilogue|interlude)\b", 1),
        BoundaryPattern::new("act-part", r"^(?:act|part)\s+\d+\b", 2),
        BoundaryPattern::new("arc", r"^arc\s+\d+\b", 2),
    ]
}

/// A compiled table entry
#[derive(Debug, Clone)]
pub(crate) struct CompiledPattern {
    pub name: String,
    pub priority: u32,
    pub regex: Regex,
}

/// Compile a table, keeping declaration order
pub(crate) fn compile(patterns: &[BoundaryPattern]) -> Result<Vec<CompiledPattern>, SegmentationError> {
    patterns
        .iter()
        .map(|entry| {
            RegexBuilder::new(&entry.pattern)
                .case_insensitive(true)
                .multi_line(true)
                .build()
                .map(|regex| CompiledPattern {
                    name: entry.name.clone(),
                    priority: entry.priority,
                    regex,
                })
                .map_err(|source| SegmentationError::InvalidPattern {
                    name: entry.name.clone(),
                    source,
                })
        })
        .collect()
}
