/*!
 * Chapter-level text normalization.
 *
 * Applied once to a chapter's reassembled translation, never to single chunks,
 * so that artifacts at chunk seams are cleaned up together with everything else.
 * The result is deterministic and idempotent.
 */

use crate::document::normalize_line_endings;

/// Punctuation that should hug the preceding word
const TIGHT_PUNCTUATION: [char; 6] = [',', '.', ';', ':', '!', '?'];

/// Canonical scene-break line
pub const SCENE_BREAK: &str = "***";

/// Normalize a translated chapter
///
/// - line endings become `\n`
/// - trailing whitespace is stripped from every line
/// - spaces and tabs before `,.;:!?` are removed unless the mark opens the line
/// - scene-break lines become exactly `***` with no blank lines around them
/// - runs of blank lines collapse to one
/// - leading and trailing blank lines are dropped
pub fn normalize(text: &str) -> String {
    let text = normalize_line_endings(text);
    let mut lines: Vec<String> = Vec::new();
    let mut after_scene_break = false;

    for raw in text.split('\n') {
        let line = tighten_punctuation(raw.trim_end());

        if is_scene_break(&line) {
            while lines.last().is_some_and(|l| l.is_empty()) {
                lines.pop();
            }
            lines.push(SCENE_BREAK.to_string());
            after_scene_break = true;
            continue;
        }

        if line.is_empty() {
            let previous_blank = lines.last().is_some_and(|l| l.is_empty());
            if after_scene_break || previous_blank || lines.is_empty() {
                continue;
            }
        } else {
            after_scene_break = false;
        }

        lines.push(line);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// A line made only of three or more asterisks, ignoring surrounding whitespace
pub fn is_scene_break(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '*')
}

fn is_horizontal_whitespace(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}

fn tighten_punctuation(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if TIGHT_PUNCTUATION.contains(&c) {
            let kept = out.trim_end_matches(is_horizontal_whitespace).len();
            if kept > 0 {
                out.truncate(kept);
            }
        }
        out.push(c);
    }
    out
}
