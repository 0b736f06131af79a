/*!
 * Chapter body chunking.
 *
 * A chapter body is cut into pieces small enough for one translation request.
 * Paragraph breaks and scene-break markers are kept as atomic separator tokens,
 * so a chunk boundary always falls between tokens and never inside one.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Paragraph breaks (two or more newlines) and scene breaks (3+ asterisks,
/// optionally with the surrounding newline)
static SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n{2,}|\n?\*{3,}\n?").expect("separator regex is valid")
});

/// One bounded slice of a chapter body
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Order of the chapter the chunk belongs to
    pub chapter_order: usize,
    /// Position of the chunk within its chapter
    pub index: usize,
    /// Source text
    pub text: String,
    /// Translated text, set once the chunk succeeds
    pub translated: Option<String>,
    /// Number of retries made after the first attempt
    pub retries: u32,
}

impl Chunk {
    pub fn new(chapter_order: usize, index: usize, text: impl Into<String>) -> Self {
        Self {
            chapter_order,
            index,
            text: text.into(),
            translated: None,
            retries: 0,
        }
    }
}

/// Splits chapter bodies into chunks of at most `max_chars` characters
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(3500)
    }
}

impl Chunker {
    /// Create a chunker with a character budget; a zero budget is treated as 1
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Split a body into trimmed, non-empty chunk texts
    pub fn split(&self, body: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_chars = 0;

        for token in tokenize(body) {
            let token_chars = token.chars().count();
            if buffer_chars + token_chars > self.max_chars && !buffer.is_empty() {
                self.flush(&mut chunks, &buffer);
                buffer.clear();
                buffer_chars = 0;
            }
            buffer.push_str(token);
            buffer_chars += token_chars;
        }

        if !buffer.is_empty() {
            self.flush(&mut chunks, &buffer);
        }

        chunks
    }

    /// Split a body into indexed chunks for one chapter
    pub fn chunks_for(&self, chapter_order: usize, body: &str) -> Vec<Chunk> {
        self.split(body)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk::new(chapter_order, index, text))
            .collect()
    }

    fn flush(&self, chunks: &mut Vec<String>, buffer: &str) {
        let trimmed = buffer.trim();
        if trimmed.is_empty() {
            return;
        }

        let chars = trimmed.chars().count();
        if chars > self.max_chars {
            debug!(
                "Chunk {} holds a single {}-char token over the {}-char budget, sending it whole",
                chunks.len(),
                chars,
                self.max_chars
            );
        }
        chunks.push(trimmed.to_string());
    }
}

/// Interleave text tokens with the separators between them
fn tokenize(body: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for separator in SEPARATOR_REGEX.find_iter(body) {
        if separator.start() > last {
            tokens.push(&body[last..separator.start()]);
        }
        tokens.push(separator.as_str());
        last = separator.end();
    }
    if last < body.len() {
        tokens.push(&body[last..]);
    }

    tokens
}
