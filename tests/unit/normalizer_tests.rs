/*!
 * Tests for chapter-wide normalization
 */

use novelwai::translation::{Chunk, normalize, reassemble};

fn translated_chunk(index: usize, text: &str) -> Chunk {
    let mut chunk = Chunk::new(1, index, "source");
    chunk.translated = Some(text.to_string());
    chunk
}

#[test]
fn test_normalize_shouldBeIdempotent() {
    let samples = [
        "  Hello , world !  \r\n\r\n\r\n\r\n***\r\n\r\nNext scene .",
        "\n\n\n* * *\n   ******   \nline ;\tend",
        "Dialogue :\n\"Yes ?\"\n\n\n\n\"No !\"",
        "한국어 문장 .\n\n中文句子 ，\n\n",
    ];
    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once, "sample {:?}", sample);
    }
}

#[test]
fn test_normalize_shouldCleanChunkSeams() {
    let joined = reassemble(vec![
        translated_chunk(1, "Second part .  \n\n"),
        translated_chunk(0, "First part\n\n*****"),
        translated_chunk(2, "\n\nThird part !"),
    ]);
    assert_eq!(normalize(&joined), "First part\n***\nSecond part.\n\nThird part!");
}

#[test]
fn test_normalize_shouldNeverJoinLines() {
    assert_eq!(normalize("Wait\n, what?"), "Wait\n, what?");
}
