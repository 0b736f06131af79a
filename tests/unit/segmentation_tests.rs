/*!
 * Tests for chapter segmentation
 */

use novelwai::app_config::SegmentationConfig;
use novelwai::errors::SegmentationError;
use novelwai::segmentation::{BoundaryPattern, Segmenter, split_fixed, split_into_parts};

use crate::common::{paragraphs, sample_novel, visible};

fn segmenter() -> Segmenter {
    Segmenter::new(&SegmentationConfig::default()).unwrap()
}

#[test]
fn test_split_withOrderedHeadings_shouldReturnOneChapterPerHeading() {
    let text = "Chapter 1\nFirst.\n\nChapter 2\nSecond.\n\nChapter 3\nThird.";
    let segmenter = segmenter();

    let chapters = segmenter.split(text);
    assert_eq!(chapters.len(), 3);
    for (i, chapter) in chapters.iter().enumerate() {
        assert_eq!(chapter.order(), i + 1);
        assert_eq!(chapter.title(), Some(format!("Chapter {}", i + 1).as_str()));
        assert_eq!(chapter.heading_kind(), Some("chapter"));
    }

    let spans = segmenter.raw_spans(text);
    let rebuilt: String = spans.iter().map(|span| span.text).collect();
    assert_eq!(rebuilt, text);
}

#[test]
fn test_split_withPreamble_shouldKeepItAsUntitledFirstChapter() {
    let chapters = segmenter().split(sample_novel());

    assert_eq!(chapters.len(), 4);
    assert_eq!(chapters[0].title(), None);
    assert_eq!(chapters[0].body(), "Translator's note: fan translation.");
    assert_eq!(chapters[1].title(), Some("Chapter 1"));
    assert!(chapters[1].body().contains("***"));
    assert!(chapters[1].body().ends_with("Morning came."));
    assert_eq!(chapters[3].title(), Some("Epilogue"));
    assert_eq!(chapters[3].heading_kind(), Some("special"));
}

#[test]
fn test_split_withCjkHeadings_shouldUseHeadingLineAsTitle() {
    let text = "第1章 开始\n他走进了房间。\n第2章 继续\n她笑了。";
    let chapters = segmenter().split(text);

    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].title(), Some("第1章 开始"));
    assert_eq!(chapters[0].body(), "他走进了房间。");
    assert_eq!(chapters[1].body(), "她笑了。");
}

#[test]
fn test_split_withKoreanHeadings_shouldSplit() {
    let chapters = segmenter().split("제1화\n안녕하세요.\n\n제2화\n잘 가요.");
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[1].title(), Some("제2화"));
    assert_eq!(chapters[1].heading_kind(), Some("korean"));
}

#[test]
fn test_split_withHeadingWordMidLine_shouldNotSplit() {
    let chapters = segmenter().split("Chapter 1\nHe read chapter 3 aloud.\nThen part 2 of it.");
    assert_eq!(chapters.len(), 1);
    assert_eq!(chapters[0].body(), "He read chapter 3 aloud.\nThen part 2 of it.");
}

#[test]
fn test_split_withCrlfInput_shouldMatchLfInput() {
    let lf = segmenter().split("Chapter 1\nOne.\n\nChapter 2\nTwo.");
    let crlf = segmenter().split("Chapter 1\r\nOne.\r\n\r\nChapter 2\r\nTwo.");
    assert_eq!(lf, crlf);
}

#[test]
fn test_split_withEmptyText_shouldReturnNoChapters() {
    assert!(segmenter().split("").is_empty());
    assert!(segmenter().split("   \n\n ").is_empty());
}

#[test]
fn test_boundaries_samePosition_shouldPreferLowerPriority() {
    let config = SegmentationConfig {
        patterns: vec![
            BoundaryPattern::new("generic", r"^part\s+\d+", 2),
            BoundaryPattern::new("specific", r"^part\s+\d+", 0),
        ],
        ..Default::default()
    };
    let boundaries = Segmenter::new(&config).unwrap().boundaries("Part 1\nbody");

    assert_eq!(boundaries.len(), 1);
    assert_eq!(boundaries[0].kind, "specific");
}

#[test]
fn test_boundaries_equalPriority_shouldPreferDeclarationOrder() {
    let config = SegmentationConfig {
        patterns: vec![
            BoundaryPattern::new("first", r"^scene\s+\d+", 1),
            BoundaryPattern::new("second", r"^scene", 1),
        ],
        ..Default::default()
    };
    let boundaries = Segmenter::new(&config).unwrap().boundaries("intro\nScene 4\nbody");

    assert_eq!(boundaries.len(), 1);
    assert_eq!(boundaries[0].start, 6);
    assert_eq!(boundaries[0].kind, "first");
}

#[test]
fn test_segmenter_withCustomPatternFromJson_shouldApplyIt() {
    let config: SegmentationConfig = serde_json::from_str(
        r#"{"patterns": [{"name": "markdown", "pattern": "^#\\s+\\S"}]}"#,
    )
    .unwrap();
    assert_eq!(config.patterns[0].priority, 0);
    assert_eq!(config.fallback_chapter_chars, 4000);

    let chapters = Segmenter::new(&config).unwrap().split("# One\nbody one\n# Two\nbody two");
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[1].title(), Some("# Two"));
}

#[test]
fn test_segmenter_withInvalidPattern_shouldNameIt() {
    let config = SegmentationConfig {
        patterns: vec![BoundaryPattern::new("broken", r"^chapter (", 0)],
        ..Default::default()
    };
    match Segmenter::new(&config) {
        Err(SegmentationError::InvalidPattern { name, .. }) => assert_eq!(name, "broken"),
        other => panic!("expected InvalidPattern, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_split_withoutHeadings_shouldFallBackToFixedPieces() {
    let text = "x".repeat(10_000);
    let chapters = segmenter().split(&text);

    assert_eq!(chapters.len(), 3);
    assert!(chapters.iter().all(|c| c.title().is_none()));
    assert_eq!(chapters[0].body().chars().count(), 4000);
    assert_eq!(chapters[2].body().chars().count(), 2000);
    assert_eq!(chapters[2].display_title(), "Chapter 3");
}

#[test]
fn test_splitFixed_shouldCoverTextInCeilPieces() {
    let text = "abcdefghij";
    let pieces = split_fixed(text, 3);
    assert_eq!(pieces, vec!["abc", "def", "ghi", "j"]);
    assert_eq!(pieces.concat(), text);

    let korean = split_fixed("가나다라마", 2);
    assert_eq!(korean, vec!["가나", "다라", "마"]);
}

#[test]
fn test_split_singleLongChapter_shouldResplitIntoParts() {
    let text = format!("Chapter 1\n{}", paragraphs(20, 300));
    let chapters = segmenter().split(&text);

    assert!(chapters.len() >= 2);
    for (i, chapter) in chapters.iter().enumerate() {
        assert_eq!(chapter.title(), Some(format!("Part {}", i + 1).as_str()));
        assert!(chapter.body().chars().count() <= 3500);
    }
    let rebuilt: String = chapters.iter().map(|c| c.body()).collect();
    assert_eq!(visible(&rebuilt), visible(&text));
}

#[test]
fn test_splitIntoParts_shouldPreferBlankLine() {
    assert_eq!(split_into_parts("aaaa\n\nbbbb", 8, 2), vec!["aaaa", "bbbb"]);
}

#[test]
fn test_splitIntoParts_withoutBlankLine_shouldCutAtBudget() {
    assert_eq!(split_into_parts("abcdefghij", 4, 2), vec!["abcd", "efgh", "ij"]);
}
