/*!
 * Tests for ISO language code utilities
 */

use novelwai::language_utils::{
    LanguageCodeType, display_name, get_language_name, language_codes_match, normalize_to_part2t,
    validate_language_code,
};

#[test]
fn test_validateLanguageCode_withKnownCodes_shouldReportType() {
    assert_eq!(validate_language_code("ko").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("kor").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("chi").unwrap(), LanguageCodeType::Part2B);
    assert!(validate_language_code("zz").is_err());
    assert!(validate_language_code("").is_err());
}

#[test]
fn test_normalizeToPart2t_shouldConvertAllForms() {
    assert_eq!(normalize_to_part2t("ja").unwrap(), "jpn");
    assert_eq!(normalize_to_part2t(" ZH ").unwrap(), "zho");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
}

#[test]
fn test_languageNames_shouldFeedPrompts() {
    assert_eq!(get_language_name("zh").unwrap(), "Chinese");
    assert_eq!(display_name("ja"), "Japanese");
    assert_eq!(display_name("AUTO"), "the original language");
    assert_eq!(display_name("Brazilian Portuguese"), "Brazilian Portuguese");
    assert!(language_codes_match("ko", "kor"));
}
