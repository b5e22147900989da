use super::*;
use assertables::*;
use proptest::prelude::*;

#[test]
fn test_empty_text_hits_floor() {
    assert_eq!(expected_duration_secs(""), 30.0);
    assert_eq!(expected_duration_secs("   \n\t "), 30.0);
}

#[test]
fn test_260_words() {
    let script = "word ".repeat(260);
    assert_eq!(word_count(&script), 260);
    // 25 + 0.9 * 120
    assert!((expected_duration_secs(&script) - 133.0).abs() < 1e-9);
}

#[test]
fn test_long_script_is_capped() {
    let script = "word ".repeat(10_000);
    assert_eq!(expected_duration_secs(&script), 300.0);
    assert_eq!(expected_duration(&script), Duration::from_secs(300));
}

#[test]
fn test_word_count_splits_on_any_whitespace() {
    assert_eq!(word_count("one\ttwo\nthree   four"), 4);
    assert_eq!(word_count(""), 0);
}

proptest! {
    #[test]
    fn test_always_within_bounds(text in ".*") {
        let secs = expected_duration_secs(&text);
        assert_ge!(secs, MIN_EXPECTED_SECS);
        assert_le!(secs, MAX_EXPECTED_SECS);
    }

    #[test]
    fn test_more_words_never_shorter(words in 0usize..2000, extra in 0usize..500) {
        let shorter = "w ".repeat(words);
        let longer = "w ".repeat(words + extra);
        assert_le!(expected_duration_secs(&shorter), expected_duration_secs(&longer));
    }
}
