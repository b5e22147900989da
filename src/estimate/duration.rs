use std::time::Duration;

#[cfg(test)]
mod tests;

/// Reference narration rate.
pub const WORDS_PER_MINUTE: f64 = 130.0;
/// Queueing and setup cost independent of script length.
pub const BASE_OVERHEAD_SECS: f64 = 25.0;
pub const SPEECH_MULTIPLIER: f64 = 0.9;
pub const MIN_EXPECTED_SECS: f64 = 30.0;
pub const MAX_EXPECTED_SECS: f64 = 300.0;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Expected wall-clock seconds to generate a video narrating `text`.
///
/// Always within `[MIN_EXPECTED_SECS, MAX_EXPECTED_SECS]`. Long scripts are
/// capped so that early progress does not look stalled; the progress estimate
/// holds below 100% until completion anyway.
pub fn expected_duration_secs(text: &str) -> f64 {
    let speech_secs = word_count(text) as f64 / WORDS_PER_MINUTE * 60.0;
    let total = BASE_OVERHEAD_SECS + SPEECH_MULTIPLIER * speech_secs;
    total.clamp(MIN_EXPECTED_SECS, MAX_EXPECTED_SECS)
}

pub fn expected_duration(text: &str) -> Duration {
    Duration::from_secs_f64(expected_duration_secs(text))
}
