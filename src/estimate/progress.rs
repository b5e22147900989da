use crate::job::{JobStatus, StatusGroup};


/// Ceiling while the job is still waiting to start.
pub const QUEUED_CEILING: f64 = 15.0;
/// Ceiling while the job runs; 100 is reserved for confirmed completion.
pub const ACTIVE_CEILING: f64 = 95.0;
/// Lower bound for the queued-phase denominator.
pub const QUEUED_MIN_WINDOW_SECS: f64 = 5.0;
/// Percent of the expected duration over which the queued phase ramps up.
pub const QUEUED_WINDOW_PERCENT: f64 = 15.0;
// Absorbs float error such as 0.15 * 100 != 15 before truncating.
const TRUNCATION_EPSILON: f64 = 1e-9;

/// Display percentage for a job in `status`.
///
/// Pure and stateless: callers that need a non-decreasing signal keep the
/// highest value seen so far. A larger `reported` value from the service
/// always wins over the heuristic.
pub fn estimate(
    status: &JobStatus,
    elapsed_secs: f64,
    expected_secs: f64,
    reported: Option<u8>,
) -> u8 {
    let elapsed = if elapsed_secs.is_finite() {
        elapsed_secs.max(0.0)
    } else {
        0.0
    };
    let expected = if expected_secs.is_finite() && expected_secs > 0.0 {
        expected_secs
    } else {
        f64::MIN_POSITIVE
    };

    let heuristic = match status.group() {
        StatusGroup::Queued => {
            let window = (expected * QUEUED_WINDOW_PERCENT / 100.0).max(QUEUED_MIN_WINDOW_SECS);
            (elapsed / window * QUEUED_CEILING).clamp(0.0, QUEUED_CEILING)
        }
        StatusGroup::Active => {
            let ramp = ACTIVE_CEILING - QUEUED_CEILING;
            (QUEUED_CEILING + elapsed / expected * ramp).clamp(QUEUED_CEILING, ACTIVE_CEILING)
        }
        StatusGroup::Succeeded => 100.0,
        StatusGroup::Failed | StatusGroup::Unrecognized => 0.0,
    };

    let heuristic = (heuristic + TRUNCATION_EPSILON).floor() as u8;
    heuristic.max(reported.unwrap_or(0)).min(100)
}
