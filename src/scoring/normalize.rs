//! Raw anomaly score to public risk scale.

/// Convert the forest's decision value into the bounded 0-100 risk score.
///
/// The detector's convention (higher = more normal) is inverted so that
/// higher output means higher risk, then rescaled to a percentage band.
/// The clamp is mandatory: the raw decision is unbounded in principle and
/// the public contract is an integer in [0, 100].
pub fn risk_score(raw_decision: f64) -> u8 {
    let risk_raw = 1.0 - raw_decision;
    (risk_raw * 100.0).round().clamp(0.0, 100.0) as u8
}
