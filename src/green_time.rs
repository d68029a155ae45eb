use crate::queue_state::Counts;

/// Spec §4.6: `g = clamp(normal * 0.8 + emergency * 2.0, min_green, max_green)`.
pub fn green_for_movement(counts: Counts, min_green: f64, max_green: f64) -> f64 {
    let base = counts.normal as f64 * 0.8 + counts.emergency as f64 * 2.0;
    base.clamp(min_green, max_green)
}

/// Duration for a multi-movement phase: the max over its members (spec §4.6).
pub fn phase_duration(members: impl IntoIterator<Item = f64>, min_green: f64) -> f64 {
    members
        .into_iter()
        .fold(None, |acc: Option<f64>, g| match acc {
            Some(cur) if cur >= g => Some(cur),
            _ => Some(g),
        })
        .unwrap_or(min_green)
}
