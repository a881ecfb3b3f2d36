/// Min-max rescale `scores` into `[0, 1]`.
///
/// When every score is equal there is no spread to rescale: positive scores
/// map to 1.0 and everything else to 0.0, so an all-zero list stays zero.
/// Non-finite scores sit outside the scaled range: `+inf` maps to 1.0,
/// `-inf` and NaN to 0.0.
pub fn normalize(scores: &[f32]) -> Vec<f32> {
    let Some((min, max)) = finite_bounds(scores) else {
        return scores.iter().map(|&s| pinned(s)).collect();
    };
    if min == max {
        return scores
            .iter()
            .map(|&s| if !s.is_finite() { pinned(s) } else if s > 0.0 { 1.0 } else { 0.0 })
            .collect();
    }
    let (min, span) = (f64::from(min), f64::from(max) - f64::from(min));
    scores
        .iter()
        .map(|&s| if s.is_finite() { ((f64::from(s) - min) / span).clamp(0.0, 1.0) as f32 } else { pinned(s) })
        .collect()
}

fn pinned(s: f32) -> f32 {
    if s == f32::INFINITY { 1.0 } else { 0.0 }
}

fn finite_bounds(scores: &[f32]) -> Option<(f32, f32)> {
    scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(None, |acc, s| match acc {
            None => Some((s, s)),
            Some((lo, hi)) => Some((f32::min(lo, s), f32::max(hi, s))),
        })
}
