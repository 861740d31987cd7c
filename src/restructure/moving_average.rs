//! Centred moving average and the peak/trough transform of one sampling date.

/// Centred moving average over `window` classes (odd). Near the ends the
/// window is truncated to the classes that exist, so every mean is taken
/// over real bins only.
pub fn centred_moving_average(counts: &[f64], window: usize) -> Vec<f64> {
    let n = counts.len();
    let half = window / 2;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let slice = &counts[lo..=hi];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Ratio of each count to its local moving average.
///
/// An empty neighbourhood (average zero, count zero) carries no signal and
/// gets ratio 1. A positive count over a zero average cannot arise from a
/// window that contains the count itself; should it happen anyway the ratio
/// is clamped to `window`, the largest value a single occupied bin can reach.
pub fn relative_counts(counts: &[f64], moving_average: &[f64], window: usize) -> Vec<f64> {
    let max_ratio = window as f64;
    counts
        .iter()
        .zip(moving_average)
        .map(|(&c, &ma)| {
            if ma > 0.0 {
                (c / ma).min(max_ratio)
            } else if c > 0.0 {
                max_ratio
            } else {
                1.0
            }
        })
        .collect()
}

/// Sign-preserving square-root compression of a relative count.
///
/// Peaks (`ratio >= 1`) map to `sqrt(ratio) - 1`, troughs to
/// `1 - sqrt(1 / ratio)` saturated at -1, so an empty bin next to a catch
/// scores -1. With `addl_sqrt` the peak side is compressed once more.
pub fn peak_trough_score(ratio: f64, addl_sqrt: bool) -> f64 {
    if ratio >= 1.0 {
        let peak = ratio.sqrt() - 1.0;
        if addl_sqrt {
            peak.sqrt()
        } else {
            peak
        }
    } else if ratio > 0.0 {
        (1.0 - (1.0 / ratio).sqrt()).max(-1.0)
    } else {
        -1.0
    }
}

/// Rescale negative scores so that their total mass equals the positive
/// mass, the usual ELEFAN balancing of peaks against troughs.
pub fn balance_troughs(scores: &mut [f64]) {
    let positive: f64 = scores.iter().filter(|s| **s > 0.0).sum();
    let negative: f64 = -scores.iter().filter(|s| **s < 0.0).sum::<f64>();
    if positive > 0.0 && negative > 0.0 {
        let factor = positive / negative;
        for s in scores.iter_mut().filter(|s| **s < 0.0) {
            *s *= factor;
        }
    }
}
