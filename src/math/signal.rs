//! One-dimensional signal helpers used by the detectors.

/// Centered moving average with edge clamping.
///
/// Sample `i` averages `values[i - half_window ..= i + half_window]`,
/// clipped to the slice bounds and divided by the number of samples that
/// were actually inside the window.
#[must_use]
pub fn centered_moving_average(values: &[f64], half_window: usize) -> Vec<f64> {
    let n = values.len();
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half_window);
            let end = (i + half_window + 1).min(n);
            let segment = &values[start..end];
            segment.iter().sum::<f64>() / segment.len() as f64
        })
        .collect()
}

/// True when `values[start..start + len]` (clipped to the slice) is
/// non-empty and every sample satisfies `pred`.
#[must_use]
pub fn holds_for<F>(values: &[f64], start: usize, len: usize, pred: F) -> bool
where
    F: Fn(f64) -> bool,
{
    let end = (start + len).min(values.len());
    start < end && values[start..end].iter().all(|&v| pred(v))
}

/// Arithmetic mean, 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Index and value of the first maximum of `key` over `indices`.
///
/// Ties keep the earliest index.
pub fn first_max_by<I, F>(indices: I, key: F) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = usize>,
    F: Fn(usize) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for i in indices {
        let v = key(i);
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best
}
