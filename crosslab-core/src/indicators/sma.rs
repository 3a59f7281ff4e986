//! Trailing simple moving average.

/// Trailing simple moving average of `values` over `window` points.
///
/// Output is aligned with the input: entry `i` is the mean of
/// `values[i + 1 - window ..= i]`, and the first `window - 1` entries are
/// `None`. A zero window yields all `None`.
///
/// The mean is taken as offsets from the window's first value, so a constant
/// window averages to exactly that constant with no rounding residue.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        let slice = &values[i + 1 - window..=i];
        let pivot = slice[0];
        let offset: f64 = slice.iter().map(|v| v - pivot).sum();
        out.push(Some(pivot + offset / window as f64));
    }
    out
}
