use serde::Serialize;

/// Summary of one numeric series. `mean` and `std` are rounded to two decimals,
/// `min` and `max` are reported as observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BasicStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Population statistics (divisor `n`). Returns `None` for an empty series.
pub fn basic_stats(values: &[f64]) -> Option<BasicStats> {
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(BasicStats {
        count,
        mean: round2(mean),
        std: round2(variance.sqrt()),
        min,
        max,
    })
}

/// Exact ties go to the even digit, so `0.125` becomes `0.12`.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// `part / whole * 100` rounded to one decimal; zero when `whole` is zero.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}
