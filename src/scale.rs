use serde::Serialize;

/// Result of rescaling a numeric series for display.
/// An empty unit means the series was returned unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleResult {
    pub unit: String,
    pub values: Vec<f64>,
}

/// Series whose smallest magnitude stays under this stay unscaled.
const SCALE_GATE: f64 = 10_000.0;

/// Descending ladder; the first threshold at or below the series'
/// minimum absolute value wins. Selecting by the minimum (not the
/// maximum) keeps a series with one large outlier and many small values
/// from being scaled into illegibility.
const SCALE_LADDER: [(f64, &str); 6] = [
    (1e15, "quadrillion"),
    (1e12, "trillion"),
    (1e9, "billion"),
    (1e6, "million"),
    (1e3, "thousand"),
    (1.0, ""),
];

/// Rescale a series to a human-readable unit.
///
/// Empty input yields an empty series and unit. Already-compact series
/// (minimum absolute value below the gate) pass through unchanged, which
/// also makes the operation idempotent.
pub fn scale_series(values: &[f64]) -> ScaleResult {
    if values.is_empty() {
        return ScaleResult {
            unit: String::new(),
            values: Vec::new(),
        };
    }

    let min_abs = values.iter().map(|v| v.abs()).fold(f64::INFINITY, f64::min);
    if min_abs < SCALE_GATE {
        return ScaleResult {
            unit: String::new(),
            values: values.to_vec(),
        };
    }

    let (threshold, unit) = SCALE_LADDER
        .iter()
        .find(|(threshold, _)| min_abs >= *threshold)
        .copied()
        .unwrap_or((1.0, ""));

    ScaleResult {
        unit: unit.to_string(),
        values: values.iter().map(|v| v / threshold).collect(),
    }
}
