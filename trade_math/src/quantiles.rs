//! Quantile cuts for cross-sectional bucketing
//!
//! Edges are linearly interpolated quantiles of the sample. Bucket `i` holds
//! the values in `(edge[i], edge[i + 1]]`, with the lowest edge included in
//! bucket 0. Repeated values can produce repeated edges; the buckets between
//! repeated edges are then empty instead of the cut failing.

use crate::{MathError, Result};

fn check_values(values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute quantiles of an empty sample".to_string(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Quantile sample contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Quantile `q` of an ascending-sorted sample, linearly interpolated
pub fn quantile(sorted: &[f64], q: f64) -> Result<f64> {
    check_values(sorted)?;
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be within [0, 1], got {}",
            q
        )));
    }

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Ok(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// `buckets + 1` equally spaced quantile edges of `values`
pub fn quantile_edges(values: &[f64], buckets: usize) -> Result<Vec<f64>> {
    check_values(values)?;
    if buckets == 0 {
        return Err(MathError::InvalidInput(
            "Bucket count must be greater than zero".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    (0..=buckets)
        .map(|i| quantile(&sorted, i as f64 / buckets as f64))
        .collect()
}

/// Bucket label in `0..buckets` for every value, in input order
pub fn qcut(values: &[f64], buckets: usize) -> Result<Vec<usize>> {
    let edges = quantile_edges(values, buckets)?;
    let upper_edges = &edges[1..];

    Ok(values
        .iter()
        .map(|value| {
            upper_edges
                .iter()
                .position(|edge| value <= edge)
                .unwrap_or(buckets - 1)
        })
        .collect())
}
