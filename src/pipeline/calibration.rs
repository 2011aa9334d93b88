/// Per-KA calibration of net dried weight against bag number
use std::collections::BTreeMap;
use tracing::debug;

use super::models::CalibrationRow;

/// Unit code -> fitted grams per bag (unrounded)
pub type SlopeTable = BTreeMap<String, f64>;

#[derive(Debug, Default)]
struct Sums {
    xy: f64,
    x2: f64,
    n: usize,
}

/// Least-squares slope through the origin for every unit code
///
/// `slope = Σ(bag × net) / Σ(bag²)` over rows where both values are finite.
/// A unit only gets an entry when `Σ(bag²) > 0`; units with no usable rows
/// (or only bag 0) are absent from the table rather than mapped to zero.
pub fn fit_slopes(rows: &[CalibrationRow]) -> SlopeTable {
    let mut sums: BTreeMap<&str, Sums> = BTreeMap::new();

    for row in rows {
        if row.ka.is_empty() {
            continue;
        }
        let (Some(bag), Some(net)) = (row.bag_number, row.net_weight) else {
            continue;
        };
        if !bag.is_finite() || !net.is_finite() {
            continue;
        }

        let entry = sums.entry(row.ka.as_str()).or_default();
        entry.xy += bag * net;
        entry.x2 += bag * bag;
        entry.n += 1;
    }

    sums.into_iter()
        .filter_map(|(ka, s)| {
            if s.x2 > 0.0 {
                let slope = s.xy / s.x2;
                debug!("KA {}: slope {:.4} g/bag from {} rows", ka, slope, s.n);
                Some((ka.to_string(), slope))
            } else {
                debug!("KA {}: no non-zero bag numbers, no slope", ka);
                None
            }
        })
        .collect()
}
