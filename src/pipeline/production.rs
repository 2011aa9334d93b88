/// Forage production estimates
///
/// Joins the averaged yield proxy of each site visit with the calibration
/// slope of its KA. Visits whose KA has no slope are reported, not dropped
/// silently and not zero-filled.
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::calibration::{fit_slopes, SlopeTable};
use super::models::{CalibrationRow, GroupKey, ProductionRow, YieldRow};
use super::normalize::to_rounded_number;
use super::LBS_PER_ACRE_FACTOR;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ProductionReport {
    pub rows: Vec<ProductionRow>,
    /// Unit codes present in the yield data with no fitted slope
    #[schema(value_type = Vec<String>)]
    pub missing_calibration: BTreeSet<String>,
    /// Every fitted slope, unrounded
    #[schema(value_type = Object)]
    pub slopes: SlopeTable,
}

#[derive(Debug, Default)]
struct GroupSums {
    sum: f64,
    count: usize,
}

pub fn compute_production(
    yield_rows: &[YieldRow],
    calibration_rows: &[CalibrationRow],
    yield_value_column: &str,
) -> ProductionReport {
    let slopes = fit_slopes(calibration_rows);

    // insertion order is kept so ties in the final sort stay deterministic
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, GroupSums> = HashMap::new();

    for row in yield_rows {
        let Some(key) = row.group_key() else {
            continue;
        };
        let sums = groups.entry(key).or_insert_with_key(|key| {
            order.push(key.clone());
            GroupSums::default()
        });
        if let Some(value) = row.number(yield_value_column) {
            sums.sum += value;
            sums.count += 1;
        }
    }

    let mut rows = Vec::new();
    let mut missing_calibration = BTreeSet::new();

    for key in order {
        let sums = &groups[&key];
        if sums.count == 0 {
            debug!(
                "No numeric '{}' values for {:?}, skipping",
                yield_value_column, key
            );
            continue;
        }
        let avg = sums.sum / sums.count as f64;

        let Some(&slope) = slopes.get(&key.ka) else {
            missing_calibration.insert(key.ka);
            continue;
        };

        let production = slope * avg * LBS_PER_ACRE_FACTOR;
        rows.push((
            key.clone(),
            ProductionRow {
                date: key.date,
                allotment: key.allotment,
                pasture: key.pasture,
                ka: key.ka,
                avg_yield_value: to_rounded_number(avg, 3),
                slope: to_rounded_number(slope, 4),
                production_lbs_per_acre: to_rounded_number(production, 2),
            },
        ));
    }

    rows.sort_by(|(a, _), (b, _)| a.presentation_cmp(b));
    let rows: Vec<ProductionRow> = rows.into_iter().map(|(_, row)| row).collect();

    if !missing_calibration.is_empty() {
        warn!(
            "No calibration for KA(s): {}",
            missing_calibration
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    info!(
        "Computed {} production rows from {} groups ({} slopes)",
        rows.len(),
        groups.len(),
        slopes.len()
    );

    ProductionReport {
        rows,
        missing_calibration,
        slopes,
    }
}
