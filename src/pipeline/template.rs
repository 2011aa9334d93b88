/// Biomass sampling template
use std::collections::HashSet;
use tracing::debug;

use super::models::{TemplateRow, YieldRow};
use super::BAG_NUMBERS;

/// Blank data-entry rows, one per replicate bag for each distinct site visit
///
/// A site visit is the (date, allotment, pasture, ka) key of a yield row with
/// both a date and a KA. The first occurrence of a key in ingestion order
/// emits its rows; repeats are skipped. The result is sorted by allotment,
/// pasture, date and ka, with bags in ascending order inside each key.
pub fn build_template(yield_rows: &[YieldRow]) -> Vec<TemplateRow> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();

    for key in yield_rows.iter().filter_map(YieldRow::group_key) {
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }

    // stable: bag order is preserved within a key
    keys.sort_by(|a, b| a.presentation_cmp(b));

    let rows: Vec<TemplateRow> = keys
        .into_iter()
        .flat_map(|key| {
            BAG_NUMBERS.into_iter().map(move |bag_number| TemplateRow {
                date: key.date.clone(),
                allotment: key.allotment.clone(),
                pasture: key.pasture.clone(),
                ka: key.ka.clone(),
                bag_number,
            })
        })
        .collect();

    debug!(
        "Built {} template rows from {} yield rows",
        rows.len(),
        yield_rows.len()
    );
    rows
}
