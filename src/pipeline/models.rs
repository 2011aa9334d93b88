use serde::Serialize;
use std::cmp::Ordering;
use utoipa::ToSchema;

use crate::workbook::Record;

/// One observation from the "Comparative Yield" sheet
///
/// The normalized fields drive every derived computation; `fields` keeps the
/// complete source row so nothing from the export is lost.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldRow {
    pub date: String,
    pub allotment: String,
    pub pasture: String,
    pub ka: String,
    pub fields: Record,
}

impl YieldRow {
    /// Grouping key, or `None` for rows missing a date or unit code
    pub fn group_key(&self) -> Option<GroupKey> {
        if self.date.is_empty() || self.ka.is_empty() {
            return None;
        }
        Some(GroupKey {
            date: self.date.clone(),
            allotment: self.allotment.clone(),
            pasture: self.pasture.clone(),
            ka: self.ka.clone(),
        })
    }

    /// Finite numeric value of a source column
    pub fn number(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(|v| v.as_number())
    }
}

/// One filled line of the biomass sampling sheet
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRow {
    pub ka: String,
    pub date: String,
    pub bag_number: Option<f64>,
    pub net_weight: Option<f64>,
    pub fields: Record,
}

/// Composite key shared by the template and the production aggregation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub date: String,
    pub allotment: String,
    pub pasture: String,
    pub ka: String,
}

impl GroupKey {
    /// Presentation order: allotment, pasture, date, ka
    pub fn presentation_cmp(&self, other: &Self) -> Ordering {
        self.allotment
            .cmp(&other.allotment)
            .then_with(|| self.pasture.cmp(&other.pasture))
            .then_with(|| self.date.cmp(&other.date))
            .then_with(|| self.ka.cmp(&other.ka))
    }
}

/// Blank data-entry row for one replicate bag at one site visit
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TemplateRow {
    pub date: String,
    pub allotment: String,
    pub pasture: String,
    pub ka: String,
    pub bag_number: u32,
}

/// Production estimate for one (date, allotment, pasture, ka) group
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductionRow {
    pub date: String,
    pub allotment: String,
    pub pasture: String,
    pub ka: String,
    /// Mean yield proxy of the group, 3 decimals
    pub avg_yield_value: Option<f64>,
    /// Fitted grams per bag, 4 decimals
    pub slope: Option<f64>,
    /// 2 decimals
    pub production_lbs_per_acre: Option<f64>,
}

/// Slope table entry, used for the diagnostics export
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SlopeRow {
    pub ka: String,
    pub slope: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(date: &str, allotment: &str, pasture: &str, ka: &str) -> GroupKey {
        GroupKey {
            date: date.to_string(),
            allotment: allotment.to_string(),
            pasture: pasture.to_string(),
            ka: ka.to_string(),
        }
    }

    #[test]
    fn test_presentation_order() {
        let mut keys = vec![
            key("2024-06-01", "B", "North", "C1"),
            key("2024-06-02", "A", "South", "C1"),
            key("2024-06-02", "A", "North", "C2"),
            key("2024-06-01", "A", "North", "C9"),
            key("2024-06-01", "A", "North", "C2"),
        ];
        keys.sort_by(|a, b| a.presentation_cmp(b));

        let order: Vec<_> = keys
            .iter()
            .map(|k| format!("{}/{}/{}/{}", k.allotment, k.pasture, k.date, k.ka))
            .collect();
        assert_eq!(
            order,
            vec![
                "A/North/2024-06-01/C2",
                "A/North/2024-06-01/C9",
                "A/North/2024-06-02/C2",
                "A/South/2024-06-02/C1",
                "B/North/2024-06-01/C1",
            ]
        );
    }

    #[test]
    fn test_group_key_requires_date_and_ka() {
        let row = YieldRow {
            date: "2024-06-01".to_string(),
            allotment: "A".to_string(),
            pasture: "North".to_string(),
            ka: String::new(),
            fields: Record::new(),
        };
        assert!(row.group_key().is_none());

        let row = YieldRow {
            ka: "C3".to_string(),
            date: String::new(),
            ..row
        };
        assert!(row.group_key().is_none());
    }
}
