// Comparative Yield pipeline
//
// Survey export -> normalized yield rows -> blank sampling template, and
// filled calibration rows -> per-KA slopes -> production estimates.
// Every function here is synchronous and operates on explicit collections;
// the caller owns the `Dataset`.

pub mod calibration;
pub mod dataset;
pub mod models;
pub mod normalize;
pub mod production;
pub mod template;

pub use calibration::{fit_slopes, SlopeTable};
pub use dataset::{Dataset, IngestOutcome};
pub use models::*;
pub use normalize::{extract_unit_code, normalize_date, parse_hierarchy, to_rounded_number, Hierarchy};
pub use production::{compute_production, ProductionReport};
pub use template::build_template;

/// Sheet holding field observations in a survey export
pub const YIELD_SHEET_NAME: &str = "Comparative Yield";

/// Replicate bag numbers sampled at every site
pub const BAG_NUMBERS: [u32; 3] = [1, 3, 5];

/// Converts slope (g per bag) x average yield proxy into pounds per acre
pub const LBS_PER_ACRE_FACTOR: f64 = 55.7612;

/// Column names in the survey export
pub mod yield_columns {
    pub const DATE: &str = "Date";
    pub const ANCESTRY: &str = "Ancestry";
    pub const SITE_ID: &str = "SiteID";
    pub const DEFAULT_YIELD_VALUE: &str = "nValue";
}

/// Column names in a filled calibration sheet
pub mod calibration_columns {
    pub const KA: &str = "KA";
    pub const DATE: &str = "DATE";
    pub const BAG_NUMBER: &str = "BAG #";
    pub const NET_WEIGHT: &str = "NET WT.";
}
