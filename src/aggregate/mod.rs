pub mod join;
pub mod rollup;
pub mod weighted;

use crate::aggregate::weighted::ratio;
use crate::schema::GeoLevel;

pub use join::join_boundaries;
pub use rollup::{aggregate_levels, filter_blocks, BlockFilterStats};
pub use weighted::weighted_mean;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoTotals {
    pub geoid: String,
    pub total_reg: u64,
    pub categories: Vec<u64>,
    pub voted_2020: u64,
    pub reg_2020: u64,
    pub mean_hh_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecord {
    pub geoid: String,
    pub total_reg: u64,
    pub proportions: Vec<f64>,
    pub mean_hh_income: Option<f64>,
    pub voted_2020: u64,
    pub reg_2020: u64,
}

impl GeoRecord {
    pub fn from_totals(totals: &GeoTotals) -> Self {
        let denominator = totals.total_reg as f64;
        Self {
            geoid: totals.geoid.clone(),
            total_reg: totals.total_reg,
            proportions: totals
                .categories
                .iter()
                .map(|count| ratio(*count as f64, denominator))
                .collect(),
            mean_hh_income: totals.mean_hh_income,
            voted_2020: totals.voted_2020,
            reg_2020: totals.reg_2020,
        }
    }

    pub fn turnout_pct(&self) -> f64 {
        ratio(self.voted_2020 as f64, self.reg_2020 as f64)
    }

    pub fn absent_pct(&self) -> f64 {
        1.0 - self.turnout_pct()
    }

    /// A missing income is carried as NaN.
    pub fn predictors(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.proportions.len() + 2);
        row.push(self.total_reg as f64);
        row.extend(&self.proportions);
        row.push(self.mean_hh_income.unwrap_or(f64::NAN));
        row
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelTables {
    pub block_groups: Vec<GeoRecord>,
    pub tracts: Vec<GeoRecord>,
    pub counties: Vec<GeoRecord>,
    pub block_filter: BlockFilterStats,
}

impl LevelTables {
    pub fn get(&self, level: GeoLevel) -> &[GeoRecord] {
        match level {
            GeoLevel::BlockGroup => &self.block_groups,
            GeoLevel::Tract => &self.tracts,
            GeoLevel::County => &self.counties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoRecord, GeoTotals};
    use crate::testing::assert_close;

    #[test]
    fn proportions_divide_by_registered_voters() {
        let totals = GeoTotals {
            geoid: "250010101001".to_string(),
            total_reg: 8,
            categories: vec![2, 6],
            voted_2020: 3,
            reg_2020: 4,
            mean_hh_income: Some(1.0),
        };
        let record = GeoRecord::from_totals(&totals);
        assert_close(record.proportions[0], 0.25);
        assert_close(record.proportions[1], 0.75);
        assert_close(record.turnout_pct(), 0.75);
        assert_eq!(record.turnout_pct() + record.absent_pct(), 1.0);
        assert_eq!(record.predictors(), vec![8.0, 0.25, 0.75, 1.0]);
    }

    #[test]
    fn zero_registration_yields_undefined_shares() {
        let totals = GeoTotals {
            geoid: "25001".to_string(),
            total_reg: 0,
            categories: vec![0],
            voted_2020: 0,
            reg_2020: 0,
            mean_hh_income: None,
        };
        let record = GeoRecord::from_totals(&totals);
        assert!(record.proportions[0].is_nan());
        assert!(record.turnout_pct().is_nan());
        assert!(record.predictors()[2].is_nan());
    }
}
