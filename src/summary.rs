use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::weighted::ratio;
use crate::aggregate::BlockFilterStats;
use crate::layer::{GeoFeature, GeoLayers};
use crate::predict::ModelReport;
use crate::schema::GeoLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: GeoLevel,
    pub rows: usize,
    pub total_reg: u64,
    pub registered_2020: u64,
    pub turnout_2020: u64,
    pub turnout_pct: Option<f64>,
    pub predicted_turnout_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub block_filter: BlockFilterStats,
    pub levels: Vec<LevelSummary>,
    pub model: Option<ModelReport>,
}

impl LevelSummary {
    pub fn from_features(level: GeoLevel, features: &[GeoFeature]) -> Self {
        let total_reg = features.iter().map(|f| f.record.total_reg).sum();
        let registered_2020: u64 = features.iter().map(|f| f.record.reg_2020).sum();
        let turnout_2020: u64 = features.iter().map(|f| f.record.voted_2020).sum();

        let predicted = features
            .iter()
            .map(|f| f.prediction.as_ref().and_then(|p| p.turnout_pred.map(|t| (p.registered, t))))
            .collect::<Option<Vec<_>>>()
            .filter(|pairs| !pairs.is_empty());
        let predicted_turnout_pct = predicted.and_then(|pairs| {
            let registered: u64 = pairs.iter().map(|(r, _)| r).sum();
            let turnout: i64 = pairs.iter().map(|(_, t)| t).sum();
            defined(ratio(turnout as f64, registered as f64))
        });

        Self {
            level,
            rows: features.len(),
            total_reg,
            registered_2020,
            turnout_2020,
            turnout_pct: defined(ratio(turnout_2020 as f64, registered_2020 as f64)),
            predicted_turnout_pct,
        }
    }
}

pub fn summarize(
    layers: &GeoLayers,
    block_filter: BlockFilterStats,
    model: Option<ModelReport>,
) -> RunSummary {
    RunSummary {
        generated_at: Utc::now(),
        block_filter,
        levels: layers
            .levels()
            .map(|(level, features)| LevelSummary::from_features(level, features))
            .collect(),
        model,
    }
}

fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use super::LevelSummary;
    use crate::aggregate::GeoRecord;
    use crate::layer::GeoFeature;
    use crate::predict::PredictionRecord;
    use crate::schema::GeoLevel;

    fn feature(geoid: &str, reg: u64, voted: u64, pct: Option<Option<f64>>) -> GeoFeature {
        GeoFeature {
            record: GeoRecord {
                geoid: geoid.to_string(),
                total_reg: reg,
                proportions: Vec::new(),
                mean_hh_income: Some(1.0),
                voted_2020: voted,
                reg_2020: reg,
            },
            attributes: Map::new(),
            geometry: json!(null),
            prediction: pct.map(|p| PredictionRecord::from_model(geoid.to_string(), reg, voted, p)),
        }
    }

    #[test]
    fn level_shares_come_from_summed_counts() {
        let features = vec![
            feature("250010101001", 1000, 800, Some(Some(0.8))),
            feature("250010101002", 10, 2, Some(Some(0.2))),
        ];
        let summary = LevelSummary::from_features(GeoLevel::BlockGroup, &features);
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.registered_2020, 1010);
        assert_eq!(summary.turnout_pct, Some(802.0 / 1010.0));
        assert_eq!(summary.predicted_turnout_pct, Some(802.0 / 1010.0));
    }

    #[test]
    fn predicted_share_needs_every_row_defined() {
        let features = vec![
            feature("250010101001", 100, 50, Some(Some(0.5))),
            feature("250010101002", 100, 50, Some(None)),
        ];
        let summary = LevelSummary::from_features(GeoLevel::BlockGroup, &features);
        assert_eq!(summary.predicted_turnout_pct, None);

        let observed_only = vec![feature("250010101001", 100, 50, None)];
        let summary = LevelSummary::from_features(GeoLevel::BlockGroup, &observed_only);
        assert_eq!(summary.turnout_pct, Some(0.5));
        assert_eq!(summary.predicted_turnout_pct, None);
    }
}
