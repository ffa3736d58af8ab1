use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::layer::GeoFeature;
use crate::predict::PredictionRecord;
use crate::schema::GeoLevel;

#[derive(Debug, Default)]
struct CountSums {
    registered: u64,
    turnout: u64,
    absent: i64,
    turnout_pred: Option<i64>,
    absent_pred: Option<i64>,
}

/// Sums counts; a parent with any undefined prediction is undefined.
pub fn roll_up_predictions(records: &[PredictionRecord], level: GeoLevel) -> Vec<PredictionRecord> {
    let mut groups: BTreeMap<&str, CountSums> = BTreeMap::new();
    for record in records {
        let Some(parent) = level.parent_id(&record.geoid) else {
            continue;
        };
        let sums = groups.entry(parent).or_insert_with(|| CountSums {
            turnout_pred: Some(0),
            absent_pred: Some(0),
            ..CountSums::default()
        });
        sums.registered += record.registered;
        sums.turnout += record.turnout;
        sums.absent += record.absent;
        sums.turnout_pred = sums.turnout_pred.zip(record.turnout_pred).map(|(a, b)| a + b);
        sums.absent_pred = sums.absent_pred.zip(record.absent_pred).map(|(a, b)| a + b);
    }
    groups
        .into_iter()
        .map(|(geoid, sums)| {
            PredictionRecord::from_counts(
                geoid.to_string(),
                sums.registered,
                sums.turnout,
                sums.absent,
                sums.turnout_pred,
                sums.absent_pred,
            )
        })
        .collect()
}

pub fn attach_predictions(
    features: &[GeoFeature],
    predictions: &[PredictionRecord],
    level: GeoLevel,
) -> Vec<GeoFeature> {
    let by_id: HashMap<&str, &PredictionRecord> =
        predictions.iter().map(|p| (p.geoid.as_str(), p)).collect();
    let mut out = Vec::with_capacity(features.len());
    let mut mismatched = 0usize;
    for feature in features {
        let Some(&prediction) = by_id.get(feature.geoid()) else {
            continue;
        };
        if prediction.registered != feature.record.reg_2020 {
            mismatched += 1;
        }
        let mut joined = feature.clone();
        joined.prediction = Some(prediction.clone());
        out.push(joined);
    }
    if out.len() < features.len() {
        warn!(
            %level,
            dropped = features.len() - out.len(),
            "features without predictions dropped by join"
        );
    }
    if mismatched > 0 {
        warn!(
            %level,
            mismatched,
            "predicted registration totals differ from observed totals; some block groups lack polygons"
        );
    }
    out
}
