pub mod crossval;
pub mod folds;
pub mod ols;
pub mod rollup;
pub mod scale;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::weighted::ratio;
use crate::error::PipelineError;
use crate::layer::GeoFeature;
use crate::predict::crossval::cross_val_predict;
use crate::predict::scale::standardize_columns;
use crate::schema::predictor_columns;

pub use rollup::{attach_predictions, roll_up_predictions};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictorSettings {
    #[serde(default = "default_folds")]
    pub folds: usize,
    #[serde(default = "default_seed")]
    pub seed: Option<u64>,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            folds: default_folds(),
            seed: default_seed(),
        }
    }
}

fn default_folds() -> usize {
    10
}

fn default_seed() -> Option<u64> {
    Some(209)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub geoid: String,
    pub registered: u64,
    pub turnout: u64,
    pub absent: i64,
    pub turnout_pct_pred: Option<f64>,
    pub absent_pct_pred: Option<f64>,
    pub turnout_pred: Option<i64>,
    pub absent_pred: Option<i64>,
}

impl PredictionRecord {
    /// Halves round to even.
    pub fn from_model(
        geoid: String,
        registered: u64,
        turnout: u64,
        predicted_pct: Option<f64>,
    ) -> Self {
        let pct = predicted_pct.filter(|p| p.is_finite());
        let turnout_pred = pct.map(|p| (registered as f64 * p).round_ties_even() as i64);
        Self {
            geoid,
            registered,
            turnout,
            absent: registered as i64 - turnout as i64,
            turnout_pct_pred: pct,
            absent_pct_pred: pct.map(|p| 1.0 - p),
            turnout_pred,
            absent_pred: turnout_pred.map(|t| registered as i64 - t),
        }
    }

    pub fn from_counts(
        geoid: String,
        registered: u64,
        turnout: u64,
        absent: i64,
        turnout_pred: Option<i64>,
        absent_pred: Option<i64>,
    ) -> Self {
        let pct = turnout_pred
            .map(|t| ratio(t as f64, registered as f64))
            .filter(|p| p.is_finite());
        Self {
            geoid,
            registered,
            turnout,
            absent,
            turnout_pct_pred: pct,
            absent_pct_pred: pct.map(|p| 1.0 - p),
            turnout_pred,
            absent_pred,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub folds: usize,
    pub seed: Option<u64>,
    pub rows: usize,
    pub undefined_predictions: usize,
    pub rmse: Option<f64>,
    pub r_squared: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockGroupPredictions {
    pub records: Vec<PredictionRecord>,
    pub report: ModelReport,
}

/// Only total registered and mean income are standardized.
pub fn predict_block_groups(
    block_groups: &[GeoFeature],
    settings: &PredictorSettings,
) -> Result<BlockGroupPredictions, PipelineError> {
    let mut rows = block_groups
        .iter()
        .map(|f| f.record.predictors())
        .collect::<Vec<_>>();
    let last = predictor_columns().len() - 1;
    standardize_columns(&mut rows, &[0, last]);
    let targets = block_groups
        .iter()
        .map(|f| f.record.turnout_pct())
        .collect::<Vec<_>>();

    let cv = cross_val_predict(&rows, &targets, settings.folds, settings.seed)?;
    let mut fold_sizes = vec![0usize; settings.folds];
    for fold in &cv.fold_of {
        fold_sizes[*fold] += 1;
    }
    debug!(?fold_sizes, "assigned block groups to folds");
    let undefined = cv.predictions.iter().filter(|p| p.is_none()).count();
    if undefined > 0 {
        let sample = block_groups
            .iter()
            .zip(&cv.predictions)
            .filter(|(_, p)| p.is_none())
            .map(|(f, _)| f.geoid())
            .take(5)
            .collect::<Vec<_>>();
        warn!(undefined, sample = ?sample, "block groups with undefined predictors");
    }

    let records = block_groups
        .iter()
        .zip(&cv.predictions)
        .map(|(f, p)| {
            PredictionRecord::from_model(
                f.geoid().to_string(),
                f.record.reg_2020,
                f.record.voted_2020,
                *p,
            )
        })
        .collect::<Vec<_>>();

    let report = ModelReport {
        folds: settings.folds,
        seed: settings.seed,
        rows: block_groups.len(),
        undefined_predictions: undefined,
        rmse: rmse(&targets, &cv.predictions),
        r_squared: r_squared(&targets, &cv.predictions),
    };
    info!(
        rows = report.rows,
        rmse = ?report.rmse,
        r_squared = ?report.r_squared,
        "cross-validated block-group predictions"
    );

    Ok(BlockGroupPredictions {
        records,
        report,
    })
}

fn scored_pairs<'a>(
    targets: &'a [f64],
    predictions: &'a [Option<f64>],
) -> impl Iterator<Item = (f64, f64)> + 'a {
    targets
        .iter()
        .zip(predictions)
        .filter_map(|(t, p)| p.map(|p| (*t, p)))
        .filter(|(t, _)| t.is_finite())
}

pub fn rmse(targets: &[f64], predictions: &[Option<f64>]) -> Option<f64> {
    let (count, sse) = scored_pairs(targets, predictions)
        .fold((0usize, 0.0), |(n, acc), (t, p)| (n + 1, acc + (t - p).powi(2)));
    (count > 0).then(|| (sse / count as f64).sqrt())
}

pub fn r_squared(targets: &[f64], predictions: &[Option<f64>]) -> Option<f64> {
    let pairs = scored_pairs(targets, predictions).collect::<Vec<_>>();
    if pairs.is_empty() {
        return None;
    }
    let mean = pairs.iter().map(|(t, _)| t).sum::<f64>() / pairs.len() as f64;
    let ss_tot = pairs.iter().map(|(t, _)| (t - mean).powi(2)).sum::<f64>();
    let ss_res = pairs.iter().map(|(t, p)| (t - p).powi(2)).sum::<f64>();
    (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::{r_squared, rmse, PredictionRecord};
    use crate::testing::assert_close;

    #[test]
    fn derives_counts_from_predicted_share() {
        let record = PredictionRecord::from_model("250010101001".to_string(), 200, 150, Some(0.7));
        assert_eq!(record.absent, 50);
        assert_eq!(record.turnout_pred, Some(140));
        assert_eq!(record.absent_pred, Some(60));
        assert_close(record.absent_pct_pred.expect("absent pct"), 0.3);
        assert_close(record.turnout_pct_pred.expect("pct") + 0.3, 1.0);
    }

    #[test]
    fn predicted_count_rounds_half_to_even() {
        let record = PredictionRecord::from_model("250010101001".to_string(), 5, 3, Some(0.5));
        assert_eq!(record.turnout_pred, Some(2));
        assert_eq!(record.absent_pred, Some(3));
    }

    #[test]
    fn undefined_share_leaves_predicted_counts_undefined() {
        let record = PredictionRecord::from_model("250010101001".to_string(), 5, 3, Some(f64::NAN));
        assert_eq!(record.turnout_pct_pred, None);
        assert_eq!(record.turnout_pred, None);
        assert_eq!(record.absent_pred, None);
        assert_eq!(record.absent, 2);
    }

    #[test]
    fn fit_metrics_skip_undefined_predictions() {
        let targets = [0.5, 0.7, 0.9];
        let predictions = [Some(0.6), None, Some(0.8)];
        assert_close(rmse(&targets, &predictions).expect("rmse"), 0.1);
        let r2 = r_squared(&targets, &predictions).expect("r2");
        assert_close(r2, 1.0 - 0.02 / 0.08);
        assert_eq!(rmse(&targets, &[None, None, None]), None);
    }
}
