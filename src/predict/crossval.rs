use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::predict::folds::assign_folds;
use crate::predict::ols::LinearModel;

#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidation {
    pub fold_of: Vec<usize>,
    /// Out-of-fold prediction per row; `None` where the row's predictors are undefined.
    pub predictions: Vec<Option<f64>>,
}

pub fn cross_val_predict(
    rows: &[Vec<f64>],
    targets: &[f64],
    folds: usize,
    seed: Option<u64>,
) -> Result<CrossValidation, PipelineError> {
    let fold_of = assign_folds(rows.len(), folds, seed)?;
    let usable_predictors = rows
        .iter()
        .map(|row| row.iter().all(|v| v.is_finite()))
        .collect::<Vec<_>>();
    let trainable = usable_predictors
        .iter()
        .zip(targets)
        .map(|(ok, target)| *ok && target.is_finite())
        .collect::<Vec<_>>();

    let mut predictions = vec![None; rows.len()];
    for fold in 0..folds {
        let (train_rows, train_targets): (Vec<&[f64]>, Vec<f64>) = (0..rows.len())
            .filter(|&i| fold_of[i] != fold && trainable[i])
            .map(|i| (rows[i].as_slice(), targets[i]))
            .unzip();
        if train_rows.is_empty() {
            warn!(fold, "no training rows with defined predictors, fold left unpredicted");
            continue;
        }
        let model = LinearModel::fit(&train_rows, &train_targets)?;

        let mut held_out = 0;
        for i in (0..rows.len()).filter(|&i| fold_of[i] == fold) {
            held_out += 1;
            if usable_predictors[i] {
                predictions[i] = Some(model.predict(&rows[i]));
            }
        }
        debug!(
            fold,
            train = train_rows.len(),
            held_out,
            intercept = model.intercept,
            "fitted fold"
        );
    }

    Ok(CrossValidation {
        fold_of,
        predictions,
    })
}
