use nalgebra::{DMatrix, DVector};

use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    /// Rank-deficient designs get the minimum-norm solution.
    pub fn fit(rows: &[&[f64]], targets: &[f64]) -> Result<Self, PipelineError> {
        let n = rows.len();
        if n == 0 || n != targets.len() {
            return Err(PipelineError::Solve(format!(
                "{n} design rows for {} targets",
                targets.len()
            )));
        }
        let p = rows[0].len();

        let mut x_mean = vec![0.0; p];
        for row in rows {
            for (m, v) in x_mean.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        for m in &mut x_mean {
            *m /= n as f64;
        }
        let y_mean = targets.iter().sum::<f64>() / n as f64;

        let x = DMatrix::from_fn(n, p, |i, j| rows[i][j] - x_mean[j]);
        let y = DVector::from_iterator(n, targets.iter().map(|t| t - y_mean));
        let svd = x.svd(true, true);
        let eps = svd.singular_values.max() * n.max(p) as f64 * f64::EPSILON;
        let beta = svd
            .solve(&y, eps)
            .map_err(|e| PipelineError::Solve(e.to_string()))?;

        let coefficients = beta.iter().copied().collect::<Vec<_>>();
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(c, m)| c * m)
                .sum::<f64>();
        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::LinearModel;
    use crate::testing::assert_close;

    #[test]
    fn recovers_exact_linear_relationship() {
        let data = [[1.0, 2.0], [2.0, 0.0], [3.0, 5.0], [4.0, 1.0], [0.5, 3.0]];
        let rows = data.iter().map(|r| r.as_slice()).collect::<Vec<_>>();
        let targets = data
            .iter()
            .map(|r| 0.5 + 2.0 * r[0] - 0.25 * r[1])
            .collect::<Vec<_>>();
        let model = LinearModel::fit(&rows, &targets).expect("fit");
        assert_close(model.intercept, 0.5);
        assert_close(model.coefficients[0], 2.0);
        assert_close(model.coefficients[1], -0.25);
        assert_close(model.predict(&[10.0, 4.0]), 19.5);
    }

    #[test]
    fn collinear_shares_still_predict_consistently() {
        // The two shares always sum to 1, which makes the design rank deficient.
        let data = [[0.2, 0.8, 1.0], [0.5, 0.5, 2.0], [0.9, 0.1, 0.0], [0.4, 0.6, 3.0]];
        let rows = data.iter().map(|r| r.as_slice()).collect::<Vec<_>>();
        let targets = data
            .iter()
            .map(|r| 0.3 + 0.4 * r[0] + 0.1 * r[2])
            .collect::<Vec<_>>();
        let model = LinearModel::fit(&rows, &targets).expect("fit");
        for (row, target) in data.iter().zip(&targets) {
            assert_close(model.predict(row), *target);
        }
        assert_close(model.predict(&[0.7, 0.3, 1.5]), 0.3 + 0.28 + 0.15);
    }

    #[test]
    fn empty_design_is_rejected() {
        assert!(LinearModel::fit(&[], &[]).is_err());
    }
}
