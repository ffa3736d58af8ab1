#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardizer {
    pub mean: f64,
    pub scale: f64,
}

impl Standardizer {
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let finite = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        if finite.is_empty() {
            return None;
        }
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        let scale = if std < 10.0 * f64::EPSILON { 1.0 } else { std };
        Some(Self { mean, scale })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

pub fn standardize_columns(rows: &mut [Vec<f64>], columns: &[usize]) -> Vec<Option<Standardizer>> {
    columns
        .iter()
        .map(|&col| {
            let scaler = Standardizer::fit(rows.iter().map(|row| row[col]));
            if let Some(s) = scaler {
                for row in rows.iter_mut() {
                    row[col] = s.transform(row[col]);
                }
            }
            scaler
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{standardize_columns, Standardizer};
    use crate::testing::assert_close;

    #[test]
    fn scales_selected_columns_only() {
        let mut rows = vec![vec![1.0, 0.5, 10.0], vec![3.0, 0.25, 10.0]];
        let scalers = standardize_columns(&mut rows, &[0, 2]);
        assert_close(rows[0][0], -1.0);
        assert_close(rows[1][0], 1.0);
        assert_eq!(rows[0][1], 0.5);
        assert_eq!(rows[1][1], 0.25);
        assert_close(rows[0][2], 0.0);
        assert_eq!(scalers[1].map(|s| s.scale), Some(1.0));
    }

    #[test]
    fn non_finite_values_stay_undefined() {
        let mut rows = vec![vec![2.0], vec![f64::NAN], vec![4.0]];
        standardize_columns(&mut rows, &[0]);
        assert_close(rows[0][0], -1.0);
        assert!(rows[1][0].is_nan());
        assert_eq!(Standardizer::fit([f64::NAN]), None);
    }
}
