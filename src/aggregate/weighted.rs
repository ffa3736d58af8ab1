/// `None` when no positive weight remains; missing values drop their weight too.
pub fn weighted_mean(values: &[Option<f64>], weights: &[f64]) -> Option<f64> {
    debug_assert_eq!(values.len(), weights.len());
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (value, weight) in values.iter().zip(weights) {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            continue;
        };
        weighted_sum += v * weight;
        weight_total += weight;
    }
    if weight_total > 0.0 {
        Some(weighted_sum / weight_total)
    } else {
        None
    }
}

pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::{ratio, weighted_mean};
    use crate::testing::assert_close;

    #[test]
    fn weights_present_values_only() {
        let mean = weighted_mean(&[Some(10.0), None, Some(40.0)], &[3.0, 100.0, 1.0])
            .expect("defined mean");
        assert_close(mean, (10.0 * 3.0 + 40.0) / 4.0);
    }

    #[test]
    fn missing_when_no_weight_remains() {
        assert_eq!(weighted_mean(&[None, None], &[5.0, 2.0]), None);
        assert_eq!(weighted_mean(&[Some(1.0)], &[0.0]), None);
        assert_eq!(weighted_mean(&[], &[]), None);
        assert_eq!(weighted_mean(&[Some(f64::NAN)], &[1.0]), None);
    }

    #[test]
    fn ratio_is_nan_on_zero_denominator() {
        assert!(ratio(3.0, 0.0).is_nan());
        assert_close(ratio(3.0, 4.0), 0.75);
    }
}
