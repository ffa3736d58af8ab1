use anyhow::Result;
use serde::Serialize;

use crate::summary::RunSummary;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render_summary_json(summary: &RunSummary) -> Result<String> {
    render_json(summary)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::Value;

    use super::render_summary_json;
    use crate::aggregate::BlockFilterStats;
    use crate::predict::ModelReport;
    use crate::summary::RunSummary;

    #[test]
    fn model_metrics_without_scored_rows_are_null() {
        let summary = RunSummary {
            generated_at: Utc::now(),
            block_filter: BlockFilterStats {
                kept: 3,
                ..BlockFilterStats::default()
            },
            levels: Vec::new(),
            model: Some(ModelReport {
                folds: 10,
                seed: Some(209),
                rows: 3,
                undefined_predictions: 3,
                rmse: None,
                r_squared: None,
            }),
        };
        let parsed: Value =
            serde_json::from_str(&render_summary_json(&summary).expect("render")).expect("json");
        assert_eq!(parsed["block_filter"]["kept"], 3);
        assert_eq!(parsed["model"]["seed"], 209);
        assert!(parsed["model"]["rmse"].is_null());
        assert!(parsed["generated_at"].is_string());
    }
}
