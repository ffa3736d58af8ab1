use anyhow::Result;

use crate::summary::RunSummary;

pub fn summary_to_csv(summary: &RunSummary) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "level",
        "units",
        "total_reg",
        "registered_2020",
        "turnout_2020",
        "turnout_pct",
        "predicted_turnout_pct",
        "generated_at",
    ])?;
    let generated_at = summary.generated_at.to_rfc3339();
    for level in &summary.levels {
        writer.write_record([
            level.level.as_slug().to_string(),
            level.rows.to_string(),
            level.total_reg.to_string(),
            level.registered_2020.to_string(),
            level.turnout_2020.to_string(),
            level
                .turnout_pct
                .map(|p| format!("{p:.6}"))
                .unwrap_or_default(),
            level
                .predicted_turnout_pct
                .map(|p| format!("{p:.6}"))
                .unwrap_or_default(),
            generated_at.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::summary_to_csv;
    use crate::aggregate::BlockFilterStats;
    use crate::schema::GeoLevel;
    use crate::summary::{LevelSummary, RunSummary};

    #[test]
    fn one_row_per_level_with_blank_undefined_shares() {
        let summary = RunSummary {
            generated_at: Utc::now(),
            block_filter: BlockFilterStats::default(),
            levels: vec![
                LevelSummary {
                    level: GeoLevel::BlockGroup,
                    rows: 2,
                    total_reg: 20,
                    registered_2020: 20,
                    turnout_2020: 15,
                    turnout_pct: Some(0.75),
                    predicted_turnout_pct: None,
                },
                LevelSummary {
                    level: GeoLevel::County,
                    rows: 1,
                    total_reg: 20,
                    registered_2020: 20,
                    turnout_2020: 15,
                    turnout_pct: Some(0.75),
                    predicted_turnout_pct: Some(0.7),
                },
            ],
            model: None,
        };
        let rendered = summary_to_csv(&summary).expect("csv");
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("level,units,total_reg"));
        assert!(lines[1].starts_with("block_group,2,20,20,15,0.750000,,"));
        assert!(lines[2].starts_with("county,1,20,20,15,0.750000,0.700000,"));
    }
}
