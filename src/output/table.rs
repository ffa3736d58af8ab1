use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::predict::ModelReport;
use crate::summary::RunSummary;

pub fn render_levels_table(summary: &RunSummary) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Level",
        "Units",
        "Total Reg",
        "2020 Registered",
        "2020 Turnout",
        "Turnout %",
        "Predicted %",
    ]);

    for level in &summary.levels {
        let predicted_cell = match (level.turnout_pct, level.predicted_turnout_pct) {
            (Some(observed), Some(predicted)) => {
                let cell = Cell::new(pct(Some(predicted)));
                if (predicted - observed).abs() > 0.05 {
                    cell.fg(Color::Yellow)
                } else {
                    cell.fg(Color::Green)
                }
            }
            (_, predicted) => Cell::new(pct(predicted)),
        };
        table.add_row(Row::from(vec![
            Cell::new(level.level.to_string()),
            Cell::new(level.rows),
            Cell::new(level.total_reg),
            Cell::new(level.registered_2020),
            Cell::new(level.turnout_2020),
            Cell::new(pct(level.turnout_pct)),
            predicted_cell,
        ]));
    }
    table.to_string()
}

pub fn render_model_table(report: &ModelReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Folds",
        "Seed",
        "Rows",
        "Undefined",
        "RMSE",
        "R²",
    ]);
    let undefined = if report.undefined_predictions > 0 {
        Cell::new(report.undefined_predictions).fg(Color::Red)
    } else {
        Cell::new(report.undefined_predictions)
    };
    table.add_row(Row::from(vec![
        Cell::new(report.folds),
        Cell::new(
            report
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        Cell::new(report.rows),
        undefined,
        Cell::new(metric(report.rmse)),
        Cell::new(metric(report.r_squared)),
    ]));
    table.to_string()
}

pub fn render_summary_table(summary: &RunSummary) -> String {
    let filter = &summary.block_filter;
    let mut out = format!(
        "Run at {}\nBlocks kept: {} (unassigned {}, invalid id {}, zero registered {})\n{}",
        summary.generated_at.to_rfc3339(),
        filter.kept,
        filter.unassigned,
        filter.invalid_id,
        filter.zero_registered,
        render_levels_table(summary),
    );
    if let Some(model) = &summary.model {
        out.push('\n');
        out.push_str(&render_model_table(model));
    }
    out
}

fn pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

fn metric(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "-".to_string())
}
