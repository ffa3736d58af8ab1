
use serde_json::json;

use crate::input::blocks::BlockRecord;
use crate::schema::{
    categories, category_count, BLOCK_ID_COLUMN, INCOME_SOURCE, REG_2020, TOTAL_REG, VOTED_2020,
};

pub fn block(geoid: &str, total_reg: u64, voted: u64, reg: u64, income: Option<f64>) -> BlockRecord {
    let mut counts = vec![0; category_count()];
    let first = total_reg / 2;
    for (_, span) in crate::schema::group_spans() {
        counts[span.start] = first;
        counts[span.start + 1] = total_reg - first;
    }
    BlockRecord {
        geoid: geoid.to_string(),
        total_reg,
        categories: counts,
        voted_2020: voted,
        reg_2020: reg,
        hh_income: income,
    }
}

pub fn block_csv(blocks: &[BlockRecord]) -> String {
    let mut header = vec![BLOCK_ID_COLUMN, TOTAL_REG];
    header.extend(categories().map(|c| c.source_column()));
    header.extend([VOTED_2020, REG_2020, INCOME_SOURCE]);
    let mut out = header.join(",");
    out.push('\n');
    for b in blocks {
        let mut fields = vec![b.geoid.clone(), b.total_reg.to_string()];
        fields.extend(b.categories.iter().map(|c| c.to_string()));
        fields.push(b.voted_2020.to_string());
        fields.push(b.reg_2020.to_string());
        fields.push(b.hh_income.map(|v| v.to_string()).unwrap_or_default());
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

pub fn boundary_collection(ids: &[&str]) -> String {
    let features = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let x = i as f64;
            json!({
                "type": "Feature",
                "properties": {
                    "GEOID20": id,
                    "BASENAME": format!("Unit {i}"),
                    "ALAND20": 1000 + i,
                    "MTFCC20": "G5030"
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]]
                }
            })
        })
        .collect::<Vec<_>>();
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
