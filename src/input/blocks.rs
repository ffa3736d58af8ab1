use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use crate::error::PipelineError;
use crate::input::archive::{is_zip, read_archive_entry};
use crate::schema::{
    categories, BLOCK_ID_COLUMN, INCOME_SOURCE, REG_2020, TOTAL_REG, VOTED_2020,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BlockRecord {
    pub geoid: String,
    pub total_reg: u64,
    pub categories: Vec<u64>,
    pub voted_2020: u64,
    pub reg_2020: u64,
    pub hh_income: Option<f64>,
}

pub fn load_block_table(path: &Path, entry: Option<&str>) -> Result<Vec<BlockRecord>> {
    let blocks = if is_zip(path) {
        let (name, data) = read_archive_entry(path, entry, &["csv"])?;
        read_block_table(data.as_slice())
            .with_context(|| format!("failed parsing {name} in {}", path.display()))?
    } else {
        let file = File::open(path)
            .with_context(|| format!("failed opening block table: {}", path.display()))?;
        read_block_table(file)
            .with_context(|| format!("failed parsing block table: {}", path.display()))?
    };
    info!(rows = blocks.len(), path = %path.display(), "loaded block table");
    Ok(blocks)
}

pub fn read_block_table<R: Read>(reader: R) -> Result<Vec<BlockRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut out = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        out.push(columns.parse_row(&record, idx + 1)?);
    }
    Ok(out)
}

#[derive(Debug)]
struct ColumnIndex {
    id: usize,
    total_reg: usize,
    categories: Vec<(usize, &'static str)>,
    voted: usize,
    reg: usize,
    income: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, PipelineError> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (idx, raw) in headers.iter().enumerate() {
            positions.entry(canonical_name(raw.trim())).or_insert(idx);
        }
        let find = |name: &str| {
            positions
                .get(name)
                .copied()
                .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
        };

        let mut category_columns = Vec::new();
        for category in categories() {
            category_columns.push((find(category.column)?, category.column));
        }
        Ok(Self {
            id: find(BLOCK_ID_COLUMN)?,
            total_reg: find(TOTAL_REG)?,
            categories: category_columns,
            voted: find(VOTED_2020)?,
            reg: find(REG_2020)?,
            income: find(INCOME_SOURCE)?,
        })
    }

    fn parse_row(&self, record: &StringRecord, row: usize) -> Result<BlockRecord, PipelineError> {
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let mut counts = Vec::with_capacity(self.categories.len());
        for (idx, column) in &self.categories {
            counts.push(parse_count(field(*idx), column, row)?);
        }
        Ok(BlockRecord {
            geoid: field(self.id).trim().to_string(),
            total_reg: parse_count(field(self.total_reg), TOTAL_REG, row)?,
            categories: counts,
            voted_2020: parse_count(field(self.voted), VOTED_2020, row)?,
            reg_2020: parse_count(field(self.reg), REG_2020, row)?,
            hh_income: parse_income(field(self.income), row)?,
        })
    }
}

fn canonical_name(raw: &str) -> &str {
    categories()
        .find(|c| c.source == Some(raw))
        .map(|c| c.column)
        .unwrap_or(raw)
}

// Blank cells count as zero.
fn parse_count(raw: &str, column: &str, row: usize) -> Result<u64, PipelineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(v) = trimmed.parse::<u64>() {
        return Ok(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
        _ => Err(PipelineError::InvalidNumber {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        }),
    }
}

fn parse_income(raw: &str, row: usize) -> Result<Option<f64>, PipelineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("na")
    {
        return Ok(None);
    }
    let sanitized = trimmed.replace(['$', ','], "");
    match sanitized.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(PipelineError::InvalidNumber {
            column: INCOME_SOURCE.to_string(),
            row,
            value: raw.to_string(),
        }),
    }
}
