use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::weighted::weighted_mean;
use crate::aggregate::{GeoRecord, GeoTotals, LevelTables};
use crate::error::PipelineError;
use crate::input::BlockRecord;
use crate::schema::{category_count, GeoLevel, BLOCK_ID_LEN, NO_BLOCK_ASSIGNMENT};

pub trait CountSource {
    fn geoid(&self) -> &str;
    fn total_reg(&self) -> u64;
    fn categories(&self) -> &[u64];
    fn voted_2020(&self) -> u64;
    fn reg_2020(&self) -> u64;
    fn income(&self) -> Option<f64>;
}

impl CountSource for BlockRecord {
    fn geoid(&self) -> &str {
        &self.geoid
    }
    fn total_reg(&self) -> u64 {
        self.total_reg
    }
    fn categories(&self) -> &[u64] {
        &self.categories
    }
    fn voted_2020(&self) -> u64 {
        self.voted_2020
    }
    fn reg_2020(&self) -> u64 {
        self.reg_2020
    }
    fn income(&self) -> Option<f64> {
        self.hh_income
    }
}

impl CountSource for GeoTotals {
    fn geoid(&self) -> &str {
        &self.geoid
    }
    fn total_reg(&self) -> u64 {
        self.total_reg
    }
    fn categories(&self) -> &[u64] {
        &self.categories
    }
    fn voted_2020(&self) -> u64 {
        self.voted_2020
    }
    fn reg_2020(&self) -> u64 {
        self.reg_2020
    }
    fn income(&self) -> Option<f64> {
        self.mean_hh_income
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFilterStats {
    pub unassigned: usize,
    pub invalid_id: usize,
    pub zero_registered: usize,
    pub kept: usize,
}

pub fn filter_blocks(blocks: Vec<BlockRecord>) -> (Vec<BlockRecord>, BlockFilterStats) {
    let mut stats = BlockFilterStats::default();
    let mut kept = Vec::with_capacity(blocks.len());
    for block in blocks {
        if block.geoid.contains(NO_BLOCK_ASSIGNMENT) {
            stats.unassigned += 1;
        } else if !is_block_id(&block.geoid) {
            stats.invalid_id += 1;
        } else if block.reg_2020 == 0 || block.total_reg == 0 {
            stats.zero_registered += 1;
        } else {
            kept.push(block);
        }
    }
    stats.kept = kept.len();
    (kept, stats)
}

fn is_block_id(geoid: &str) -> bool {
    geoid.len() == BLOCK_ID_LEN && geoid.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug)]
struct Accumulator {
    total_reg: u64,
    categories: Vec<u64>,
    voted_2020: u64,
    reg_2020: u64,
    incomes: Vec<Option<f64>>,
    weights: Vec<f64>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            total_reg: 0,
            categories: vec![0; category_count()],
            voted_2020: 0,
            reg_2020: 0,
            incomes: Vec::new(),
            weights: Vec::new(),
        }
    }

    fn add<T: CountSource>(&mut self, row: &T) {
        self.total_reg += row.total_reg();
        for (sum, count) in self.categories.iter_mut().zip(row.categories()) {
            *sum += count;
        }
        self.voted_2020 += row.voted_2020();
        self.reg_2020 += row.reg_2020();
        self.incomes.push(row.income());
        self.weights.push(row.total_reg() as f64);
    }

    fn finish(self, geoid: String) -> GeoTotals {
        GeoTotals {
            geoid,
            mean_hh_income: weighted_mean(&self.incomes, &self.weights),
            total_reg: self.total_reg,
            categories: self.categories,
            voted_2020: self.voted_2020,
            reg_2020: self.reg_2020,
        }
    }
}

/// Sorted by identifier. Income is weighted by child registered voters.
pub fn aggregate_by_prefix<T: CountSource>(rows: &[T], level: GeoLevel) -> Vec<GeoTotals> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for row in rows {
        let Some(parent) = level.parent_id(row.geoid()) else {
            warn!(geoid = row.geoid(), %level, "identifier too short for level, skipping");
            continue;
        };
        groups
            .entry(parent)
            .or_insert_with(Accumulator::new)
            .add(row);
    }
    groups
        .into_iter()
        .map(|(geoid, acc)| acc.finish(geoid.to_string()))
        .collect()
}

pub fn aggregate_levels(blocks: Vec<BlockRecord>) -> Result<LevelTables, PipelineError> {
    let (blocks, stats) = filter_blocks(blocks);
    info!(
        kept = stats.kept,
        unassigned = stats.unassigned,
        invalid_id = stats.invalid_id,
        zero_registered = stats.zero_registered,
        "filtered blocks"
    );
    if blocks.is_empty() {
        return Err(PipelineError::EmptyLevel {
            level: GeoLevel::BlockGroup,
            stage: "block filtering",
        });
    }

    let (block_groups, without_income): (Vec<_>, Vec<_>) =
        aggregate_by_prefix(&blocks, GeoLevel::BlockGroup)
            .into_iter()
            .partition(|bg| bg.mean_hh_income.is_some());
    if !without_income.is_empty() {
        warn!(
            dropped = without_income.len(),
            "dropping block groups without an income estimate"
        );
    }
    if block_groups.is_empty() {
        return Err(PipelineError::EmptyLevel {
            level: GeoLevel::BlockGroup,
            stage: "dropping groups without income",
        });
    }

    let tracts = aggregate_by_prefix(&block_groups, GeoLevel::Tract);
    let counties = aggregate_by_prefix(&block_groups, GeoLevel::County);
    info!(
        block_groups = block_groups.len(),
        tracts = tracts.len(),
        counties = counties.len(),
        "aggregated levels"
    );

    Ok(LevelTables {
        block_groups: block_groups.iter().map(GeoRecord::from_totals).collect(),
        tracts: tracts.iter().map(GeoRecord::from_totals).collect(),
        counties: counties.iter().map(GeoRecord::from_totals).collect(),
        block_filter: stats,
    })
}
