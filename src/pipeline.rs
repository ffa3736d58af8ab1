use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::aggregate::{aggregate_levels, join_boundaries, BlockFilterStats};
use crate::config::Config;
use crate::error::PipelineError;
use crate::input::{load_block_table, load_boundaries, BlockRecord, Boundary};
use crate::layer::GeoLayers;
use crate::output::geojson::render_feature_collection;
use crate::predict::{
    attach_predictions, predict_block_groups, roll_up_predictions, ModelReport,
    PredictorSettings,
};
use crate::schema::GeoLevel;

#[derive(Debug, Clone, Default)]
pub struct BoundarySet {
    pub block_groups: Vec<Boundary>,
    pub tracts: Vec<Boundary>,
    pub counties: Vec<Boundary>,
}

impl BoundarySet {
    pub fn get(&self, level: GeoLevel) -> &[Boundary] {
        match level {
            GeoLevel::BlockGroup => &self.block_groups,
            GeoLevel::Tract => &self.tracts,
            GeoLevel::County => &self.counties,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub blocks: Vec<BlockRecord>,
    pub boundaries: BoundarySet,
}

#[derive(Debug, Clone)]
pub struct AggregationRun {
    pub layers: GeoLayers,
    pub block_filter: BlockFilterStats,
}

#[derive(Debug, Clone)]
pub struct PredictionRun {
    pub layers: GeoLayers,
    pub report: ModelReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOutput {
    pub file_name: String,
    pub contents: String,
}

pub fn load_inputs(config: &Config) -> Result<PipelineInputs> {
    let entry = Some(config.inputs.block_entry.as_str()).filter(|e| !e.is_empty());
    let blocks = load_block_table(&config.block_archive_path(), entry)?;
    let load = |level: GeoLevel| {
        load_boundaries(&config.inputs.boundary_path(level), &config.boundaries)
    };
    Ok(PipelineInputs {
        blocks,
        boundaries: BoundarySet {
            block_groups: load(GeoLevel::BlockGroup)?,
            tracts: load(GeoLevel::Tract)?,
            counties: load(GeoLevel::County)?,
        },
    })
}

pub fn run_aggregation(inputs: PipelineInputs) -> Result<AggregationRun> {
    let tables = aggregate_levels(inputs.blocks)?;
    let mut layers = GeoLayers::default();
    for level in GeoLevel::ALL {
        let joined = join_boundaries(tables.get(level), inputs.boundaries.get(level), level);
        if joined.is_empty() {
            return Err(PipelineError::EmptyLevel {
                level,
                stage: "boundary join",
            }
            .into());
        }
        info!(%level, features = joined.len(), "joined level to boundaries");
        match level {
            GeoLevel::BlockGroup => layers.block_groups = joined,
            GeoLevel::Tract => layers.tracts = joined,
            GeoLevel::County => layers.counties = joined,
        }
    }
    Ok(AggregationRun {
        layers,
        block_filter: tables.block_filter,
    })
}

pub fn run_prediction(layers: &GeoLayers, settings: &PredictorSettings) -> Result<PredictionRun> {
    let predicted = predict_block_groups(&layers.block_groups, settings)?;
    let tracts = roll_up_predictions(&predicted.records, GeoLevel::Tract);
    let counties = roll_up_predictions(&predicted.records, GeoLevel::County);

    let layers = GeoLayers {
        block_groups: attach_predictions(
            &layers.block_groups,
            &predicted.records,
            GeoLevel::BlockGroup,
        ),
        tracts: attach_predictions(&layers.tracts, &tracts, GeoLevel::Tract),
        counties: attach_predictions(&layers.counties, &counties, GeoLevel::County),
    };
    for (level, features) in layers.levels() {
        if features.is_empty() {
            return Err(PipelineError::EmptyLevel {
                level,
                stage: "prediction join",
            }
            .into());
        }
    }
    Ok(PredictionRun {
        layers,
        report: predicted.report,
    })
}

pub fn render_outputs(
    observed: &GeoLayers,
    predicted: Option<&GeoLayers>,
    id_field: &str,
) -> Result<Vec<RenderedOutput>> {
    let mut out = Vec::new();
    for (level, features) in observed.levels() {
        out.push(RenderedOutput {
            file_name: format!("{}.geojson", level.file_stem()),
            contents: render_feature_collection(features, id_field)?,
        });
    }
    if let Some(predicted) = predicted {
        for (level, features) in predicted.levels() {
            out.push(RenderedOutput {
                file_name: format!("{}_pred.geojson", level.file_stem()),
                contents: render_feature_collection(features, id_field)?,
            });
        }
    }
    Ok(out)
}

pub fn write_outputs(dir: &Path, outputs: &[RenderedOutput]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed creating output directory: {}", dir.display()))?;
    let mut written = Vec::with_capacity(outputs.len());
    for output in outputs {
        let path = dir.join(&output.file_name);
        fs::write(&path, &output.contents)
            .with_context(|| format!("failed writing output: {}", path.display()))?;
        info!(path = %path.display(), bytes = output.contents.len(), "wrote output");
        written.push(path);
    }
    Ok(written)
}
