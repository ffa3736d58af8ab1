use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::input::BoundaryFields;
use crate::predict::PredictorSettings;
use crate::schema::GeoLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub boundaries: BoundaryFields,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub predictor: PredictorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    #[serde(default = "default_block_archive")]
    pub block_archive: String,
    #[serde(default = "default_block_entry")]
    pub block_entry: String,
    #[serde(default = "default_block_groups")]
    pub block_groups: String,
    #[serde(default = "default_tracts")]
    pub tracts: String,
    #[serde(default = "default_counties")]
    pub counties: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub out_dir: Option<String>,
    pub folds: Option<usize>,
    pub seed: Option<u64>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/turnout-atlas/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.out_dir {
            self.outputs.dir = dir;
        }
        if let Some(folds) = overrides.folds {
            self.predictor.folds = folds;
        }
        if let Some(seed) = overrides.seed {
            self.predictor.seed = Some(seed);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.predictor.folds < 2 {
            bail!(
                "predictor.folds must be at least 2, got {}",
                self.predictor.folds
            );
        }
        if self.boundaries.id_field.trim().is_empty() {
            bail!("boundaries.id_field must not be empty");
        }
        Ok(())
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn block_archive_path(&self) -> PathBuf {
        expand_tilde(&self.inputs.block_archive)
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_tilde(&self.outputs.dir)
    }

    pub fn default_template() -> String {
        let template = r#"[inputs]
block_archive = "data/MA_l2_2022stats_2020block.zip"
block_entry = "MA_l2_2022stats_2020block.csv"
block_groups = "data/ma_pl2020_bg.geojson"
tracts = "data/ma_pl2020_t.geojson"
counties = "data/ma_pl2020_cnty.geojson"

[boundaries]
id_field = "GEOID20"
name_field = "BASENAME"
area_field = "ALAND20"

[outputs]
dir = "data"

[predictor]
folds = 10
seed = 209
"#;
        template.to_string()
    }
}

impl InputsConfig {
    pub fn boundary_path(&self, level: GeoLevel) -> PathBuf {
        let raw = match level {
            GeoLevel::BlockGroup => &self.block_groups,
            GeoLevel::Tract => &self.tracts,
            GeoLevel::County => &self.counties,
        };
        expand_tilde(raw)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: InputsConfig::default(),
            boundaries: BoundaryFields::default(),
            outputs: OutputsConfig::default(),
            predictor: PredictorSettings::default(),
        }
    }
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            block_archive: default_block_archive(),
            block_entry: default_block_entry(),
            block_groups: default_block_groups(),
            tracts: default_tracts(),
            counties: default_counties(),
        }
    }
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_block_archive() -> String {
    "data/MA_l2_2022stats_2020block.zip".to_string()
}

fn default_block_entry() -> String {
    "MA_l2_2022stats_2020block.csv".to_string()
}

fn default_block_groups() -> String {
    "data/ma_pl2020_bg.geojson".to_string()
}

fn default_tracts() -> String {
    "data/ma_pl2020_t.geojson".to_string()
}

fn default_counties() -> String {
    "data/ma_pl2020_cnty.geojson".to_string()
}

fn default_output_dir() -> String {
    "data".to_string()
}
