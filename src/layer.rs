use serde_json::{Map, Value};

use crate::aggregate::GeoRecord;
use crate::predict::PredictionRecord;
use crate::schema::GeoLevel;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub record: GeoRecord,
    pub attributes: Map<String, Value>,
    pub geometry: Value,
    pub prediction: Option<PredictionRecord>,
}

impl GeoFeature {
    pub fn geoid(&self) -> &str {
        &self.record.geoid
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoLayers {
    pub block_groups: Vec<GeoFeature>,
    pub tracts: Vec<GeoFeature>,
    pub counties: Vec<GeoFeature>,
}

impl GeoLayers {
    pub fn get(&self, level: GeoLevel) -> &[GeoFeature] {
        match level {
            GeoLevel::BlockGroup => &self.block_groups,
            GeoLevel::Tract => &self.tracts,
            GeoLevel::County => &self.counties,
        }
    }

    pub fn levels(&self) -> impl Iterator<Item = (GeoLevel, &[GeoFeature])> {
        GeoLevel::ALL.into_iter().map(|level| (level, self.get(level)))
    }
}
