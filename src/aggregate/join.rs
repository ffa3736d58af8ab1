use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::aggregate::GeoRecord;
use crate::input::Boundary;
use crate::layer::GeoFeature;
use crate::schema::GeoLevel;

const SAMPLE_IDS: usize = 5;

/// Inner join on identifier, in boundary order.
pub fn join_boundaries(
    records: &[GeoRecord],
    boundaries: &[Boundary],
    level: GeoLevel,
) -> Vec<GeoFeature> {
    let by_id: HashMap<&str, &GeoRecord> =
        records.iter().map(|r| (r.geoid.as_str(), r)).collect();

    let mut matched = HashSet::new();
    let mut out = Vec::with_capacity(records.len());
    for boundary in boundaries {
        let Some(&record) = by_id.get(boundary.geoid.as_str()) else {
            continue;
        };
        matched.insert(record.geoid.as_str());
        out.push(GeoFeature {
            record: record.clone(),
            attributes: boundary.attributes.clone(),
            geometry: boundary.geometry.clone(),
            prediction: None,
        });
    }

    let unmatched = records
        .iter()
        .filter(|r| !matched.contains(r.geoid.as_str()))
        .map(|r| r.geoid.as_str())
        .collect::<Vec<_>>();
    if !unmatched.is_empty() {
        let sample = unmatched.iter().take(SAMPLE_IDS).copied().collect::<Vec<_>>();
        warn!(
            %level,
            dropped = unmatched.len(),
            sample = ?sample,
            "aggregates without a boundary polygon dropped by join"
        );
    }
    debug!(
        %level,
        joined = out.len(),
        unused_polygons = boundaries.len().saturating_sub(out.len()),
        "joined boundaries"
    );
    out
}
