use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::layer::GeoFeature;
use crate::schema::{
    categories, ABSENT_OUT, ABSENT_PCT_OUT, ABSENT_PCT_PRED_OUT, ABSENT_PRED_OUT, MEAN_INCOME,
    REGISTERED_OUT, TOTAL_REG, TURNOUT_OUT, TURNOUT_PCT_OUT, TURNOUT_PCT_PRED_OUT,
    TURNOUT_PRED_OUT,
};

pub fn feature_properties(feature: &GeoFeature, id_field: &str) -> Map<String, Value> {
    let record = &feature.record;
    let mut props = Map::new();
    props.insert(id_field.to_string(), json!(record.geoid));
    props.insert(TOTAL_REG.to_string(), json!(record.total_reg));
    for (category, share) in categories().zip(&record.proportions) {
        props.insert(category.column.to_string(), finite(*share));
    }
    props.insert(
        MEAN_INCOME.to_string(),
        record.mean_hh_income.map(finite).unwrap_or(Value::Null),
    );
    props.insert(TURNOUT_OUT.to_string(), json!(record.voted_2020));
    props.insert(REGISTERED_OUT.to_string(), json!(record.reg_2020));
    for (key, value) in &feature.attributes {
        props.insert(key.clone(), value.clone());
    }
    props.insert(TURNOUT_PCT_OUT.to_string(), finite(record.turnout_pct()));
    props.insert(ABSENT_PCT_OUT.to_string(), finite(record.absent_pct()));

    if let Some(prediction) = &feature.prediction {
        props.insert(ABSENT_OUT.to_string(), json!(prediction.absent));
        props.insert(
            TURNOUT_PCT_PRED_OUT.to_string(),
            json!(prediction.turnout_pct_pred),
        );
        props.insert(
            ABSENT_PCT_PRED_OUT.to_string(),
            json!(prediction.absent_pct_pred),
        );
        props.insert(TURNOUT_PRED_OUT.to_string(), json!(prediction.turnout_pred));
        props.insert(ABSENT_PRED_OUT.to_string(), json!(prediction.absent_pred));
    }
    props
}

pub fn render_feature_collection(features: &[GeoFeature], id_field: &str) -> Result<String> {
    let features = features
        .iter()
        .map(|feature| {
            json!({
                "type": "Feature",
                "properties": feature_properties(feature, id_field),
                "geometry": feature.geometry,
            })
        })
        .collect::<Vec<_>>();
    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    Ok(serde_json::to_string(&collection)?)
}

fn finite(value: f64) -> Value {
    if value.is_finite() {
        json!(value)
    } else {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{feature_properties, render_feature_collection};
    use crate::aggregate::GeoRecord;
    use crate::layer::GeoFeature;
    use crate::predict::PredictionRecord;
    use crate::schema::category_count;

    fn feature(prediction: Option<PredictionRecord>) -> GeoFeature {
        let mut attributes = Map::new();
        attributes.insert("BASENAME".to_string(), json!("Unit 0"));
        attributes.insert("ALAND20".to_string(), json!(1000));
        GeoFeature {
            record: GeoRecord {
                geoid: "250010101001".to_string(),
                total_reg: 10,
                proportions: vec![0.1; category_count()],
                mean_hh_income: None,
                voted_2020: 6,
                reg_2020: 8,
            },
            attributes,
            geometry: json!({ "type": "Point", "coordinates": [0.0, 0.0] }),
            prediction,
        }
    }

    #[test]
    fn observed_layer_has_no_prediction_columns() {
        let props = feature_properties(&feature(None), "GEOID20");
        assert_eq!(props["GEOID20"], json!("250010101001"));
        assert_eq!(props["2020_turnout"], json!(6));
        assert_eq!(props["2020_registered"], json!(8));
        assert_eq!(props["2020_turnout_pct"], json!(0.75));
        assert_eq!(props["2020_absent_pct"], json!(0.25));
        assert_eq!(props["mean_hh_income"], Value::Null);
        assert_eq!(props["BASENAME"], json!("Unit 0"));
        assert!(props.contains_key("lang_unknown"));
        assert!(!props.contains_key("2020_turnout_pred"));
    }

    #[test]
    fn undefined_predictions_serialize_as_null() {
        let prediction = PredictionRecord::from_model("250010101001".to_string(), 8, 6, None);
        let rendered = render_feature_collection(&[feature(Some(prediction))], "GEOID20")
            .expect("render");
        let parsed: Value = serde_json::from_str(&rendered).expect("json");
        let props = &parsed["features"][0]["properties"];
        assert_eq!(parsed["type"], json!("FeatureCollection"));
        assert_eq!(props["2020_absent"], json!(2));
        assert_eq!(props["2020_turnout_pct_pred"], Value::Null);
        assert_eq!(props["2020_turnout_pred"], Value::Null);
        assert_eq!(parsed["features"][0]["geometry"]["type"], json!("Point"));
    }
}
