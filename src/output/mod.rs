pub mod csv;
pub mod geojson;
pub mod json;
pub mod table;
