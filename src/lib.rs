pub mod aggregate;
pub mod config;
pub mod error;
pub mod input;
pub mod layer;
pub mod output;
pub mod pipeline;
pub mod predict;
pub mod schema;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;
