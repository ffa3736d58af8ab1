pub mod archive;
pub mod blocks;
pub mod boundaries;

pub use blocks::{load_block_table, BlockRecord};
pub use boundaries::{load_boundaries, Boundary, BoundaryFields};
