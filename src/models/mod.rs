pub mod batch;
pub mod payload;

pub use batch::{Batch, IntSequence, SortedBatch};
pub use payload::{SortRequest, SortResponse};
