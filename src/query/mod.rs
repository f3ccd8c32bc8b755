pub mod batch;
pub mod key;

pub use batch::{QueryBatch, QueryBatchRunner, QueryResults};
pub use key::Query;
