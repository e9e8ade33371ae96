pub mod errors;
pub mod point;
pub mod store;


pub use errors::{Result, StoreError, BenchError, BenchResult};
pub use point::{FieldValue, Point, Record};
pub use store::TimeSeriesStore;
