pub mod memory;
pub mod persistent;
pub mod influx;

pub use memory::MemoryStore;
pub use persistent::PersistentStore;
pub use influx::{InfluxConfig, InfluxStore};
