pub mod flat_file;
pub mod relational;

pub use flat_file::FlatFileSink;
pub use relational::{RelationalSink, StoreSession};
