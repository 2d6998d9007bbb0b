pub mod memory;
pub mod schema;
pub mod sync;

pub use memory::{MemoryStateStore, StoreSnapshot};
pub use schema::{classify, parse_value, Classification, ParsedValue};
pub use sync::{DocumentShape, StateSynchronizer, SyncReport};
