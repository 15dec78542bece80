//! Storage abstraction for wardflow record collections.
//!
//! Two logical collections (beds, patients) live behind the [`RecordStore`]
//! trait. Every mutating write is a compare-and-set against the version the
//! caller read, so concurrent writers against the same record are serialized
//! without locks; writers against unrelated records never contend.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{ErrorCategory, StorageError};
pub use memory::MemoryStore;
pub use traits::RecordStore;
