//! Write-once fingerprint store.
//!
//! Each id can be bound to a fingerprint exactly once; the binding records
//! when it was made. Backends implement [`HashStore`]; the rest of the
//! workspace depends only on the trait.

pub mod error;
pub mod hash;
pub mod memory;

pub use error::StoreError;
pub use hash::{HashRecord, HashStore};
pub use memory::MemoryHashStore;
