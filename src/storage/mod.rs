//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::{InMemoryOrderStore, InMemoryProductStore};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteOrderStore, SqliteProductStore};
