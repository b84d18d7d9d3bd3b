//! notagraph store - persistence collaborators for model snapshots
//!
//! Provides:
//! - Atomic JSON file store (temp file + rename)
//! - In-memory store for tests and embedding

pub mod atomic;
pub mod errors;
pub mod json_store;
pub mod memory_store;

// Re-export key types
pub use errors::Result;
pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;
