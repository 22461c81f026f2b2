//! Git tree handling
//!
//! Blob hashing compatible with Git's object store, and partitioning of a
//! recursive tree listing into the parts a push preserves and the parts it owns.

pub mod entry;
pub mod hasher;

pub use entry::{partition_entries, PreservedBlob, TreePartition};
pub use hasher::{hash_blob, hash_blob_bytes, BlobHash, EMPTY_BLOB_HEX};
