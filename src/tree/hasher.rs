//! Git blob object ids
//!
//! Reproduces the id Git's object store assigns to a blob:
//! `sha1("blob " + byte_len + "\0" + bytes)`.

use sha1::{Digest, Sha1};

/// A Git blob id (SHA-1, 20 bytes)
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BlobHash([u8; 20]);

/// Id of the empty blob, shared by every `.gitkeep` placeholder.
pub const EMPTY_BLOB_HEX: &str = "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391";

impl BlobHash {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex, the form GitHub reports in tree listings.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(value: &str) -> Option<Self> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(value, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    /// Compare against a hex id from the remote, ignoring case.
    pub fn matches_hex(&self, other: &str) -> bool {
        Self::from_hex(other).map(|h| h == *self).unwrap_or(false)
    }
}

impl std::fmt::Debug for BlobHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlobHash({})", self.to_hex())
    }
}

impl std::fmt::Display for BlobHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash a string as Git would store it (UTF-8 bytes).
pub fn hash_blob(content: &str) -> BlobHash {
    hash_blob_bytes(content.as_bytes())
}

pub fn hash_blob_bytes(data: &[u8]) -> BlobHash {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", data.len()).as_bytes());
    hasher.update(data);
    BlobHash(hasher.finalize().into())
}
