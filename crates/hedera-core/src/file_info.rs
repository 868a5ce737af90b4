//! Current information about a file

use crate::{FileId, KeyList, Timestamp};
use serde::{Deserialize, Serialize};

/// Metadata of a file as reported by a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// File the information describes
    pub file_id: FileId,
    /// Number of bytes in the contents
    pub size: u64,
    /// When the file expires
    pub expiration_time: Timestamp,
    /// True if deleted but not yet expired
    pub is_deleted: bool,
    /// One of these keys must sign to delete the file; all of them to update it
    pub keys: Option<KeyList>,
}
