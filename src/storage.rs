/// Storage collaborator: the blob service as the workflow sees it
///
/// Every remote operation the workflow issues goes through `BlobStorage`.
/// `AzureBlobStorage` talks to a real account, `InMemoryBlobStorage` keeps
/// everything in process.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;

use crate::error::Result;

pub const DIRECTORY_DELIMITER: char = '/';

/// Anonymous read access on a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessLevel {
    /// No anonymous access
    Private,
    /// Anonymous reads of blob content only
    Blob,
    /// Anonymous reads of blob content and container metadata
    Container,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlobKind {
    BlockBlob,
    PageBlob,
    AppendBlob,
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlobKind::BlockBlob => "BLOCK_BLOB",
            BlobKind::PageBlob => "PAGE_BLOB",
            BlobKind::AppendBlob => "APPEND_BLOB",
        };
        f.write_str(name)
    }
}

/// How a container listing treats `/` in blob names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ListingMode {
    /// Every blob in the container
    #[default]
    Flat,
    /// Only the container root; deeper names collapse into prefixes
    Hierarchical,
}

/// One entry of a container listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListedItem {
    Blob {
        name: String,
        kind: BlobKind,
        url: String,
    },
    /// A virtual directory, only produced by hierarchical listings
    Prefix { name: String },
}

impl ListedItem {
    pub fn name(&self) -> &str {
        match self {
            ListedItem::Blob { name, .. } | ListedItem::Prefix { name } => name,
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, ListedItem::Blob { .. })
    }
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Storage account the handle is bound to
    fn account_name(&self) -> &str;

    /// Create the container unless it exists. Returns `true` when it was created;
    /// an existing container keeps its access level.
    async fn create_container_if_absent(&self, container: &str, access: AccessLevel) -> Result<bool>;

    /// Access level of the container, `None` if it does not exist
    async fn container_access(&self, container: &str) -> Result<Option<AccessLevel>>;

    /// Replace the blob's content and metadata with `data`
    async fn upload_blob(&self, container: &str, blob: &str, data: Bytes) -> Result<()>;

    async fn read_blob(&self, container: &str, blob: &str) -> Result<Bytes>;

    /// Listing sorted by name, without duplicates
    async fn list_blobs(&self, container: &str, mode: ListingMode) -> Result<Vec<ListedItem>>;

    /// Delete the container and every blob in it. Returns `false` when it was already gone.
    async fn delete_container_if_present(&self, container: &str) -> Result<bool>;

    /// Fully qualified address of a blob
    fn blob_url(&self, container: &str, blob: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_kind_display() {
        assert_eq!(BlobKind::BlockBlob.to_string(), "BLOCK_BLOB");
        assert_eq!(BlobKind::AppendBlob.to_string(), "APPEND_BLOB");
    }

    #[test]
    fn test_listed_item_accessors() {
        let blob = ListedItem::Blob {
            name: "a/b.txt".to_string(),
            kind: BlobKind::BlockBlob,
            url: "http://host/c/a/b.txt".to_string(),
        };
        let prefix = ListedItem::Prefix { name: "a/".to_string() };
        assert!(blob.is_blob());
        assert!(!prefix.is_blob());
        assert_eq!(prefix.name(), "a/");
    }

    #[test]
    fn test_listed_item_serializes_with_tag() {
        let prefix = ListedItem::Prefix { name: "2026/".to_string() };
        let json = serde_json::to_string(&prefix).unwrap();
        assert_eq!(json, r#"{"type":"prefix","name":"2026/"}"#);
    }
}
