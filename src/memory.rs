/// InMemoryBlobStorage: a blob service kept entirely in process
///
/// Mirrors the service semantics the workflow depends on: idempotent
/// container create/delete, full-overwrite uploads, flat and hierarchical
/// listings. Used for `--dry-run` and by the test suite, which can inject
/// one-shot service failures per operation.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::EMULATOR_ACCOUNT;
use crate::error::{QuickstartError, Result};
use crate::storage::{
    AccessLevel, BlobKind, BlobStorage, ListedItem, ListingMode, DIRECTORY_DELIMITER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateContainer,
    ContainerAccess,
    Upload,
    Read,
    List,
    DeleteContainer,
}

#[derive(Debug)]
struct Fault {
    operation: Operation,
    /// Calls that still succeed before this fault fires
    successes: usize,
    status: u16,
    code: String,
}

#[derive(Debug)]
struct MemoryContainer {
    access: AccessLevel,
    blobs: BTreeMap<String, Bytes>,
}

pub struct InMemoryBlobStorage {
    account: String,
    endpoint: String,
    containers: DashMap<String, MemoryContainer>,
    faults: Mutex<Vec<Fault>>,
}

impl Default for InMemoryBlobStorage {
    fn default() -> Self {
        Self::new(EMULATOR_ACCOUNT)
    }
}

impl InMemoryBlobStorage {
    pub fn new(account: impl Into<String>) -> Self {
        let account = account.into();
        let endpoint = format!("http://127.0.0.1:10000/{}", account);
        Self {
            account,
            endpoint,
            containers: DashMap::new(),
            faults: Mutex::new(Vec::new()),
        }
    }

    /// Make the next call of `operation` fail with a service error
    pub fn fail_next(&self, operation: Operation, status: u16, code: impl Into<String>) {
        self.fail_after(operation, 0, status, code);
    }

    /// Let `successes` calls of `operation` through, then fail one
    pub fn fail_after(&self, operation: Operation, successes: usize, status: u16, code: impl Into<String>) {
        self.faults.lock().push(Fault {
            operation,
            successes,
            status,
            code: code.into(),
        });
    }

    pub fn container_exists(&self, container: &str) -> bool {
        self.containers.contains_key(container)
    }

    pub fn blob_count(&self, container: &str) -> usize {
        self.containers
            .get(container)
            .map(|c| c.blobs.len())
            .unwrap_or(0)
    }

    fn take_fault(&self, operation: Operation) -> Result<()> {
        let mut faults = self.faults.lock();
        if let Some(pos) = faults.iter().position(|f| f.operation == operation) {
            if faults[pos].successes > 0 {
                faults[pos].successes -= 1;
                return Ok(());
            }
            let fault = faults.remove(pos);
            debug!("Injected failure for {:?}: {} {}", operation, fault.status, fault.code);
            return Err(QuickstartError::service(fault.status, fault.code));
        }
        Ok(())
    }

    fn container_not_found() -> QuickstartError {
        QuickstartError::service(404, "ContainerNotFound")
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    fn account_name(&self) -> &str {
        &self.account
    }

    async fn create_container_if_absent(&self, container: &str, access: AccessLevel) -> Result<bool> {
        self.take_fault(Operation::CreateContainer)?;

        match self.containers.entry(container.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(MemoryContainer {
                    access,
                    blobs: BTreeMap::new(),
                });
                debug!("Created container {} ({:?})", container, access);
                Ok(true)
            }
        }
    }

    async fn container_access(&self, container: &str) -> Result<Option<AccessLevel>> {
        self.take_fault(Operation::ContainerAccess)?;
        Ok(self.containers.get(container).map(|c| c.access))
    }

    async fn upload_blob(&self, container: &str, blob: &str, data: Bytes) -> Result<()> {
        self.take_fault(Operation::Upload)?;

        let mut entry = self
            .containers
            .get_mut(container)
            .ok_or_else(Self::container_not_found)?;
        debug!("Put {} bytes to {}/{}", data.len(), container, blob);
        entry.blobs.insert(blob.to_string(), data);
        Ok(())
    }

    async fn read_blob(&self, container: &str, blob: &str) -> Result<Bytes> {
        self.take_fault(Operation::Read)?;

        let entry = self
            .containers
            .get(container)
            .ok_or_else(Self::container_not_found)?;
        entry
            .blobs
            .get(blob)
            .cloned()
            .ok_or_else(|| QuickstartError::service(404, "BlobNotFound"))
    }

    async fn list_blobs(&self, container: &str, mode: ListingMode) -> Result<Vec<ListedItem>> {
        self.take_fault(Operation::List)?;

        let entry = self
            .containers
            .get(container)
            .ok_or_else(Self::container_not_found)?;

        let mut blobs = Vec::new();
        let mut prefixes = BTreeSet::new();
        for name in entry.blobs.keys() {
            match (mode, name.find(DIRECTORY_DELIMITER)) {
                (ListingMode::Hierarchical, Some(idx)) => {
                    prefixes.insert(name[..=idx].to_string());
                }
                _ => blobs.push(ListedItem::Blob {
                    name: name.clone(),
                    kind: BlobKind::BlockBlob,
                    url: self.blob_url(container, name)?,
                }),
            }
        }

        let mut items: Vec<ListedItem> = blobs
            .into_iter()
            .chain(prefixes.into_iter().map(|name| ListedItem::Prefix { name }))
            .collect();
        items.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(items)
    }

    async fn delete_container_if_present(&self, container: &str) -> Result<bool> {
        self.take_fault(Operation::DeleteContainer)?;
        Ok(self.containers.remove(container).is_some())
    }

    fn blob_url(&self, container: &str, blob: &str) -> Result<String> {
        Ok(format!("{}/{}/{}", self.endpoint, container, blob))
    }
}
