/// Blob Storage Quickstart
///
/// Walks a storage account through the basic blob lifecycle:
/// create a container, upload a local file into a dated virtual directory,
/// overwrite it, list the container, and delete everything again once the
/// operator confirms.
///
/// Layout:
/// 1. BlobStorage: the service as a trait (Azure account or in-memory)
/// 2. ScratchFiles / VirtualDirectory: local files and blob naming
/// 3. Confirmation: the gate before destructive cleanup
/// 4. StorageWorkflow: the sequence itself

pub mod error;
pub mod config;
pub mod storage;
pub mod azure;
pub mod memory;
pub mod directory;
pub mod scratch;
pub mod confirm;
pub mod workflow;

pub use error::{QuickstartError, Result};
pub use config::{ConnectionConfig, WorkflowConfig};
pub use storage::{AccessLevel, BlobKind, BlobStorage, ListedItem, ListingMode};
pub use azure::AzureBlobStorage;
pub use memory::{InMemoryBlobStorage, Operation};
pub use directory::VirtualDirectory;
pub use scratch::ScratchFiles;
pub use confirm::{AutoConfirm, Confirmation, Gate, ScriptedConfirmation, StdinConfirmation};
pub use workflow::{CleanupOutcome, StorageWorkflow, WorkflowReport};
