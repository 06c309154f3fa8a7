/// StorageWorkflow: the quickstart sequence
///
/// Main region: create container, write sample files, upload A, overwrite
/// with B, list. Any failure there is printed and the run moves on to the
/// cleanup region, which always runs: confirmation gate, container delete,
/// scratch file removal.

use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::confirm::{Confirmation, Gate};
use crate::directory::VirtualDirectory;
use crate::error::{QuickstartError, Result};
use crate::scratch::ScratchFiles;
use crate::storage::{BlobStorage, ListedItem};

pub const CLEANUP_PROMPT: &str = "Press the 'Enter' key while in the console to delete the sample files, example container, and exit the application.";

#[derive(Debug)]
pub enum CleanupOutcome {
    Deleted,
    AlreadyAbsent,
    /// The operator declined; the container is still there
    Kept,
    Failed(QuickstartError),
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupOutcome::Deleted => f.write_str("deleted"),
            CleanupOutcome::AlreadyAbsent => f.write_str("already absent"),
            CleanupOutcome::Kept => f.write_str("kept"),
            CleanupOutcome::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// What a run did, step by step
#[derive(Debug, Serialize)]
pub struct WorkflowReport {
    pub container: String,
    pub directory: VirtualDirectory,
    /// `Some(true)` when this run created the container
    pub created_container: Option<bool>,
    pub blob_name: Option<String>,
    pub blob_url: Option<String>,
    /// Uploads that completed, 0 to 2
    pub uploads: u8,
    pub listed: Vec<ListedItem>,
    #[serde(serialize_with = "display_opt")]
    pub main_error: Option<QuickstartError>,
    #[serde(serialize_with = "display")]
    pub cleanup: CleanupOutcome,
    pub scratch_files: Vec<PathBuf>,
}

impl WorkflowReport {
    fn new(container: &str, directory: VirtualDirectory) -> Self {
        Self {
            container: container.to_string(),
            directory,
            created_container: None,
            blob_name: None,
            blob_url: None,
            uploads: 0,
            listed: Vec::new(),
            main_error: None,
            cleanup: CleanupOutcome::Kept,
            scratch_files: Vec::new(),
        }
    }

    /// True when every step, cleanup included, went through
    pub fn succeeded(&self) -> bool {
        self.main_error.is_none() && matches!(self.cleanup, CleanupOutcome::Deleted | CleanupOutcome::AlreadyAbsent)
    }
}

fn display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn display_opt<T: fmt::Display, S: Serializer>(
    value: &Option<T>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_none(),
    }
}

pub struct StorageWorkflow {
    storage: Arc<dyn BlobStorage>,
    config: WorkflowConfig,
}

impl StorageWorkflow {
    pub fn new(storage: Arc<dyn BlobStorage>, config: WorkflowConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run with the directory taken from the current local time
    pub async fn run(&self, confirmation: &mut dyn Confirmation) -> WorkflowReport {
        self.run_in(VirtualDirectory::now(), confirmation).await
    }

    /// Run against an explicit virtual directory
    pub async fn run_in(
        &self,
        directory: VirtualDirectory,
        confirmation: &mut dyn Confirmation,
    ) -> WorkflowReport {
        info!(
            "Starting workflow: account={}, container={}, directory={}",
            self.storage.account_name(),
            self.config.container_name,
            directory
        );

        let mut report = WorkflowReport::new(&self.config.container_name, directory);
        let mut scratch = None;

        if let Err(err) = self.main_region(&mut report, &mut scratch).await {
            warn!("Workflow step failed: {}", err);
            println!("{}", err.workflow_message());
            report.main_error = Some(err);
        }

        report.cleanup = self.cleanup_region(confirmation).await;

        println!("Deleting the source, and downloaded files");
        if let Some(files) = scratch.take() {
            report.scratch_files = files.paths();
            drop(files);
        }

        info!("Workflow finished: cleanup {}", report.cleanup);
        report
    }

    async fn main_region(
        &self,
        report: &mut WorkflowReport,
        scratch: &mut Option<ScratchFiles>,
    ) -> Result<()> {
        let container = self.config.container_name.as_str();

        println!("Creating container: {}", container);
        let created = self
            .storage
            .create_container_if_absent(container, self.config.access_level)
            .await?;
        report.created_container = Some(created);
        debug!("Container {} created by this run: {}", container, created);

        let files = scratch.insert(ScratchFiles::create(&self.config)?);
        println!("Creating sample file1 at: {}", files.first_path().display());
        println!("Creating sample file2 at: {}", files.second_path().display());

        let blob_name = report.directory.blob_name(&files.first_name()?);
        report.blob_url = Some(self.storage.blob_url(container, &blob_name)?);
        report.blob_name = Some(blob_name.clone());

        println!("Uploading the sample file \"SampleFileA\"");
        let first = Bytes::from(tokio::fs::read(files.first_path()).await?);
        self.storage.upload_blob(container, &blob_name, first).await?;
        report.uploads += 1;

        println!("\n\tOverwrite the blob by uploading the second sample file \"SampleFileB\".");
        let second = Bytes::from(tokio::fs::read(files.second_path()).await?);
        self.storage.upload_blob(container, &blob_name, second).await?;
        report.uploads += 1;
        println!("\t\tSuccessfully overwrote the blob.");

        let listed = self.storage.list_blobs(container, self.config.listing).await?;
        for item in &listed {
            match item {
                ListedItem::Blob { kind, url, .. } => println!("\t\t{}\t: {}", kind, url),
                ListedItem::Prefix { name } => debug!("Skipping virtual directory {}", name),
            }
        }
        report.listed = listed;

        Ok(())
    }

    async fn cleanup_region(&self, confirmation: &mut dyn Confirmation) -> CleanupOutcome {
        println!("The program has completed successfully.");

        match confirmation.confirm(CLEANUP_PROMPT).await {
            Ok(Gate::Proceed) => {}
            Ok(Gate::Keep) => {
                info!("Leaving container {} in place", self.config.container_name);
                return CleanupOutcome::Kept;
            }
            Err(err) => {
                warn!("Confirmation failed: {}", err);
                println!("{}", err.workflow_message());
                return CleanupOutcome::Kept;
            }
        }

        println!("Deleting the container");
        match self
            .storage
            .delete_container_if_present(&self.config.container_name)
            .await
        {
            Ok(true) => CleanupOutcome::Deleted,
            Ok(false) => CleanupOutcome::AlreadyAbsent,
            Err(err) => {
                println!("{}", err.cleanup_message());
                CleanupOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::{ScriptedConfirmation, StdinConfirmation};
    use crate::memory::{InMemoryBlobStorage, Operation};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn fixed_directory() -> VirtualDirectory {
        VirtualDirectory::from_datetime(&Utc.with_ymd_and_hms(2026, 10, 17, 9, 5, 0).unwrap())
    }

    #[tokio::test]
    async fn test_declined_gate_keeps_container_but_removes_files() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryBlobStorage::default());
        let workflow = StorageWorkflow::new(
            store.clone(),
            WorkflowConfig::default().with_scratch_dir(dir.path()),
        );

        let mut gate = ScriptedConfirmation::new([Gate::Keep]);
        let report = workflow.run_in(fixed_directory(), &mut gate).await;

        assert!(matches!(report.cleanup, CleanupOutcome::Kept));
        assert!(store.container_exists("quickstartcontainer"));
        assert_eq!(report.scratch_files.len(), 3);
        assert!(report.scratch_files.iter().all(|p| !p.exists()));
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn test_failed_gate_keeps_container() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryBlobStorage::default());
        let workflow = StorageWorkflow::new(
            store.clone(),
            WorkflowConfig::default().with_scratch_dir(dir.path()),
        );

        let stdin = tokio_test::io::Builder::new()
            .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin went away"))
            .build();
        let mut gate = StdinConfirmation::from_reader(tokio::io::BufReader::new(stdin));
        let report = workflow.run_in(fixed_directory(), &mut gate).await;

        assert!(report.main_error.is_none());
        assert!(matches!(report.cleanup, CleanupOutcome::Kept));
        assert!(store.container_exists("quickstartcontainer"));
        assert!(report.scratch_files.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryBlobStorage::default());
        store.fail_next(Operation::DeleteContainer, 409, "LeaseIdMissing");
        let workflow = StorageWorkflow::new(
            store.clone(),
            WorkflowConfig::default().with_scratch_dir(dir.path()),
        );

        let mut gate = ScriptedConfirmation::new([Gate::Proceed]);
        let report = workflow.run_in(fixed_directory(), &mut gate).await;

        assert!(report.main_error.is_none());
        match &report.cleanup {
            CleanupOutcome::Failed(err) => assert_eq!(err.status(), Some(409)),
            other => panic!("unexpected cleanup outcome: {}", other),
        }
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryBlobStorage::default());
        store.fail_next(Operation::List, 500, "InternalError");
        let workflow = StorageWorkflow::new(store, WorkflowConfig::default().with_scratch_dir(dir.path()));

        let mut gate = ScriptedConfirmation::new([Gate::Proceed]);
        let report = workflow.run_in(fixed_directory(), &mut gate).await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["directory"], "2026/OCTOBER/17/9/5");
        assert_eq!(json["uploads"], 2);
        assert_eq!(json["cleanup"], "deleted");
        assert_eq!(json["main_error"], "Service error 500: InternalError");
    }
}
