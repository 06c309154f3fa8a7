/// Scratch files: the two local sample files and the planned download path
///
/// All of them live in a directory created for this run, which is removed
/// when `ScratchFiles` is dropped, whichever way the workflow exits.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempDir};
use tracing::debug;

use crate::config::WorkflowConfig;
use crate::error::Result;

pub struct ScratchFiles {
    first: NamedTempFile,
    second: NamedTempFile,
    download_target: PathBuf,
    // declared last so the files go before their directory
    run_dir: TempDir,
}

impl ScratchFiles {
    /// Create the run directory and both sample files with their payloads.
    pub fn create(config: &WorkflowConfig) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix("blob-quickstart-");
        let run_dir = match &config.scratch_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        debug!("Scratch directory {}", run_dir.path().display());

        let first = write_sample(run_dir.path(), config, &config.first_prefix, &config.first_payload)?;
        let second = write_sample(run_dir.path(), config, &config.second_prefix, &config.second_payload)?;
        let download_target = run_dir.path().join(&config.download_file_name);

        Ok(Self {
            first,
            second,
            download_target,
            run_dir,
        })
    }

    pub fn first_path(&self) -> &Path {
        self.first.path()
    }

    pub fn second_path(&self) -> &Path {
        self.second.path()
    }

    /// Where a downloaded copy would be written. Nothing downloads to it; it
    /// goes away with the run directory.
    pub fn download_target(&self) -> &Path {
        &self.download_target
    }

    pub fn run_dir(&self) -> &Path {
        self.run_dir.path()
    }

    /// Base name of the first file, used as the blob name
    pub fn first_name(&self) -> Result<String> {
        file_name(self.first.path())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        vec![
            self.first.path().to_path_buf(),
            self.second.path().to_path_buf(),
            self.download_target.clone(),
        ]
    }
}

fn write_sample(dir: &Path, config: &WorkflowConfig, prefix: &str, payload: &str) -> Result<NamedTempFile> {
    let mut file = Builder::new()
        .prefix(prefix)
        .suffix(&config.file_suffix)
        .tempfile_in(dir)?;

    file.write_all(payload.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn file_name(path: &Path) -> Result<String> {
    let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} has no UTF-8 file name", path.display()),
        )
    })?;
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_in(dir: &TempDir) -> WorkflowConfig {
        WorkflowConfig::default().with_scratch_dir(dir.path())
    }

    #[test]
    fn test_files_hold_payloads() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchFiles::create(&config_in(&dir)).unwrap();

        assert_eq!(fs::read_to_string(scratch.first_path()).unwrap(), "Hello Azure!");
        assert_eq!(fs::read_to_string(scratch.second_path()).unwrap(), "Hello Azure Again!");

        let name = scratch.first_name().unwrap();
        assert!(name.starts_with("sampleFileA"));
        assert!(name.ends_with(".txt"));
        assert_eq!(scratch.download_target(), scratch.run_dir().join("downloadedFile.txt"));
        assert_eq!(scratch.first_path().parent(), Some(scratch.run_dir()));
        assert_eq!(scratch.run_dir().parent(), Some(dir.path()));
    }

    #[test]
    fn test_drop_removes_everything() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchFiles::create(&config_in(&dir)).unwrap();
        fs::write(scratch.download_target(), b"downloaded").unwrap();
        let paths = scratch.paths();
        assert!(paths.iter().all(|p| p.exists()));

        let run_dir = scratch.run_dir().to_path_buf();

        drop(scratch);
        assert!(paths.iter().all(|p| !p.exists()));
        assert!(!run_dir.exists());
    }

    #[test]
    fn test_shared_download_file_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let shared = dir.path().join("downloadedFile.txt");
        fs::write(&shared, b"someone else's").unwrap();

        let first = ScratchFiles::create(&config_in(&dir)).unwrap();
        let second = ScratchFiles::create(&config_in(&dir)).unwrap();
        assert_ne!(first.download_target(), shared.as_path());
        assert_ne!(first.download_target(), second.download_target());

        drop(first);
        drop(second);
        assert_eq!(fs::read(&shared).unwrap(), b"someone else's");
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let config = WorkflowConfig::default().with_scratch_dir(dir.path().join("nope"));
        let err = ScratchFiles::create(&config).err().unwrap();
        assert!(matches!(err, crate::error::QuickstartError::LocalIo(_)));
    }
}
