//! Destination persistence with size validation
//!
//! Bytes are written to a `<dest>.part` temporary as they arrive; the
//! temporary is renamed over the destination only after the size floor
//! check passes. Dropping an unfinalized sink removes the temporary, which
//! is what keeps the pipeline cancellation-safe: aborting the download
//! future leaves no dangling partial file.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Result, VaultError};

/// Incremental file writer for one download.
pub struct FileSink {
    dest: PathBuf,
    part: PathBuf,
    file: Option<File>,
    written: u64,
    finalized: bool,
}

impl FileSink {
    /// Open the temporary alongside the destination.
    pub async fn create(dest: &Path) -> Result<Self> {
        let mut part = dest.as_os_str().to_owned();
        part.push(".part");
        let part = PathBuf::from(part);

        let file = File::create(&part).await?;
        Ok(Self {
            dest: dest.to_path_buf(),
            part,
            file: Some(file),
            written: 0,
            finalized: false,
        })
    }

    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(bytes).await?;
            self.written += bytes.len() as u64;
        }
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Validate and commit: below `floor` the partial is removed and
    /// `TooSmallResult` returned; otherwise the temporary is renamed over
    /// the destination and the byte count returned.
    pub async fn finalize(mut self, floor: u64) -> Result<u64> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }

        if self.written < floor {
            self.finalized = true;
            let _ = tokio::fs::remove_file(&self.part).await;
            debug!(got = self.written, floor, "output below size floor, partial removed");
            return Err(VaultError::TooSmallResult {
                got: self.written,
                floor,
            });
        }

        tokio::fs::rename(&self.part, &self.dest).await?;
        self.finalized = true;
        Ok(self.written)
    }

    /// Discard the partial after an upstream failure.
    pub async fn abort(mut self) {
        self.file.take();
        self.finalized = true;
        let _ = tokio::fs::remove_file(&self.part).await;
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if !self.finalized {
            let _ = std::fs::remove_file(&self.part);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[tokio::test]
    async fn finalize_renames_over_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("track.mp3");

        let mut sink = FileSink::create(&dest).await.unwrap();
        let payload = vec![0xabu8; 2000];
        sink.write(&payload).await.unwrap();
        let written = sink.finalize(1024).await.unwrap();

        assert_eq!(written, 2000);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        assert!(!dir.path().join("track.mp3.part").exists());
    }

    #[tokio::test]
    async fn undersized_output_fails_and_removes_partial() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("track.mp3");

        let mut sink = FileSink::create(&dest).await.unwrap();
        sink.write(&[0u8; 500]).await.unwrap();
        let err = sink.finalize(1024).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TooSmallResult);
        assert!(!dest.exists());
        assert!(!dir.path().join("track.mp3.part").exists());
    }

    #[tokio::test]
    async fn abort_removes_partial() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("track.mp3");

        let mut sink = FileSink::create(&dest).await.unwrap();
        sink.write(&[0u8; 5000]).await.unwrap();
        sink.abort().await;

        assert!(!dest.exists());
        assert!(!dir.path().join("track.mp3.part").exists());
    }

    #[tokio::test]
    async fn dropping_unfinalized_sink_removes_partial() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("track.mp3");

        {
            let mut sink = FileSink::create(&dest).await.unwrap();
            sink.write(&[0u8; 5000]).await.unwrap();
            // dropped without finalize, as a cancelled future would
        }

        assert!(!dest.exists());
        assert!(!dir.path().join("track.mp3.part").exists());
    }
}
