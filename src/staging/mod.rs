//! Per-batch temporary storage.
//!
//! A [`StagingScope`] owns one freshly created directory. It is removed when
//! the scope is closed or dropped, whichever happens first, so every exit
//! path of a batch tears it down exactly once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::app::Result;
use crate::domain::RetrievedItem;

const SCOPE_PREFIX: &str = "magpie_staging_";

pub struct StagingScope {
    dir: TempDir,
}

impl StagingScope {
    /// Create a new scope under `parent`, creating `parent` if needed.
    pub fn create_in(parent: impl AsRef<Path>) -> Result<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent)?;

        let dir = tempfile::Builder::new()
            .prefix(SCOPE_PREFIX)
            .tempdir_in(parent)?;

        debug!("Created staging scope {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// A cloneable handle that concurrent fetch tasks use to stage items.
    pub fn writer(&self) -> StagingWriter {
        StagingWriter {
            root: Arc::from(self.dir.path()),
        }
    }

    /// Remove the scope and everything in it.
    pub fn close(self) -> Result<()> {
        let root = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("Removed staging scope {}", root.display());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StagingWriter {
    root: Arc<Path>,
}

impl StagingWriter {
    /// Write an item under `image_{index}{extension}`.
    ///
    /// Files are created with create-new semantics, so staging the same
    /// index twice fails instead of overwriting.
    pub async fn write(&self, item: &RetrievedItem) -> Result<PathBuf> {
        let path = self.root.join(item.file_name());

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(&item.bytes).await?;
        file.flush().await?;

        Ok(path)
    }
}
