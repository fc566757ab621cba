//! File-backed store for the synchronization document.
//!
//! Every operation re-reads the file; nothing is cached between calls.
//! Writes go to a sibling temporary file that is then renamed over the
//! target, so readers never observe a half-written document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

use crate::document::codec::{self, SectionKey, SectionMap};
use crate::error::DocumentError;
use crate::registry::ChannelRegistry;

/// The single synchronization document on disk.
pub struct DocumentStore {
    path: PathBuf,
    registry: Arc<ChannelRegistry>,
}

impl DocumentStore {
    pub fn new(path: PathBuf, registry: Arc<ChannelRegistry>) -> Self {
        Self { path, registry }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and decode the document.
    ///
    /// A missing document is an empty map; read errors are logged and also
    /// yield an empty map.
    pub async fn read_all(&self) -> SectionMap {
        match self.load().await {
            Ok(sections) => sections,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read document; treating as empty");
                SectionMap::new()
            }
        }
    }

    /// Like [`read_all`](Self::read_all), but read errors other than a
    /// missing file are returned. Invalid UTF-8 is decoded lossily.
    async fn load(&self) -> Result<SectionMap, DocumentError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(codec::decode(&String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SectionMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Encode `sections` in canonical layout and replace the document.
    pub async fn write_all(&self, sections: &SectionMap) -> Result<(), DocumentError> {
        let content = codec::encode(&self.registry, sections);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, content).await.map_err(|e| self.io_error(e))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.io_error(e));
        }
        Ok(())
    }

    /// Append one line to a section and write the document back.
    ///
    /// If the existing document cannot be read, nothing is written.
    pub async fn append_to_section(
        &self,
        key: &SectionKey,
        line: &str,
    ) -> Result<(), DocumentError> {
        let mut sections = self.load().await?;
        sections.append_line(key.clone(), line);
        self.write_all(&sections).await
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> DocumentError {
        DocumentError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
