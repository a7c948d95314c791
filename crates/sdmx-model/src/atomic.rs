//! Scoped output files.
//!
//! Content goes to a sibling temporary file that is renamed over the target
//! on [`AtomicFile::commit`]. Dropping an uncommitted file removes the
//! temporary, so an interrupted write never leaves a truncated output behind.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{CodelistError, Result};

pub struct AtomicFile {
    target: PathBuf,
    temp: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl AtomicFile {
    pub fn create(target: &Path) -> Result<Self> {
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| CodelistError::write(parent, e))?;
        }
        let mut name = target
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        let temp = target.with_file_name(name);
        let file = File::create(&temp).map_err(|e| CodelistError::write(target, e))?;
        Ok(Self {
            target: target.to_path_buf(),
            temp,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Flush, sync and rename into place.
    pub fn commit(mut self) -> Result<PathBuf> {
        let Some(writer) = self.writer.take() else {
            return Ok(self.target.clone());
        };
        let file = writer
            .into_inner()
            .map_err(|e| CodelistError::write(&self.target, e.into_error()))?;
        file.sync_all()
            .map_err(|e| CodelistError::write(&self.target, e))?;
        drop(file);
        fs::rename(&self.temp, &self.target).map_err(|e| CodelistError::write(&self.target, e))?;
        tracing::debug!(path = %self.target.display(), "wrote output");
        Ok(self.target.clone())
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::other("output already committed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Write `bytes` to `target` in one scoped step.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let mut file = AtomicFile::create(target)?;
    file.write_all(bytes)
        .map_err(|e| CodelistError::write(target, e))?;
    file.commit()
}
