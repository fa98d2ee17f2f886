//! Files in the output directory are replaced whole or not at all.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path:?} is unusable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Create `dir` (and parents) unless it already exists as a directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |reason: String| PersistError::OutputDir {
        path: dir.to_path_buf(),
        reason,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(unusable("not a directory".to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|err| unusable(err.to_string()))
        }
        Err(err) => Err(unusable(err.to_string())),
    }
}

/// Writes through a hidden `.part` file in the same directory, then
/// renames it over the target.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write(&self, filename: &str, content: impl AsRef<[u8]>) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;
        let target = self.dir.join(filename);
        let failed = |source: io::Error| PersistError::Write {
            path: target.clone(),
            source,
        };

        let mut part = tempfile::Builder::new()
            .prefix(".ria-")
            .suffix(".part")
            .tempfile_in(&self.dir)
            .map_err(failed)?;
        part.write_all(content.as_ref()).map_err(failed)?;
        part.as_file().sync_all().map_err(failed)?;
        part.persist(&target).map_err(|err| failed(err.error))?;
        Ok(target)
    }
}
