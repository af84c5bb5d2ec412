//! Per-user datafile storage: `{data_dir}/{username}/{username}-{fileID}.txt`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use edge_core::{datafile_name, FileId};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Error type for datafile operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("datafile {0} does not exist")]
    NotFound(PathBuf),

    #[error("I/O error on datafile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("datafile {path} contains a non-integer line {line:?}")]
    Parse { path: PathBuf, line: String },
}

impl DataError {
    fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == ErrorKind::NotFound {
            DataError::NotFound(path.to_path_buf())
        } else {
            DataError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Stores datafiles under one directory per user.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of a user's datafile.
    pub fn path(&self, username: &str, file_id: FileId) -> PathBuf {
        self.root
            .join(username)
            .join(datafile_name(username, file_id))
    }

    /// Writes `content` verbatim, replacing any previous file, and returns
    /// its line count.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Io`] if the directory or file cannot be written.
    pub async fn write(
        &self,
        username: &str,
        file_id: FileId,
        content: &str,
    ) -> Result<usize, DataError> {
        let path = self.path(username, file_id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| DataError::from_io(dir, e))?;
        }
        fs::write(&path, content)
            .await
            .map_err(|e| DataError::from_io(&path, e))?;
        let lines = content.lines().count();
        debug!(path = %path.display(), lines, "datafile written");
        Ok(lines)
    }

    /// Reads the datafile as one integer per line.  Blank lines are skipped;
    /// surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if the file is absent,
    /// [`DataError::Parse`] for a non-integer line, and [`DataError::Io`]
    /// otherwise.
    pub async fn read_integers(
        &self,
        username: &str,
        file_id: FileId,
    ) -> Result<Vec<i64>, DataError> {
        let path = self.path(username, file_id);
        let text = fs::read_to_string(&path)
            .await
            .map_err(|e| DataError::from_io(&path, e))?;
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.parse().map_err(|_| DataError::Parse {
                    path: path.clone(),
                    line: line.to_string(),
                })
            })
            .collect()
    }

    /// Deletes the datafile and returns the line count it had.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if the file is absent and
    /// [`DataError::Io`] if it cannot be read or removed.
    pub async fn delete(&self, username: &str, file_id: FileId) -> Result<usize, DataError> {
        let path = self.path(username, file_id);
        let text = fs::read_to_string(&path)
            .await
            .map_err(|e| DataError::from_io(&path, e))?;
        fs::remove_file(&path)
            .await
            .map_err(|e| DataError::from_io(&path, e))?;
        debug!(path = %path.display(), "datafile deleted");
        Ok(text.lines().count())
    }
}
