use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NamespaceError {
    #[error("Cannot get shell folder for `{path}` (at `{segment}`)")]
    FolderNotFound { path: String, segment: String },
    #[error("Cannot get shell item for `{0}`")]
    DestinationNotFound(String),
    #[error("Copy operation was aborted")]
    Aborted,
    #[error("Shell call failed: {0}")]
    Shell(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(windows)]
impl From<windows::core::Error> for NamespaceError {
    fn from(e: windows::core::Error) -> Self {
        NamespaceError::Shell(e.message().to_string())
    }
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("`{0}` is not a folder")]
    NotAFolder(PathBuf),
    #[error("Error reading/writing record file `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("`{path}` should start with `{prefix}`")]
    MissingPrefix { path: String, prefix: String },
}

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid extension list `{0}`")]
    InvalidExtensions(String, #[source] regex::Error),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Cannot create destination directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Batch copy failed, nothing was recorded")]
    Batch(#[source] NamespaceError),
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
    #[error(transparent)]
    Record(#[from] RecordError),
}
