use chrono::{DateTime, Local};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::{CopyRequest, Entry, Namespace};
use crate::errors::NamespaceError;
use crate::files::paths::segments;

/// Plain directories, e.g. a phone mounted through gvfs/ifuse or a DCIM folder
/// copied off a card.
#[derive(Debug, Default)]
pub struct LocalNamespace;

fn modified(path: &Path) -> Option<DateTime<Local>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Local>::from)
}

fn describe(path: &Path) -> String {
    match modified(path) {
        Some(date) => format!(
            "{} (modified {})",
            path.display(),
            date.format("%Y-%m-%d %H:%M:%S")
        ),
        None => format!("{} (modification date not available)", path.display()),
    }
}

/// First segment of `path` that is not an existing directory. Rooted paths
/// are walked by component so a prefix such as `C:` stays attached to its root.
fn first_missing(path: &str) -> String {
    let mut current = PathBuf::new();
    if Path::new(path).has_root() {
        for component in Path::new(path).components() {
            current.push(component);
            if let Component::Normal(name) = component {
                if !current.is_dir() {
                    return name.to_string_lossy().into_owned();
                }
            }
        }
    } else {
        for segment in segments(path) {
            current.push(segment);
            if !current.is_dir() {
                return segment.to_owned();
            }
        }
    }
    path.to_owned()
}

impl Namespace for LocalNamespace {
    type Folder = PathBuf;
    type Item = PathBuf;
    type Destination = PathBuf;

    fn root(&self) -> Result<PathBuf, NamespaceError> {
        Ok(PathBuf::from("."))
    }

    fn children(
        &self,
        folder: &PathBuf,
    ) -> Result<Vec<Entry<PathBuf, PathBuf>>, NamespaceError> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path().to_path_buf();
            if entry.file_type().is_dir() {
                entries.push(Entry::Folder {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    folder: path,
                });
            } else if entry.file_type().is_file() {
                entries.push(Entry::File(path));
            }
        }
        Ok(entries)
    }

    fn folder_path(&self, folder: &PathBuf) -> Result<String, NamespaceError> {
        Ok(folder.display().to_string())
    }

    fn item_path(&self, item: &PathBuf) -> Result<String, NamespaceError> {
        Ok(item.display().to_string())
    }

    /// The path is kept as typed so display paths of its files start with it.
    fn resolve_folder(&self, path: &str) -> Result<PathBuf, NamespaceError> {
        let folder = PathBuf::from(path);
        if folder.is_dir() {
            return Ok(folder);
        }

        Err(NamespaceError::FolderNotFound {
            path: path.to_owned(),
            segment: first_missing(path),
        })
    }

    fn resolve_destination(&self, dir: &Path) -> Result<PathBuf, NamespaceError> {
        if dir.is_dir() {
            Ok(dir.to_path_buf())
        } else {
            Err(NamespaceError::DestinationNotFound(dir.display().to_string()))
        }
    }

    fn copy_batch(&self, requests: &[CopyRequest<'_, Self>]) -> Result<(), NamespaceError> {
        for request in requests {
            let target = request.destination.join(request.name);
            debug!("Copying '{}' to '{}'", describe(request.item), target.display());
            fs::copy(request.item, &target)?;
        }
        Ok(())
    }
}
