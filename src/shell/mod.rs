//! Access to the tree the phone is exposed through.
//!
//! On Windows a phone only shows up inside the shell namespace ("This PC\Apple
//! iPhone\Internal Storage"), which is not reachable with ordinary file APIs.
//! [`Namespace`] captures the few operations the importer needs from it so the
//! same import logic can run against the shell or against a plain directory.

pub mod local;
mod walk;
#[cfg(windows)]
pub mod com;

#[cfg(test)]
pub(crate) mod memory;

use std::path::Path;

use crate::errors::NamespaceError;
use crate::files::paths::segments;

pub use walk::collect_files;

/// A child of a folder, as returned by [`Namespace::children`].
pub enum Entry<F, I> {
    Folder { name: String, folder: F },
    File(I),
}

/// One queued copy: `item` lands in `destination` under `name`.
pub struct CopyRequest<'a, N: Namespace + ?Sized> {
    pub item: &'a N::Item,
    pub destination: &'a N::Destination,
    pub name: &'a str,
}

pub trait Namespace {
    type Folder;
    type Item;
    type Destination;

    /// The folder every display path is resolved from.
    fn root(&self) -> Result<Self::Folder, NamespaceError>;

    /// Children of `folder`, sorted by display name.
    fn children(
        &self,
        folder: &Self::Folder,
    ) -> Result<Vec<Entry<Self::Folder, Self::Item>>, NamespaceError>;

    /// Absolute display path of a folder.
    fn folder_path(&self, folder: &Self::Folder) -> Result<String, NamespaceError>;

    /// Absolute display path of a file.
    fn item_path(&self, item: &Self::Item) -> Result<String, NamespaceError>;

    fn resolve_destination(&self, dir: &Path) -> Result<Self::Destination, NamespaceError>;

    /// Performs every request as a single operation.
    fn copy_batch(&self, requests: &[CopyRequest<'_, Self>]) -> Result<(), NamespaceError>;

    fn copy(&self, request: CopyRequest<'_, Self>) -> Result<(), NamespaceError> {
        self.copy_batch(std::slice::from_ref(&request))
    }

    /// The child folder of `folder` whose display name is `name`, if any.
    fn child_folder(
        &self,
        folder: &Self::Folder,
        name: &str,
    ) -> Result<Option<Self::Folder>, NamespaceError> {
        Ok(self
            .children(folder)?
            .into_iter()
            .find_map(|entry| match entry {
                Entry::Folder { name: found, folder } if found == name => Some(folder),
                _ => None,
            }))
    }

    /// Walks `path` from [`Namespace::root`] one display name at a time.
    fn resolve_folder(&self, path: &str) -> Result<Self::Folder, NamespaceError> {
        let mut current = self.root()?;
        for segment in segments(path) {
            current = self
                .child_folder(&current, segment)?
                .ok_or_else(|| NamespaceError::FolderNotFound {
                    path: path.to_owned(),
                    segment: segment.to_owned(),
                })?;
        }
        Ok(current)
    }
}
