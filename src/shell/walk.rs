use std::collections::BTreeMap;
use tracing::{debug, info, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use super::{Entry, Namespace};
use crate::errors::NamespaceError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListingStats {
    pub folders: usize,
    pub files: usize,
    pub repeated: usize,
}

impl std::ops::AddAssign for ListingStats {
    fn add_assign(&mut self, other: Self) {
        self.folders += other.folders;
        self.files += other.files;
        self.repeated += other.repeated;
    }
}

/// Flattens the tree under `folder` into absolute display path -> item.
///
/// When a path is reported twice the first item wins and the repeat is only
/// counted.
pub fn collect_files<N: Namespace>(
    ns: &N,
    folder: &N::Folder,
) -> Result<(BTreeMap<String, N::Item>, ListingStats), NamespaceError> {
    let mut files = BTreeMap::new();
    let stats = collect_into(ns, folder, &mut files)?;
    Ok((files, stats))
}

fn collect_into<N: Namespace>(
    ns: &N,
    folder: &N::Folder,
    result: &mut BTreeMap<String, N::Item>,
) -> Result<ListingStats, NamespaceError> {
    let folder_name = ns.folder_path(folder)?;
    Span::current().pb_set_message(&folder_name);

    let mut own = ListingStats::default();
    let mut total = ListingStats::default();
    let mut repeated_files = Vec::new();

    for entry in ns.children(folder)? {
        match entry {
            Entry::Folder { name, folder } => {
                debug!("Listing folder '{}'", name);
                own.folders += 1;
                total += collect_into(ns, &folder, result)?;
            }
            Entry::File(item) => {
                let path = ns.item_path(&item)?;
                own.files += 1;
                if result.contains_key(&path) {
                    own.repeated += 1;
                    repeated_files.push(path);
                } else {
                    result.insert(path, item);
                }
            }
        }
    }

    info!(
        "{}: folder count: {}, file count: {}, repeated file count: {}, repeated files: {:?}",
        folder_name, own.folders, own.files, own.repeated, repeated_files
    );

    total += own;
    Ok(total)
}
