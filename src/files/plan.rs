use std::collections::BTreeMap;
use tracing::info;

use crate::errors::PathError;
use crate::files::filter::FileFilter;
use crate::files::paths::relative_path;
use crate::files::record::ImportRecord;

/// Files still to import, keyed by path relative to the source folder.
#[derive(Debug)]
pub struct ImportPlan<I> {
    files: BTreeMap<String, I>,
    pub already_imported: usize,
    pub filtered_out: usize,
}

impl<I> ImportPlan<I> {
    /// `files` maps absolute display paths (all under `source`) to their items.
    pub fn build(
        source: &str,
        files: BTreeMap<String, I>,
        record: &ImportRecord,
        filter: &FileFilter,
    ) -> Result<Self, PathError> {
        let mut plan = Self {
            files: BTreeMap::new(),
            already_imported: 0,
            filtered_out: 0,
        };

        for (full_path, item) in files {
            let relative = relative_path(&full_path, source)?;
            if !filter.accepts(relative) {
                plan.filtered_out += 1;
            } else if record.contains(relative) {
                plan.already_imported += 1;
            } else {
                plan.files.insert(relative.to_owned(), item);
            }
        }

        info!(
            "Found {} files to import ({} already imported, {} filtered out)",
            plan.files.len(),
            plan.already_imported,
            plan.filtered_out
        );
        Ok(plan)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn relative_paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &I)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }
}
