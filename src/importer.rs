use chrono::{DateTime, Local};
use std::collections::hash_map::{Entry, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::errors::ImportError;
use crate::files::paths::to_host_path;
use crate::files::plan::ImportPlan;
use crate::files::record::{write_record, RecordWriter};
use crate::logging;
use crate::shell::{CopyRequest, Namespace};

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub total: usize,
    pub copied: usize,
    pub failed: Vec<String>,
    pub record_file: Option<PathBuf>,
}

/// Copies planned files below `destination`, mirroring their relative paths.
pub struct Importer<'a, N: Namespace> {
    ns: &'a N,
    destination: &'a Path,
    record_folder: &'a Path,
    run_time: DateTime<Local>,
    // Destination folder handles, resolved once per directory.
    folders: HashMap<PathBuf, N::Destination>,
}

struct Target {
    dir: PathBuf,
    name: String,
}

impl<'a, N: Namespace> Importer<'a, N> {
    pub fn new(
        ns: &'a N,
        destination: &'a Path,
        record_folder: &'a Path,
        run_time: DateTime<Local>,
    ) -> Self {
        Self {
            ns,
            destination,
            record_folder,
            run_time,
            folders: HashMap::new(),
        }
    }

    fn target(&self, relative: &str) -> Target {
        let full = self.destination.join(to_host_path(relative));
        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = full
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.destination.to_path_buf());
        Target { dir, name }
    }

    fn prepare_folder(&mut self, dir: &Path) -> Result<(), ImportError> {
        if let Entry::Vacant(slot) = self.folders.entry(dir.to_path_buf()) {
            fs::create_dir_all(slot.key()).map_err(|source| ImportError::CreateDir {
                path: slot.key().clone(),
                source,
            })?;
            let handle = self.ns.resolve_destination(slot.key())?;
            slot.insert(handle);
        }
        Ok(())
    }

    fn progress(total: usize) -> Span {
        let span = info_span!("import");
        span.pb_set_style(&logging::copy_progress_style());
        span.pb_set_length(total as u64);
        span
    }

    /// One copy operation per file. A failed copy is logged and left out of the
    /// record; the remaining files are still copied.
    pub fn import_each(
        &mut self,
        plan: &ImportPlan<N::Item>,
    ) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary {
            total: plan.len(),
            ..Default::default()
        };
        let mut record = RecordWriter::create(self.record_folder, &self.run_time)?;

        let span = Self::progress(plan.len());
        let _enter = span.enter();

        for (relative, item) in plan.iter() {
            span.pb_set_message(relative);
            let target = self.target(relative);
            self.prepare_folder(&target.dir)?;

            let request = CopyRequest {
                item,
                destination: &self.folders[&target.dir],
                name: &target.name,
            };
            match self.ns.copy(request) {
                Ok(()) => {
                    record.append(relative)?;
                    summary.copied += 1;
                }
                Err(e) => {
                    error!("Failed to copy {}: {}", relative, e);
                    summary.failed.push(relative.to_owned());
                }
            }
            span.pb_inc(1);
        }

        let (path, _) = record.finish()?;
        summary.record_file = Some(path);
        Ok(summary)
    }

    /// Queues every file into a single copy operation. The record is only
    /// written if the whole operation succeeds.
    pub fn import_batch(
        &mut self,
        plan: &ImportPlan<N::Item>,
    ) -> Result<ImportSummary, ImportError> {
        let targets: Vec<Target> = plan.relative_paths().map(|rel| self.target(rel)).collect();
        for target in &targets {
            self.prepare_folder(&target.dir)?;
        }

        let requests: Vec<CopyRequest<'_, N>> = plan
            .iter()
            .zip(&targets)
            .map(|((_, item), target)| CopyRequest {
                item,
                destination: &self.folders[&target.dir],
                name: &target.name,
            })
            .collect();

        let span = Self::progress(requests.len());
        let _enter = span.enter();
        info!("Running {} queued copy operations...", requests.len());
        self.ns.copy_batch(&requests).map_err(ImportError::Batch)?;
        span.pb_set_position(requests.len() as u64);

        let path = write_record(self.record_folder, &self.run_time, plan.relative_paths())?;
        Ok(ImportSummary {
            total: plan.len(),
            copied: plan.len(),
            failed: Vec::new(),
            record_file: Some(path),
        })
    }
}
