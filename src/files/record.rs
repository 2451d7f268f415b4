use chrono::{DateTime, Local};
use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::RecordError;

const RECORD_EXTENSION: &str = "txt";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RecordError + '_ {
    move |source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `attempt` 0 is the plain timestamp name; later attempts get a counter so a
/// run starting in the same second never replaces an existing record.
pub fn record_file_name(run_time: &DateTime<Local>, attempt: usize) -> String {
    let stamp = run_time.format("%Y-%m-%d_%H%M%S");
    match attempt {
        0 => format!("record_{}.{}", stamp, RECORD_EXTENSION),
        n => format!("record_{}_{}.{}", stamp, n, RECORD_EXTENSION),
    }
}

/// Relative paths imported by earlier runs, unioned over every record file.
#[derive(Debug, Default)]
pub struct ImportRecord {
    imported: HashSet<String>,
}

impl ImportRecord {
    pub fn load(folder: &Path) -> Result<Self, RecordError> {
        let mut record = Self::default();

        if !folder.exists() {
            fs::create_dir_all(folder).map_err(io_error(folder))?;
            info!("Created directory: {}", folder.display());
        }
        if !folder.is_dir() {
            return Err(RecordError::NotAFolder(folder.to_path_buf()));
        }

        let mut record_files: Vec<PathBuf> = fs::read_dir(folder)
            .map_err(io_error(folder))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_record_file(path))
            .collect();
        record_files.sort();

        for path in record_files {
            debug!("Loading imported files list from '{}'", path.display());
            record.extend_from_file(&path)?;
        }

        if record.is_empty() {
            info!("No imported files recorded in {}", folder.display());
        } else {
            info!("Loaded {} imported files", record.len());
        }
        Ok(record)
    }

    fn extend_from_file(&mut self, path: &Path) -> Result<(), RecordError> {
        let reader = BufReader::new(File::open(path).map_err(io_error(path))?);
        for line in reader.lines() {
            let line = line.map_err(io_error(path))?;
            let entry = line.trim();
            if !entry.is_empty() {
                self.imported.insert(entry.to_owned());
            }
        }
        Ok(())
    }

    pub fn contains(&self, relative: &str) -> bool {
        self.imported.contains(relative)
    }

    pub fn len(&self) -> usize {
        self.imported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imported.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ImportRecord {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            imported: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn is_record_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == RECORD_EXTENSION)
        .unwrap_or(false)
}

/// Appends copied paths to this run's record file, flushing after every line.
pub struct RecordWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    count: usize,
}

impl RecordWriter {
    pub fn create(folder: &Path, run_time: &DateTime<Local>) -> Result<Self, RecordError> {
        let mut attempt = 0;
        loop {
            let path = folder.join(record_file_name(run_time, attempt));
            match File::options().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    debug!("Opened record file '{}'", path.display());
                    return Ok(Self {
                        path,
                        writer: BufWriter::new(file),
                        count: 0,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(io_error(&path)(e)),
            }
        }
    }

    pub fn append(&mut self, relative: &str) -> Result<(), RecordError> {
        writeln!(self.writer, "{}", relative)
            .and_then(|_| self.writer.flush())
            .map_err(io_error(&self.path))?;
        self.count += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(PathBuf, usize), RecordError> {
        self.writer.flush().map_err(io_error(&self.path))?;
        info!("Record file written: {}", self.path.display());
        Ok((self.path, self.count))
    }
}

/// Writes a whole record file at once; it only appears under its final name
/// once fully written.
pub fn write_record<'a, I>(
    folder: &Path,
    run_time: &DateTime<Local>,
    paths: I,
) -> Result<PathBuf, RecordError>
where
    I: IntoIterator<Item = &'a str>,
{
    let sorted: BTreeSet<&str> = paths.into_iter().collect();
    let mut tmp = tempfile::NamedTempFile::new_in(folder).map_err(io_error(folder))?;
    let tmp_path = tmp.path().to_path_buf();
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        for relative in sorted {
            writeln!(writer, "{}", relative).map_err(io_error(&tmp_path))?;
        }
        writer.flush().map_err(io_error(&tmp_path))?;
    }

    let mut attempt = 0;
    loop {
        let path = folder.join(record_file_name(run_time, attempt));
        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                info!("Record file written: {}", path.display());
                return Ok(path);
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tmp = e.file;
                attempt += 1;
            }
            Err(e) => {
                return Err(RecordError::Io {
                    path,
                    source: e.error,
                })
            }
        }
    }
}
