use regex::{Regex, RegexBuilder};

use crate::errors::FilterError;
use crate::files::paths::segments;

/// Which enumerated files are eligible for import.
#[derive(Debug, Default)]
pub struct FileFilter {
    extensions: Option<Regex>,
    excluded_dirs: Vec<String>,
    skip_hidden: bool,
}

impl FileFilter {
    pub fn new(
        extensions: &[String],
        excluded_dirs: &[String],
        skip_hidden: bool,
    ) -> Result<Self, FilterError> {
        let extensions = if extensions.is_empty() {
            None
        } else {
            let alternatives = extensions
                .iter()
                .map(|ext| regex::escape(ext.trim().trim_start_matches('.')))
                .collect::<Vec<_>>()
                .join("|");
            let re = RegexBuilder::new(&format!(r"\.({})$", alternatives))
                .case_insensitive(true)
                .build()
                .map_err(|e| FilterError::InvalidExtensions(extensions.join(","), e))?;
            Some(re)
        };

        Ok(Self {
            extensions,
            excluded_dirs: excluded_dirs.to_vec(),
            skip_hidden,
        })
    }

    fn is_hidden(segment: &str) -> bool {
        segment.starts_with('.') && segment != "." && segment != ".."
    }

    pub fn accepts(&self, relative: &str) -> bool {
        let mut parts = segments(relative).peekable();
        while let Some(part) = parts.next() {
            if self.skip_hidden && Self::is_hidden(part) {
                return false;
            }
            let is_dir = parts.peek().is_some();
            if is_dir && self.excluded_dirs.iter().any(|dir| dir == part) {
                return false;
            }
        }

        match &self.extensions {
            Some(re) => re.is_match(relative),
            None => true,
        }
    }
}
