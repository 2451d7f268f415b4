use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Windows shell namespace (phones show up under "This PC")
    Shell,
    /// Plain filesystem directories
    Fs,
}

impl Backend {
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Backend::Shell
        } else {
            Backend::Fs
        }
    }
}

/// Copy new photos and videos off a phone, skipping files imported by earlier runs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Folder to import from, e.g. "This PC\Apple iPhone\Internal Storage"
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Folder the files are copied into
    #[arg(value_name = "DESTINATION", value_hint = clap::ValueHint::DirPath)]
    pub destination: PathBuf,

    /// Folder holding the record files of earlier imports
    #[arg(long, visible_alias = "metadata-folder", value_name = "DIR", default_value = "./record", value_hint = clap::ValueHint::DirPath)]
    pub record_folder: PathBuf,

    /// Only list what would be imported
    #[arg(long)]
    pub skip_copy: bool,

    /// Queue all copies into a single operation instead of one per file
    #[arg(long)]
    pub batch: bool,

    /// Namespace to read the source from [default: shell on Windows, fs elsewhere]
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Only import files with these extensions (comma separated)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Skip files below folders with this name
    #[arg(long = "exclude", value_name = "NAME")]
    pub excluded_dirs: Vec<String>,

    /// Skip dot-files and files in dot-folders
    #[arg(long)]
    pub skip_hidden: bool,

    /// Folder for the run logs
    #[arg(long, value_name = "DIR", default_value = "./log", value_hint = clap::ValueHint::DirPath)]
    pub log_dir: PathBuf,

    /// Verbose mode (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_else(Backend::platform_default)
    }
}
