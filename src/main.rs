use anyhow::Result;
use chrono::{DateTime, Local};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, info_span, warn};

use crate::args::{Args, Backend};
use crate::files::filter::FileFilter;
use crate::files::plan::ImportPlan;
use crate::files::record::ImportRecord;
use crate::importer::Importer;
use crate::shell::local::LocalNamespace;
use crate::shell::{collect_files, Namespace};

mod args;
mod errors;
mod files;
mod importer;
mod logging;
mod shell;

fn main() -> ExitCode {
    let args = Args::parse();
    let run_time = Local::now();

    if let Err(e) = logging::setup_logging(args.verbose, &args.log_dir, &run_time) {
        eprintln!("Cannot set up logging: {:#}", e);
        return ExitCode::FAILURE;
    }
    info!("Program args: {:?}", args);

    match run(&args, run_time) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("An unexpected error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, run_time: DateTime<Local>) -> Result<()> {
    match args.backend() {
        Backend::Fs => import(&LocalNamespace, args, run_time),
        #[cfg(windows)]
        Backend::Shell => import(&shell::com::ShellNamespace::new()?, args, run_time),
        #[cfg(not(windows))]
        Backend::Shell => anyhow::bail!("The shell backend is only available on Windows"),
    }
}

fn import<N: Namespace>(ns: &N, args: &Args, run_time: DateTime<Local>) -> Result<()> {
    let filter = FileFilter::new(&args.extensions, &args.excluded_dirs, args.skip_hidden)?;
    let record = ImportRecord::load(&args.record_folder)?;

    let files = {
        let span = info_span!("scan");
        let _enter = span.enter();
        let source = ns.resolve_folder(&args.source)?;
        let (files, stats) = collect_files(ns, &source)?;
        info!(
            "Listed {} files in {} folders ({} repeated)",
            stats.files, stats.folders, stats.repeated
        );
        files
    };

    let plan = ImportPlan::build(&args.source, files, &record, &filter)?;
    if plan.is_empty() {
        info!("Nothing to copy");
        return Ok(());
    }
    if args.skip_copy {
        info!("Skip-copy mode activated");
        for relative in plan.relative_paths() {
            info!("Would import {}", relative);
        }
        return Ok(());
    }

    let mut importer = Importer::new(ns, &args.destination, &args.record_folder, run_time);
    let summary = if args.batch {
        importer.import_batch(&plan)?
    } else {
        importer.import_each(&plan)?
    };

    info!(
        "Summary: {} out of {} files successfully copied",
        summary.copied, summary.total
    );
    if !summary.failed.is_empty() {
        warn!(
            "{} files failed and will be retried next run: {:?}",
            summary.failed.len(),
            summary.failed
        );
    }
    if let Some(path) = &summary.record_file {
        info!("Imported files recorded in {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative).unwrap();
    }

    fn args(tmp: &TempDir, extra: &[&str]) -> Args {
        let source = tmp.path().join("phone").display().to_string();
        let destination = tmp.path().join("dest").display().to_string();
        let record = tmp.path().join("record").display().to_string();
        let mut argv = vec![
            "phone-import".to_string(),
            source,
            destination,
            "--record-folder".to_string(),
            record,
            "--backend".to_string(),
            "fs".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    fn record_lines(tmp: &TempDir) -> usize {
        fs::read_dir(tmp.path().join("record"))
            .unwrap()
            .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap().lines().count())
            .sum()
    }

    #[test]
    fn second_run_over_a_directory_copies_nothing_new() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("phone"), "DCIM/100APPLE/IMG_0001.JPG");
        touch(&tmp.path().join("phone"), "DCIM/100APPLE/IMG_0002.MOV");
        let args = args(&tmp, &[]);

        import(&LocalNamespace, &args, Local::now()).unwrap();
        assert!(tmp.path().join("dest/DCIM/100APPLE/IMG_0002.MOV").is_file());
        assert_eq!(record_lines(&tmp), 2);

        touch(&tmp.path().join("phone"), "DCIM/100APPLE/IMG_0003.JPG");
        fs::remove_file(tmp.path().join("dest/DCIM/100APPLE/IMG_0001.JPG")).unwrap();
        let later = Local::now() + chrono::Duration::seconds(1);
        import(&LocalNamespace, &args, later).unwrap();

        // deleted from the destination but recorded, so not copied again
        assert!(!tmp.path().join("dest/DCIM/100APPLE/IMG_0001.JPG").exists());
        assert!(tmp.path().join("dest/DCIM/100APPLE/IMG_0003.JPG").is_file());
        assert_eq!(record_lines(&tmp), 3);
    }

    #[test]
    fn runs_in_the_same_second_keep_both_records() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("phone"), "a.jpg");
        let args = args(&tmp, &[]);
        let run_time = Local::now();

        import(&LocalNamespace, &args, run_time).unwrap();
        touch(&tmp.path().join("phone"), "b.jpg");
        import(&LocalNamespace, &args, run_time).unwrap();

        let record = ImportRecord::load(&tmp.path().join("record")).unwrap();
        assert!(record.contains("a.jpg"));
        assert!(record.contains("b.jpg"));
        assert_eq!(fs::read_dir(tmp.path().join("record")).unwrap().count(), 2);
    }

    #[test]
    fn dot_entries_are_copied_by_default() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("phone"), "DCIM/.hidden_album/IMG_0001.JPG");
        touch(&tmp.path().join("phone"), ".IMG_0002.JPG");

        import(&LocalNamespace, &args(&tmp, &[]), Local::now()).unwrap();

        assert!(tmp.path().join("dest/DCIM/.hidden_album/IMG_0001.JPG").is_file());
        assert!(tmp.path().join("dest/.IMG_0002.JPG").is_file());
        assert_eq!(record_lines(&tmp), 2);
    }

    #[test]
    fn skip_hidden_leaves_dot_entries_behind() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("phone"), ".IMG_0002.JPG");
        touch(&tmp.path().join("phone"), "IMG_0003.JPG");

        import(&LocalNamespace, &args(&tmp, &["--skip-hidden"]), Local::now()).unwrap();

        assert!(!tmp.path().join("dest/.IMG_0002.JPG").exists());
        assert!(tmp.path().join("dest/IMG_0003.JPG").is_file());
    }

    #[test]
    fn skip_copy_copies_and_records_nothing() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("phone"), "DCIM/IMG_0001.JPG");
        let args = args(&tmp, &["--skip-copy"]);

        import(&LocalNamespace, &args, Local::now()).unwrap();

        assert!(!tmp.path().join("dest").exists());
        assert_eq!(record_lines(&tmp), 0);
    }

    #[test]
    fn missing_source_aborts_the_run() {
        let tmp = TempDir::new().unwrap();
        let args = args(&tmp, &[]);

        let err = import(&LocalNamespace, &args, Local::now()).unwrap_err();

        assert!(format!("{:#}", err).contains("(at `phone`)"));
    }
}
