use std::path::{Path, PathBuf};

use log::info;

use crate::data::filter::{annotate_existence, normalize_separators, split_by_score};
use crate::data::loader::load_file;
use crate::data::probe::ExistenceProbe;
use crate::data::writer::{write_file, write_rejects};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Run configuration and report
// ---------------------------------------------------------------------------

/// Everything one run needs.  No hardcoded paths anywhere else.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Input dataset file.
    pub input: PathBuf,
    /// Destination for the filtered dataset.
    pub output: PathBuf,
    /// Directory image paths are resolved against.
    pub base_dir: PathBuf,
    /// Optional JSONL log receiving the dropped rows.
    pub rejects: Option<PathBuf>,
}

impl RunConfig {
    /// Conventional configuration: image paths resolve against the input
    /// file's own directory, no rejects log.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let base_dir = default_base_dir(&input);
        RunConfig {
            input,
            output: output.into(),
            base_dir,
            rejects: None,
        }
    }
}

/// The input file's parent directory, falling back to the current one for
/// bare file names.
pub fn default_base_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Counts from one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Rows in the input dataset.
    pub rows_loaded: usize,
    /// Rows surviving the score gate (and written out).
    pub rows_kept: usize,
    /// Rows dropped for a missing or zero score.
    pub rows_rejected: usize,
    /// Surviving rows whose image file exists on disk.
    pub files_present: usize,
}

impl RunReport {
    /// The one line the tool prints on stdout.
    pub fn summary_line(&self) -> String {
        format!("Number of existing image files: {}", self.files_present)
    }
}

// ---------------------------------------------------------------------------
// The run itself
// ---------------------------------------------------------------------------

/// Run the whole audit: load, normalize separators, gate scores, probe file
/// existence, then persist the surviving rows (and the rejects log when
/// configured).  Any load or write failure aborts the run; an absent image
/// file never does.
pub fn run<P>(config: &RunConfig, probe: &P) -> Result<RunReport, PipelineError>
where
    P: ExistenceProbe + ?Sized,
{
    let mut dataset = load_file(&config.input)?;
    let rows_loaded = dataset.len();
    info!("loaded {rows_loaded} rows from {}", config.input.display());

    normalize_separators(&mut dataset);

    let (mut dataset, rejected) = split_by_score(dataset);
    info!(
        "dropped {} rows with missing or zero scores, {} remain",
        rejected.len(),
        dataset.len()
    );

    let files_present = annotate_existence(&mut dataset, &config.base_dir, probe);
    info!(
        "{files_present} of {} referenced files exist under {}",
        dataset.len(),
        config.base_dir.display()
    );

    if let Some(rejects_path) = &config.rejects {
        write_rejects(&rejected, rejects_path)?;
    }

    write_file(&dataset, &config.output)?;
    info!("wrote {} rows to {}", dataset.len(), config.output.display());

    Ok(RunReport {
        rows_loaded,
        rows_kept: dataset.len(),
        rows_rejected: rejected.len(),
        files_present,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::probe::FsProbe;
    use std::fs;

    /// Lay out a base directory with two real poster files and an input CSV
    /// covering the interesting rows: backslash path, zero score, missing
    /// score, and a path with no file behind it.
    fn fixture(dir: &Path) -> PathBuf {
        fs::create_dir_all(dir.join("poster_images/A")).unwrap();
        fs::write(dir.join("poster_images/A/B.jpg"), b"jpg").unwrap();
        fs::write(dir.join("poster_images/Heat.jpg"), b"jpg").unwrap();

        let input = dir.join("posters.csv");
        fs::write(
            &input,
            "title,image_path,imdb_score\n\
             Backslash,poster_images\\A\\B.jpg,7.5\n\
             Heat,poster_images/Heat.jpg,8.3\n\
             Zeroed,poster_images/Zeroed.jpg,0\n\
             Unscored,poster_images/Unscored.jpg,\n\
             Ghost,poster_images/Ghost.jpg,6.1\n",
        )
        .unwrap();
        input
    }

    #[test]
    fn end_to_end_filters_annotates_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let input = fixture(dir.path());
        let output = dir.path().join("filtered.csv");

        let mut config = RunConfig::new(&input, &output);
        config.rejects = Some(dir.path().join("rejects.jsonl"));

        let report = run(&config, &FsProbe).unwrap();
        assert_eq!(
            report,
            RunReport {
                rows_loaded: 5,
                rows_kept: 3,
                rows_rejected: 2,
                files_present: 2,
            }
        );
        assert_eq!(report.summary_line(), "Number of existing image files: 2");

        let text = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "title,image_path,imdb_score,file_exists");
        assert_eq!(lines[1], "Backslash,poster_images/A/B.jpg,7.5,true");
        assert_eq!(lines[2], "Heat,poster_images/Heat.jpg,8.3,true");
        assert_eq!(lines[3], "Ghost,poster_images/Ghost.jpg,6.1,false");
        assert_eq!(lines.len(), 4);

        let rejects = fs::read_to_string(dir.path().join("rejects.jsonl")).unwrap();
        let reject_lines: Vec<&str> = rejects.lines().collect();
        assert_eq!(reject_lines.len(), 2);
        assert!(reject_lines[0].contains("zero_score"));
        assert!(reject_lines[1].contains("missing_score"));
    }

    #[test]
    fn rerunning_on_own_output_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = fixture(dir.path());
        let first = dir.path().join("filtered.csv");
        let second = dir.path().join("filtered_again.csv");

        run(&RunConfig::new(&input, &first), &FsProbe).unwrap();
        let report = run(&RunConfig::new(&first, &second), &FsProbe).unwrap();

        // All scores are already valid, so nothing further is dropped.
        assert_eq!(report.rows_loaded, report.rows_kept);
        assert_eq!(
            fs::read_to_string(&first).unwrap(),
            fs::read_to_string(&second).unwrap()
        );
    }

    #[test]
    fn missing_input_aborts_with_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new(
            dir.path().join("nope.csv"),
            dir.path().join("filtered.csv"),
        );
        let err = run(&config, &FsProbe).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
        assert!(!config.output.exists());
    }

    #[test]
    fn unwritable_output_aborts_with_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = fixture(dir.path());
        let config = RunConfig::new(&input, dir.path().join("no_such_dir/filtered.csv"));
        let err = run(&config, &FsProbe).unwrap_err();
        assert!(matches!(err, PipelineError::Write(_)));
    }

    #[test]
    fn base_dir_defaults_to_the_input_directory() {
        assert_eq!(
            default_base_dir(Path::new("/data/posters.csv")),
            PathBuf::from("/data")
        );
        assert_eq!(default_base_dir(Path::new("posters.csv")), PathBuf::from("."));
    }
}
