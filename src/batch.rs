//! Batch processing of input files.
//!
//! Each file runs through its own pipeline. A file that fails to parse is
//! reported and abandoned; the batch goes on with the next file.

use crate::error::Result;
use crate::format::Format;
use crate::reader::{Chunk, ChunkReader};
use crate::record::Label;
use crate::source::{FixEdit, LineSource};
use crate::tables::tables;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Why a file was abandoned, with the position reached.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub message: String,
    pub line: Option<u32>,
    /// Embedded file `line` counts in, when it is not the input itself
    pub file: Option<String>,
    /// Groups completed before the failure
    pub groups: usize,
    /// Chunks completed before the failure
    pub chunks: usize,
}

/// Outcome of one file.
#[derive(Debug, Default)]
pub struct FileReport {
    pub path: PathBuf,
    pub format: Option<Format>,
    pub chunks: Vec<Chunk>,
    pub groups: usize,
    /// Chunks that carry a board number
    pub boards: usize,
    pub quirks: BTreeMap<&'static str, usize>,
    pub failure: Option<FileFailure>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

/// `<input>.fix`, or the same file name under `fix_dir`.
pub fn fix_path(path: &Path, fix_dir: Option<&Path>) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".fix");
    match fix_dir {
        Some(dir) => dir.join(name),
        None => path.with_file_name(name),
    }
}

fn load_fixes(path: &Path, fix_dir: Option<&Path>) -> Result<Vec<FixEdit>> {
    let fix = fix_path(path, fix_dir);
    if !fix.exists() {
        return Ok(Vec::new());
    }
    let fixes = FixEdit::load(&fix)?;
    info!("{}: {} fixes from {}", path.display(), fixes.len(), fix.display());
    Ok(fixes)
}

/// Read every chunk of one file. Never panics and never returns an error:
/// a failure is recorded in the report together with the counters reached.
pub fn process_file(path: &Path, format: Option<Format>, fix_dir: Option<&Path>) -> FileReport {
    let mut report = FileReport {
        path: path.to_path_buf(),
        format: format.or_else(|| Format::from_path(path)),
        ..FileReport::default()
    };
    let name = path.display().to_string();

    let Some(format) = report.format else {
        report.failure = Some(FileFailure {
            message: format!("{}: unknown format", name),
            line: None,
            file: None,
            groups: 0,
            chunks: 0,
        });
        warn!("{}: no format given and none implied by the extension", name);
        return report;
    };

    let opened = load_fixes(path, fix_dir).and_then(|fixes| LineSource::open(path, format, &fixes));
    let source = match opened {
        Ok(source) => source,
        Err(e) => {
            error!("{}: {}", name, e);
            report.failure = Some(FileFailure {
                message: format!("{}: {}", name, e),
                line: e.line(),
                file: e.file().map(str::to_string),
                groups: 0,
                chunks: 0,
            });
            return report;
        }
    };

    let mut reader = ChunkReader::new(source);
    while let Some(item) = reader.next() {
        match item {
            Ok(chunk) => {
                if chunk.record.is_set(Label::BoardNo) {
                    report.boards += 1;
                }
                report.chunks.push(chunk);
            }
            Err(e) => {
                error!(
                    "{}: {} (group {}, chunk {}, board {})",
                    name,
                    e,
                    reader.groups_read(),
                    reader.chunks_read(),
                    report.boards
                );
                report.failure = Some(FileFailure {
                    message: format!("{}: {}", name, e),
                    line: e.line(),
                    file: e.file().map(str::to_string),
                    groups: reader.groups_read(),
                    chunks: reader.chunks_read(),
                });
            }
        }
    }

    report.groups = reader.groups_read();
    report.quirks = reader.source().quirks().clone();
    for (quirk, count) in &report.quirks {
        info!("{}: tolerated {} x {}", name, quirk, count);
    }
    info!(
        "{}: {} chunks, {} groups, {} boards",
        name,
        report.chunks.len(),
        report.groups,
        report.boards
    );
    report
}

/// Process files on a pool of `threads` workers. Reports come back in input
/// order.
pub fn run_batch(
    paths: &[PathBuf],
    format: Option<Format>,
    fix_dir: Option<&Path>,
    threads: usize,
) -> Vec<FileReport> {
    // Build the shared tables before any worker needs them
    let _ = tables();

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            warn!("thread pool unavailable ({}), running sequentially", e);
            return paths
                .iter()
                .map(|p| process_file(p, format, fix_dir))
                .collect();
        }
    };

    debug!("processing {} files on {} threads", paths.len(), threads.max(1));
    pool.install(|| {
        paths
            .par_iter()
            .map(|p| process_file(p, format, fix_dir))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fix_path() {
        assert_eq!(fix_path(Path::new("/a/b.lin"), None), PathBuf::from("/a/b.lin.fix"));
        assert_eq!(
            fix_path(Path::new("/a/b.lin"), Some(Path::new("/fixes"))),
            PathBuf::from("/fixes/b.lin.fix")
        );
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.lin");
        let bad = dir.path().join("bad.lin");
        fs::write(&good, "qx|o1|md|3SA,,,|mb|P|\nqx|o2|md|3SK,,,|\n").unwrap();
        fs::write(&bad, "qx|o1|md|3SA,,,|\nzz|what|\nqx|o2|md|3SK,,,|\n").unwrap();

        let reports = run_batch(&[bad.clone(), good.clone()], None, None, 2);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].path, bad);
        let failure = reports[0].failure.as_ref().unwrap();
        assert_eq!(failure.line, Some(2));
        assert!(reports[1].is_ok());
        assert_eq!(reports[1].boards, 2);
    }

    #[test]
    fn test_unresolved_reference_on_first_line() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("main.lin");
        fs::write(&input, "ef|missing.lin|\nqx|o1|\nmd|3SA,,,|\nmb|P|\n").unwrap();

        let report = process_file(&input, None, None);
        let failure = report.failure.as_ref().expect("missing file must fail");
        assert_eq!(failure.line, Some(1));
        assert_eq!(failure.file, None);
        assert!(failure.message.contains("missing.lin"), "{}", failure.message);
        assert!(report.chunks.is_empty());
    }

    #[test]
    fn test_error_inside_embedded_file_names_it() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("main.lin");
        fs::write(dir.path().join("deal.lin"), "md|3SA,,,|\nzz|bad|\n").unwrap();
        fs::write(&input, "qx|o1|\nef|deal.lin|\n").unwrap();

        let report = process_file(&input, None, None);
        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.line, Some(2));
        assert!(failure.file.as_deref().unwrap().ends_with("deal.lin"));
        assert!(failure.message.contains("in embedded file"), "{}", failure.message);
    }

    #[test]
    fn test_sidecar_fix_applied() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("board.lin");
        fs::write(&input, "qx|o1|md|3SA,,,|\nzz|what|\n").unwrap();
        fs::write(dir.path().join("board.lin.fix"), "# drop the bad line\n2 mb|P|\n").unwrap();

        let report = process_file(&input, None, None);
        assert!(report.is_ok(), "{:?}", report.failure);
        assert_eq!(report.chunks[0].record.get(Label::Auction), Some("P"));
    }

    #[test]
    fn test_unknown_extension() {
        let report = process_file(Path::new("notes.doc"), None, None);
        assert!(report.failure.unwrap().message.contains("unknown format"));
    }
}
