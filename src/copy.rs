//! Copying source images to their ASCII filenames.

use crate::mapping::{Entry, NameMapping};
use std::{
    fmt,
    fs::{self, File, FileTimes},
    io::{self, Write},
    path::Path,
};
use tracing::{debug, info};

/// Copy a file's contents, permissions, and access and modification times.
pub fn copy_with_metadata<P, Q>(from: P, to: Q) -> io::Result<u64>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let (from, to) = (from.as_ref(), to.as_ref());
    let bytes = fs::copy(from, to)?;

    let metadata = fs::metadata(from)?;
    let times = FileTimes::new()
        .set_accessed(metadata.accessed()?)
        .set_modified(metadata.modified()?);
    // The copy may be read-only; owning it is enough to set its times.
    File::open(to)?.set_times(times)?;

    Ok(bytes)
}

/// Returns if two paths refer to the same file.
fn is_same_file(a: &Path, b: &Path) -> io::Result<bool> {
    if a == b {
        return Ok(true);
    }
    if !a.exists() || !b.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CopyOptions {
    /// Report actions without touching the filesystem.
    pub dry_run: bool,
}

/// What happened to a single entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Copied(Entry),
    Missing(Entry),
}

/// Copy every entry in the mapping within `base_dir`, writing a line per entry to `out`.
///
/// Missing sources are reported and skipped. Any other error stops the run.
pub fn copy_images<P, W>(
    base_dir: P,
    mapping: &NameMapping,
    options: CopyOptions,
    mut out: W,
) -> Result<Vec<Outcome>, CopyError>
where
    P: AsRef<Path>,
    W: Write,
{
    let base_dir = base_dir.as_ref();
    let mut outcomes = Vec::with_capacity(mapping.len());

    for entry in mapping.entries() {
        let source = base_dir.join(&entry.original);
        let target = base_dir.join(&entry.target);

        if !source.exists() {
            debug!(source = %source.display(), "source missing");
            writeln!(out, "Source file not found: {}", entry.original)
                .map_err(CopyError::Report)?;
            outcomes.push(Outcome::Missing(entry.clone()));
            continue;
        }

        let same = is_same_file(&source, &target).map_err(|e| CopyError::Copy {
            original: entry.original.clone(),
            target: entry.target.clone(),
            source: e,
        })?;
        if same {
            return Err(CopyError::SameFile {
                original: entry.original.clone(),
                target: entry.target.clone(),
            });
        }

        if options.dry_run {
            info!(
                source = %source.display(),
                dest = %target.display(),
                "dry run, skipping copy"
            );
        } else {
            let bytes = copy_with_metadata(&source, &target).map_err(|e| CopyError::Copy {
                original: entry.original.clone(),
                target: entry.target.clone(),
                source: e,
            })?;
            info!(dest = %target.display(), bytes, "copied");
        }

        writeln!(out, "Copied {} -> {}", entry.original, entry.target)
            .map_err(CopyError::Report)?;
        outcomes.push(Outcome::Copied(entry.clone()));
    }

    Ok(outcomes)
}

#[derive(Debug)]
pub enum CopyError {
    /// Copying a source file that exists failed.
    Copy {
        original: String,
        target: String,
        source: io::Error,
    },

    /// The source and target are the same file.
    SameFile { original: String, target: String },

    /// Writing a report line failed.
    Report(io::Error),
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CopyError::Copy {
                original,
                target,
                source,
            } => write!(f, "couldn't copy {} -> {}: {}", original, target, source),
            CopyError::SameFile { original, target } => {
                write!(f, "{} and {} are the same file", original, target)
            }
            CopyError::Report(e) => write!(f, "couldn't write report: {}", e),
        }
    }
}

impl std::error::Error for CopyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CopyError::Copy { source, .. } => Some(source),
            CopyError::SameFile { .. } => None,
            CopyError::Report(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn run(base: &Path, mapping: &NameMapping, options: CopyOptions) -> (Vec<Outcome>, String) {
        let mut out = Vec::new();
        let outcomes = copy_images(base, mapping, options, &mut out).unwrap();
        (outcomes, String::from_utf8(out).unwrap())
    }

    #[test]
    fn present_source_is_copied_and_missing_is_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("András_Barasits.jpeg"), b"jpeg data").unwrap();

        let (outcomes, report) = run(dir.path(), &NameMapping::builtin(), CopyOptions::default());

        assert_eq!(
            report,
            "Copied András_Barasits.jpeg -> andras_barasits.jpg\n\
             Source file not found: Donát_Bali-papp.jpeg\n"
        );
        assert_eq!(
            fs::read(dir.path().join("andras_barasits.jpg")).unwrap(),
            b"jpeg data"
        );
        assert!(!dir.path().join("donat_bali_papp.jpg").exists());
        assert!(matches!(outcomes[0], Outcome::Copied(_)));
        assert!(matches!(outcomes[1], Outcome::Missing(_)));
    }

    #[test]
    fn source_is_left_in_place() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("András_Barasits.jpeg"), b"jpeg data").unwrap();
        run(dir.path(), &NameMapping::builtin(), CopyOptions::default());
        assert!(dir.path().join("András_Barasits.jpeg").exists());
    }

    #[test]
    fn nothing_found_in_empty_dir() {
        let dir = tempdir().unwrap();
        let (outcomes, report) = run(dir.path(), &NameMapping::builtin(), CopyOptions::default());
        assert!(outcomes.iter().all(|o| matches!(o, Outcome::Missing(_))));
        assert_eq!(report.lines().count(), 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn dry_run_reports_without_copying() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("András_Barasits.jpeg"), b"jpeg data").unwrap();

        let options = CopyOptions { dry_run: true };
        let (outcomes, report) = run(dir.path(), &NameMapping::builtin(), options);

        assert!(report.starts_with("Copied András_Barasits.jpeg -> andras_barasits.jpg\n"));
        assert!(matches!(outcomes[0], Outcome::Copied(_)));
        assert!(!dir.path().join("andras_barasits.jpg").exists());
    }

    #[test]
    fn existing_target_is_overwritten() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpeg"), b"new").unwrap();
        fs::write(dir.path().join("a.jpg"), b"old").unwrap();

        let mapping = NameMapping::new().with_entry(Entry::new("a.jpeg", "a.jpg"));
        run(dir.path(), &mapping, CopyOptions::default());

        assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), b"new");
    }

    #[test]
    fn entries_are_processed_in_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.png"), b"b").unwrap();
        let mapping = NameMapping::new()
            .with_entry(Entry::new("c.png", "c2.png"))
            .with_entry(Entry::new("b.png", "b2.png"))
            .with_entry(Entry::new("a.png", "a2.png"));

        let (_, report) = run(dir.path(), &mapping, CopyOptions::default());

        assert_eq!(
            report.lines().collect::<Vec<_>>(),
            [
                "Source file not found: c.png",
                "Copied b.png -> b2.png",
                "Source file not found: a.png",
            ]
        );
    }

    #[test]
    fn copy_failure_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"a").unwrap();
        let mapping = NameMapping::new().with_entry(Entry::new("a.png", "no/such/dir/a.png"));

        let res = copy_images(dir.path(), &mapping, CopyOptions::default(), io::sink());

        assert!(matches!(res, Err(CopyError::Copy { .. })));
    }

    #[test]
    fn copy_keeps_modification_time() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("from.jpg");
        let to = dir.path().join("to.jpg");
        fs::write(&from, b"data").unwrap();

        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options()
            .write(true)
            .open(&from)
            .unwrap()
            .set_modified(modified)
            .unwrap();

        assert_eq!(copy_with_metadata(&from, &to).unwrap(), 4);
        assert_eq!(fs::metadata(&to).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn entry_mapped_to_itself_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("photo.jpg"), b"precious").unwrap();
        let mapping = NameMapping::new().with_entry(Entry::derived("photo.jpg"));

        let mut out = Vec::new();
        let res = copy_images(dir.path(), &mapping, CopyOptions::default(), &mut out);

        assert!(matches!(res, Err(CopyError::SameFile { .. })));
        assert!(out.is_empty());
        assert_eq!(fs::read(dir.path().join("photo.jpg")).unwrap(), b"precious");
    }

    #[test]
    fn same_file_through_other_path_is_an_error() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.jpg"), b"precious").unwrap();
        let mapping = NameMapping::new().with_entry(Entry::new("a.jpg", "sub/../a.jpg"));

        let res = copy_images(dir.path(), &mapping, CopyOptions::default(), io::sink());

        assert!(matches!(res, Err(CopyError::SameFile { .. })));
        assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), b"precious");
    }

    #[cfg(unix)]
    #[test]
    fn read_only_source_is_copied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let from = dir.path().join("a.jpeg");
        let to = dir.path().join("a.jpg");
        fs::write(&from, b"data").unwrap();
        fs::set_permissions(&from, fs::Permissions::from_mode(0o444)).unwrap();

        assert_eq!(copy_with_metadata(&from, &to).unwrap(), 4);
        assert_eq!(fs::read(&to).unwrap(), b"data");
        assert_eq!(fs::metadata(&to).unwrap().permissions().mode() & 0o777, 0o444);
        assert_eq!(
            fs::metadata(&to).unwrap().modified().unwrap(),
            fs::metadata(&from).unwrap().modified().unwrap()
        );
    }
}
