//! Matchers over filesystem state.
//!
//! Every matcher here accepts a `Path`, `PathBuf`, `str` or `String`
//! candidate and performs blocking I/O when evaluated.
//!
//! Absence and wrong file kind are ordinary mismatches. Any other I/O
//! failure (permissions, unreadable contents, a corrupt archive) is not a
//! property of the candidate, so it is raised instead: the matcher logs a
//! warning and panics with a [`MatcherError::Io`] payload.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::panic;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, warn};

use crate::basic::Equals;
use crate::error::{MatcherError, Result};
use crate::matcher::{BoxMatcher, Matcher};
use crate::mismatch::{Mismatch, fail};

/// Candidate types accepted alongside `Path`.
macro_rules! path_candidates {
    ($($matcher:ty),* $(,)?) => {$(
        impl Matcher<PathBuf> for $matcher {
            fn match_value(&self, actual: &PathBuf) -> Option<Box<dyn Mismatch>> {
                Matcher::<Path>::match_value(self, actual.as_path())
            }
        }

        impl Matcher<str> for $matcher {
            fn match_value(&self, actual: &str) -> Option<Box<dyn Mismatch>> {
                Matcher::<Path>::match_value(self, Path::new(actual))
            }
        }

        impl Matcher<String> for $matcher {
            fn match_value(&self, actual: &String) -> Option<Box<dyn Mismatch>> {
                Matcher::<Path>::match_value(self, Path::new(actual))
            }
        }
    )*};
}

fn raise_io(path: &Path, source: io::Error) -> ! {
    warn!(path = %path.display(), error = %source, "filesystem check failed");
    panic::panic_any(MatcherError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn exists(path: &Path) -> bool {
    path.try_exists()
        .unwrap_or_else(|source| raise_io(path, source))
}

fn check_exists(path: &Path) -> Option<Box<dyn Mismatch>> {
    if exists(path) {
        return None;
    }
    fail(format!("{} does not exist.", path.display()))
}

// =============================================================================
// Existence
// =============================================================================

/// Matches a path that exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathExists;

impl PathExists {
    /// Creates the matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl fmt::Display for PathExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PathExists()")
    }
}

impl Matcher<Path> for PathExists {
    fn match_value(&self, actual: &Path) -> Option<Box<dyn Mismatch>> {
        check_exists(actual)
    }
}

/// Matches a path that exists and is a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirExists;

impl DirExists {
    /// Creates the matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl fmt::Display for DirExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DirExists()")
    }
}

impl Matcher<Path> for DirExists {
    fn match_value(&self, actual: &Path) -> Option<Box<dyn Mismatch>> {
        if let Some(mismatch) = check_exists(actual) {
            return Some(mismatch);
        }
        if actual.is_dir() {
            return None;
        }
        fail(format!("{} is not a directory.", actual.display()))
    }
}

/// Matches a path that exists and is a regular file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileExists;

impl FileExists {
    /// Creates the matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl fmt::Display for FileExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FileExists()")
    }
}

impl Matcher<Path> for FileExists {
    fn match_value(&self, actual: &Path) -> Option<Box<dyn Mismatch>> {
        if let Some(mismatch) = check_exists(actual) {
            return Some(mismatch);
        }
        if actual.is_file() {
            return None;
        }
        fail(format!("{} is not a file.", actual.display()))
    }
}

// =============================================================================
// Contents
// =============================================================================

/// Matches a directory by its sorted list of entry names.
///
/// ```rust,no_run
/// use matchkit::{DirContains, HasLength, Matcher};
///
/// let exact = DirContains::filenames(["Cargo.toml", "src"]);
/// let three = DirContains::matching(HasLength::new(3));
/// assert!(exact.is_match("."));
/// assert!(!three.is_match("/definitely/not/here"));
/// ```
pub struct DirContains {
    check: BoxMatcher<Vec<String>>,
}

impl DirContains {
    /// Builds from exactly one of `filenames` or `matcher`.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::ConflictingOptions`] when both are supplied
    /// and [`MatcherError::MissingOption`] when neither is.
    pub fn new(
        filenames: Option<Vec<String>>,
        matcher: Option<BoxMatcher<Vec<String>>>,
    ) -> Result<Self> {
        match (filenames, matcher) {
            (Some(_), Some(_)) => Err(MatcherError::ConflictingOptions {
                matcher: "DirContains",
                first: "filenames",
                second: "matcher",
            }),
            (None, None) => Err(MatcherError::MissingOption {
                matcher: "DirContains",
                first: "filenames",
                second: "matcher",
            }),
            (Some(filenames), None) => Ok(Self::filenames(filenames)),
            (None, Some(matcher)) => Ok(Self { check: matcher }),
        }
    }

    /// Requires the directory to hold exactly `filenames`, in any order.
    pub fn filenames<S: Into<String>>(filenames: impl IntoIterator<Item = S>) -> Self {
        let mut filenames: Vec<String> = filenames.into_iter().map(Into::into).collect();
        filenames.sort();
        Self {
            check: Box::new(Equals::new(filenames)),
        }
    }

    /// Applies `matcher` to the sorted entry names.
    pub fn matching(matcher: impl Matcher<Vec<String>> + 'static) -> Self {
        Self {
            check: Box::new(matcher),
        }
    }
}

impl fmt::Display for DirContains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirContains({})", self.check)
    }
}

impl Matcher<Path> for DirContains {
    fn match_value(&self, actual: &Path) -> Option<Box<dyn Mismatch>> {
        if let Some(mismatch) = DirExists.match_value(actual) {
            return Some(mismatch);
        }
        let listing = list_dir(actual).unwrap_or_else(|source| raise_io(actual, source));
        self.check.match_value(&listing)
    }
}

fn list_dir(path: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(path)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    debug!(path = %path.display(), entries = names.len(), "read directory");
    Ok(names)
}

/// Matches a file by its text contents.
pub struct FileContains {
    check: BoxMatcher<String>,
}

impl FileContains {
    /// Builds from exactly one of `contents` or `matcher`.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::ConflictingOptions`] when both are supplied
    /// and [`MatcherError::MissingOption`] when neither is.
    pub fn new(contents: Option<String>, matcher: Option<BoxMatcher<String>>) -> Result<Self> {
        match (contents, matcher) {
            (Some(_), Some(_)) => Err(MatcherError::ConflictingOptions {
                matcher: "FileContains",
                first: "contents",
                second: "matcher",
            }),
            (None, None) => Err(MatcherError::MissingOption {
                matcher: "FileContains",
                first: "contents",
                second: "matcher",
            }),
            (Some(contents), None) => Ok(Self::contents(contents)),
            (None, Some(matcher)) => Ok(Self { check: matcher }),
        }
    }

    /// Requires the file to contain exactly `contents`.
    pub fn contents(contents: impl Into<String>) -> Self {
        Self {
            check: Box::new(Equals::new(contents.into())),
        }
    }

    /// Applies `matcher` to the file's text.
    pub fn matching(matcher: impl Matcher<String> + 'static) -> Self {
        Self {
            check: Box::new(matcher),
        }
    }
}

impl fmt::Display for FileContains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileContains({})", self.check)
    }
}

impl Matcher<Path> for FileContains {
    fn match_value(&self, actual: &Path) -> Option<Box<dyn Mismatch>> {
        if let Some(mismatch) = check_exists(actual) {
            return Some(mismatch);
        }
        let text = fs::read_to_string(actual).unwrap_or_else(|source| raise_io(actual, source));
        debug!(path = %actual.display(), bytes = text.len(), "read file");
        self.check.match_value(&text)
    }
}

// =============================================================================
// Metadata
// =============================================================================

/// Matches a path whose permission bits render as the given octal string.
///
/// Only the last four octal digits of the mode are compared, so a regular
/// file created with mode `0644` matches `HasPermissions::new("0644")`.
#[cfg(unix)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasPermissions {
    octal: String,
}

#[cfg(unix)]
impl HasPermissions {
    /// Expects the mode to render as `octal`, e.g. `"0755"`.
    pub fn new(octal: impl Into<String>) -> Self {
        Self {
            octal: octal.into(),
        }
    }
}

#[cfg(unix)]
impl fmt::Display for HasPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HasPermissions({:?})", self.octal)
    }
}

#[cfg(unix)]
impl Matcher<Path> for HasPermissions {
    fn match_value(&self, actual: &Path) -> Option<Box<dyn Mismatch>> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(actual).unwrap_or_else(|source| raise_io(actual, source));
        let mode = format!("{:04o}", metadata.permissions().mode() & 0o7777);
        Equals::new(self.octal.as_str()).match_value(&mode.as_str())
    }
}

#[cfg(unix)]
path_candidates!(HasPermissions);

/// Matches a path naming the same location as another.
///
/// Both sides are made absolute against the current directory and have
/// symlinks resolved as far as the path exists, so paths that do not exist
/// yet can still be compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamePath {
    path: PathBuf,
}

impl SamePath {
    /// Compares candidates against `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Display for SamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SamePath({:?})", self.path)
    }
}

impl Matcher<Path> for SamePath {
    fn match_value(&self, actual: &Path) -> Option<Box<dyn Mismatch>> {
        let expected = resolve(&self.path).unwrap_or_else(|source| raise_io(&self.path, source));
        let actual_resolved = resolve(actual).unwrap_or_else(|source| raise_io(actual, source));
        Equals::new(expected).match_value(&actual_resolved)
    }
}

/// Absolute path with the longest existing prefix canonicalized and the
/// remainder normalized lexically.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    for ancestor in absolute.ancestors() {
        if !ancestor.try_exists()? {
            continue;
        }
        let rest = absolute.strip_prefix(ancestor).map_err(io::Error::other)?;
        let mut resolved = fs::canonicalize(ancestor)?;
        for component in rest.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::CurDir => {}
                other => resolved.push(other),
            }
        }
        return Ok(resolved);
    }
    Ok(absolute)
}

// =============================================================================
// Archives
// =============================================================================

/// Matches a tar archive by the names of its members.
///
/// Plain, GNU and PAX archives are read, optionally gzip-compressed. Names
/// are compared sorted, with directory members listed without their
/// trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarballContains {
    names: Vec<String>,
}

impl TarballContains {
    /// Expects exactly the member `names`, in any order.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        Self { names }
    }
}

impl fmt::Display for TarballContains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TarballContains({:?})", self.names)
    }
}

impl Matcher<Path> for TarballContains {
    fn match_value(&self, actual: &Path) -> Option<Box<dyn Mismatch>> {
        if let Some(mismatch) = FileExists.match_value(actual) {
            return Some(mismatch);
        }
        let members = tar_members(actual).unwrap_or_else(|source| raise_io(actual, source));
        Equals::new(self.names.clone()).match_value(&members)
    }
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

fn is_gzip(file: &mut File) -> io::Result<bool> {
    let mut magic = [0_u8; 2];
    let gzipped = match file.read_exact(&mut magic) {
        Ok(()) => magic == GZIP_MAGIC,
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(error) => return Err(error),
    };
    file.seek(SeekFrom::Start(0))?;
    Ok(gzipped)
}

fn tar_members(path: &Path) -> io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    let gzipped = is_gzip(&mut file)?;
    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut archive = Archive::new(reader);
    let mut names = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let name = raw.trim_end_matches('/');
        names.push(if name.is_empty() { raw } else { name.to_string() });
    }
    names.sort();
    debug!(path = %path.display(), members = names.len(), gzipped, "read archive");
    Ok(names)
}

path_candidates!(
    PathExists,
    DirExists,
    FileExists,
    DirContains,
    FileContains,
    SamePath,
    TarballContains,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Contains;
    use tempfile::TempDir;

    fn describe<M: Matcher<Path>>(matcher: &M, path: &Path) -> Option<String> {
        matcher.match_value(path).map(|m| m.describe())
    }

    #[test]
    fn existence_messages() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        let missing = dir.path().join("missing");
        fs::write(&file, "x").unwrap();

        assert_eq!(describe(&PathExists, dir.path()), None);
        assert_eq!(
            describe(&PathExists, &missing),
            Some(format!("{} does not exist.", missing.display()))
        );
        assert_eq!(describe(&DirExists, dir.path()), None);
        assert_eq!(
            describe(&DirExists, &file),
            Some(format!("{} is not a directory.", file.display()))
        );
        assert_eq!(describe(&FileExists, &file), None);
        assert_eq!(
            describe(&FileExists, dir.path()),
            Some(format!("{} is not a file.", dir.path().display()))
        );
        assert_eq!(
            describe(&FileExists, &missing),
            Some(format!("{} does not exist.", missing.display()))
        );
    }

    #[test]
    fn option_constructors_reject_bad_combinations() {
        assert!(matches!(
            DirContains::new(None, None),
            Err(MatcherError::MissingOption { .. })
        ));
        assert!(matches!(
            DirContains::new(Some(vec![]), Some(Box::new(Equals::new(Vec::<String>::new())))),
            Err(MatcherError::ConflictingOptions { .. })
        ));
        let error = FileContains::new(None, None).err().unwrap();
        assert_eq!(
            error.to_string(),
            "FileContains: must supply one of contents or matcher"
        );
        assert!(FileContains::new(Some("x".into()), None).is_ok());
    }

    #[test]
    fn dir_contains_sorts_both_sides() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b"), "").unwrap();
        fs::write(dir.path().join("a"), "").unwrap();

        assert_eq!(describe(&DirContains::filenames(["b", "a"]), dir.path()), None);
        assert_eq!(
            describe(&DirContains::filenames(["a"]), dir.path()),
            Some("[\"a\"] != [\"a\", \"b\"]".into())
        );
        assert_eq!(
            describe(&DirContains::matching(Contains::new("b".to_string())), dir.path()),
            None
        );
    }

    #[test]
    fn file_contains_reads_text() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("greeting");
        fs::write(&file, "hello").unwrap();

        assert_eq!(describe(&FileContains::contents("hello"), &file), None);
        assert_eq!(
            describe(&FileContains::contents("bye"), &file),
            Some("\"bye\" != \"hello\"".into())
        );
    }

    #[test]
    fn same_path_resolves_missing_tail() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("not").join("there");
        let dotted = dir.path().join(".").join("not").join("there");
        assert_eq!(describe(&SamePath::new(&nested), &dotted), None);
        assert!(describe(&SamePath::new(&nested), dir.path()).is_some());
    }

    #[test]
    fn same_path_collapses_parent_of_missing_component() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("x");
        let detour = dir.path().join("nope").join("..").join("x");
        assert_eq!(describe(&SamePath::new(&target), &detour), None);
        assert_eq!(describe(&SamePath::new(&detour), &target), None);
    }

    #[test]
    fn resolve_keeps_existing_path_without_trailing_separator() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve(dir.path()).unwrap();
        assert_eq!(resolved, fs::canonicalize(dir.path()).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn has_permissions_compares_octal_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("script");
        fs::write(&file, "").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o750)).unwrap();

        assert_eq!(describe(&HasPermissions::new("0750"), &file), None);
        assert_eq!(
            describe(&HasPermissions::new("0644"), &file),
            Some("\"0644\" != \"0750\"".into())
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(PathExists.to_string(), "PathExists()");
        assert_eq!(
            DirContains::filenames(["b", "a"]).to_string(),
            "DirContains(Equals([\"a\", \"b\"]))"
        );
        assert_eq!(
            FileContains::contents("x").to_string(),
            "FileContains(Equals(\"x\"))"
        );
        assert_eq!(
            TarballContains::new(["b", "a"]).to_string(),
            "TarballContains([\"a\", \"b\"])"
        );
    }
}
