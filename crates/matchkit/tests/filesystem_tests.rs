#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]

//! Filesystem matchers against real directories.

use std::fs::{self, File};
use std::io::{self, Write as _};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use matchkit::{
    Contains, DirContains, DirExists, Equals, FileContains, FileExists, HasLength, Matcher,
    MatchesRegex, MatcherError, MatchesAll, PathExists, SamePath, TarballContains,
};
use flate2::Compression;
use flate2::write::GzEncoder;
use tar::{Builder, EntryType, Header};
use tempfile::TempDir;

// =============================================================================
// Test helpers
// =============================================================================

/// Routes the matchers' debug events into the captured test output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn make_dir() -> TempDir {
    init_tracing();
    TempDir::new().unwrap()
}

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap();
    path
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    path
}

/// Builds an in-memory tar archive with the given builder steps.
fn tarball(build: impl FnOnce(&mut Builder<Vec<u8>>)) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    build(&mut builder);
    builder.into_inner().unwrap()
}

fn append_file(builder: &mut Builder<Vec<u8>>, mut header: Header, name: &str, content: &str) {
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    builder
        .append_data(&mut header, name, content.as_bytes())
        .unwrap();
}

/// Appends a directory member whose stored name keeps its trailing slash.
fn append_dir(builder: &mut Builder<Vec<u8>>, name: &str) {
    let mut header = Header::new_ustar();
    header.set_entry_type(EntryType::Directory);
    header.set_size(0);
    header.set_mode(0o755);
    header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
    header.set_cksum();
    builder.append(&header, io::empty()).unwrap();
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn write_archive(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn members(path: &Path) -> Option<String> {
    TarballContains::new(Vec::<String>::new())
        .match_value(path)
        .map(|m| m.describe())
}

// =============================================================================
// Existence
// =============================================================================

mod existence_tests {
    use super::*;

    #[test]
    fn accepts_every_path_candidate_type() {
        let dir = make_dir();
        let file = touch(dir.path(), "a.txt");
        let as_string = file.display().to_string();

        assert!(PathExists.is_match(&file));
        assert!(PathExists.is_match(file.as_path()));
        assert!(PathExists.is_match(as_string.as_str()));
        assert!(PathExists.is_match(&as_string));
    }

    #[test]
    fn missing_paths_fail_every_existence_check() {
        let dir = make_dir();
        let missing = dir.path().join("nope");
        let expected = format!("{} does not exist.", missing.display());

        for description in [
            PathExists.match_value(&missing).map(|m| m.describe()),
            DirExists.match_value(&missing).map(|m| m.describe()),
            FileExists.match_value(&missing).map(|m| m.describe()),
        ] {
            assert_eq!(description.as_deref(), Some(expected.as_str()));
        }
    }

    #[test]
    fn kind_checks() {
        let dir = make_dir();
        let file = touch(dir.path(), "a.txt");
        assert!(DirExists.is_match(dir.path()));
        assert!(FileExists.is_match(&file));
        assert_eq!(
            DirExists.match_value(&file).unwrap().describe(),
            format!("{} is not a directory.", file.display())
        );
    }
}

// =============================================================================
// Contents
// =============================================================================

mod contents_tests {
    use super::*;

    #[test]
    fn dir_contains_lists_entries() {
        let dir = make_dir();
        touch(dir.path(), "zeta");
        touch(dir.path(), "alpha");
        fs::create_dir(dir.path().join("sub")).unwrap();

        assert!(DirContains::filenames(["sub", "alpha", "zeta"]).is_match(dir.path()));
        assert!(DirContains::matching(HasLength::new(3)).is_match(dir.path()));
        assert_eq!(
            DirContains::filenames(["alpha"])
                .match_value(dir.path())
                .unwrap()
                .describe(),
            "[\"alpha\"] != [\"alpha\", \"sub\", \"zeta\"]"
        );
    }

    #[test]
    fn dir_contains_on_file_reports_kind() {
        let dir = make_dir();
        let file = touch(dir.path(), "plain");
        assert_eq!(
            DirContains::filenames(["x"]).match_value(&file).unwrap().describe(),
            format!("{} is not a directory.", file.display())
        );
    }

    #[test]
    fn dir_contains_constructor_options() {
        let both = DirContains::new(Some(vec!["a".into()]), Some(HasLength::new(1).boxed()));
        assert!(matches!(both, Err(MatcherError::ConflictingOptions { .. })));
        let from_matcher = DirContains::new(None, Some(Contains::new("a".to_string()).boxed()));
        assert!(from_matcher.is_ok());
    }

    #[test]
    fn file_contains_with_matcher() {
        let dir = make_dir();
        let file = write_file(dir.path(), "log.txt", "started\nfinished\n");

        let matcher = FileContains::matching(MatchesAll::new([
            MatchesRegex::new("started").unwrap().boxed(),
            Contains::new("finished").boxed(),
        ]));
        assert!(matcher.is_match(&file));
        assert!(FileContains::contents("started\nfinished\n").is_match(&file));
        assert_eq!(
            FileContains::contents("x")
                .match_value(&dir.path().join("absent"))
                .unwrap()
                .describe(),
            format!("{} does not exist.", dir.path().join("absent").display())
        );
    }

    #[test]
    fn unreadable_contents_raise_io_error() {
        let dir = make_dir();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            FileContains::contents("x").is_match(dir.path())
        }));
        let payload = outcome.unwrap_err();
        let error = payload.downcast_ref::<MatcherError>().unwrap();
        assert!(matches!(error, MatcherError::Io { .. }));
    }
}

// =============================================================================
// Paths and archives
// =============================================================================

mod path_tests {
    use super::*;

    #[test]
    fn same_path_normalizes_both_sides() {
        let dir = make_dir();
        let file = touch(dir.path(), "target");
        let indirect = dir.path().join(".").join("target");
        assert!(SamePath::new(&file).is_match(&indirect));
        assert!(!SamePath::new(&file).is_match(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn same_path_follows_symlinks() {
        let dir = make_dir();
        let real = touch(dir.path(), "real");
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(SamePath::new(&real).is_match(&link));
    }

    #[cfg(unix)]
    #[test]
    fn has_permissions() {
        use matchkit::HasPermissions;
        use std::os::unix::fs::PermissionsExt;

        let dir = make_dir();
        let file = touch(dir.path(), "run.sh");
        fs::set_permissions(&file, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(HasPermissions::new("0755").is_match(&file));
        assert!(!HasPermissions::new("0700").is_match(&file));
        assert_eq!(HasPermissions::new("0755").to_string(), "HasPermissions(\"0755\")");
    }

    #[test]
    fn same_path_collapses_parent_of_missing_directory() {
        let dir = make_dir();
        let target = dir.path().join("x");
        let detour = dir.path().join("nope").join("..").join("x");
        assert!(SamePath::new(&target).is_match(&detour));
    }
    #[test]
    fn equals_over_listing_matches_dir_contains() {
        let dir = make_dir();
        touch(dir.path(), "only");
        let via_equals = DirContains::matching(Equals::new(vec!["only".to_string()]));
        assert!(via_equals.is_match(dir.path()));
    }
}

// =============================================================================
// Archives
// =============================================================================

mod tarball_tests {
    use super::*;

    #[test]
    fn ustar_members_are_sorted() {
        let dir = make_dir();
        let bytes = tarball(|b| {
            append_file(b, Header::new_ustar(), "b.txt", "bee");
            append_file(b, Header::new_ustar(), "a.txt", "ay");
        });
        let path = write_archive(dir.path(), "bundle.tar", &bytes);

        assert!(TarballContains::new(["b.txt", "a.txt"]).is_match(&path));
        assert_eq!(
            TarballContains::new(["a.txt"]).match_value(&path).unwrap().describe(),
            "[\"a.txt\"] != [\"a.txt\", \"b.txt\"]"
        );
    }

    #[test]
    fn pax_path_records_are_honoured() {
        let dir = make_dir();
        let bytes = tarball(|b| {
            b.append_pax_extensions([("path", b"pax/renamed.txt".as_slice())])
                .unwrap();
            append_file(b, Header::new_ustar(), "placeholder", "one");
            append_file(b, Header::new_ustar(), "plain.txt", "two");
        });
        let path = write_archive(dir.path(), "pax.tar", &bytes);

        assert!(TarballContains::new(["pax/renamed.txt", "plain.txt"]).is_match(&path));
        assert_eq!(
            members(&path).unwrap(),
            "[] != [\"pax/renamed.txt\", \"plain.txt\"]"
        );
    }

    #[test]
    fn gzip_archives_are_decompressed() {
        let dir = make_dir();
        let bytes = tarball(|b| {
            append_file(b, Header::new_gnu(), "a", "1");
            append_file(b, Header::new_gnu(), "b", "2");
        });
        let path = write_archive(dir.path(), "bundle.tar.gz", &gzip(&bytes));

        assert!(TarballContains::new(["a", "b"]).is_match(&path));
    }

    #[test]
    fn directory_members_drop_trailing_slash() {
        let dir = make_dir();
        let bytes = tarball(|b| {
            append_dir(b, "d/");
            append_file(b, Header::new_ustar(), "d/c", "see");
        });
        let path = write_archive(dir.path(), "tree.tar", &bytes);

        assert!(TarballContains::new(["d", "d/c"]).is_match(&path));
        assert_eq!(
            TarballContains::new(["d/c"]).match_value(&path).unwrap().describe(),
            "[\"d/c\"] != [\"d\", \"d/c\"]"
        );
    }

    #[test]
    fn gnu_long_names_are_read_in_full() {
        let dir = make_dir();
        let long_name = format!("{}file.txt", "deep/".repeat(25));
        assert!(long_name.len() > 100);
        let bytes = tarball(|b| append_file(b, Header::new_gnu(), &long_name, "x"));
        let path = write_archive(dir.path(), "long.tar", &bytes);

        assert!(TarballContains::new([long_name.as_str()]).is_match(&path));
    }

    #[test]
    fn missing_archive_is_a_mismatch() {
        let dir = make_dir();
        let path = dir.path().join("none.tar");
        assert_eq!(
            TarballContains::new(["a"]).match_value(&path).unwrap().describe(),
            format!("{} does not exist.", path.display())
        );
    }

    #[test]
    fn corrupt_archive_raises_io_error() {
        let dir = make_dir();
        let path = write_file(dir.path(), "broken.tar", "not an archive");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            TarballContains::new(["a"]).is_match(&path)
        }));
        let payload = outcome.unwrap_err();
        let error = payload.downcast_ref::<MatcherError>().unwrap();
        assert!(matches!(error, MatcherError::Io { .. }));
    }
}
