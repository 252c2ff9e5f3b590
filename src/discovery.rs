/**
 * File discovery via glob patterns over the input tree
 */

use glob::{glob_with, MatchOptions, Pattern};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::OrganizeError;

/// Find every regular file under `root` whose extension is one of
/// `extensions` (exact match). The result is sorted and deduplicated.
pub fn discover(
    root: &Path,
    extensions: &[String],
    recursive: bool,
) -> Result<Vec<PathBuf>, OrganizeError> {
    let directories = if recursive {
        subdirectories(root)
    } else {
        vec![root.to_path_buf()]
    };
    info!(
        "Scanning {} director{} under {} (recursive: {})",
        directories.len(),
        if directories.len() == 1 { "y" } else { "ies" },
        root.display(),
        recursive
    );

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        // hidden files such as `._IMG_1.jpg` are never pictures
        require_literal_leading_dot: true,
    };

    let mut files = BTreeSet::new();
    for directory in &directories {
        for pattern in patterns_for(directory, extensions) {
            let paths = glob_with(&pattern, options).map_err(|source| OrganizeError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() => {
                        files.insert(path);
                    }
                    Ok(path) => debug!("Ignoring non-file match: {}", path.display()),
                    Err(e) => warn!("Cannot read {}: {}", e.path().display(), e.error()),
                }
            }
        }
    }

    if files.is_empty() {
        return Err(OrganizeError::NoMatchingFiles(root.to_path_buf()));
    }

    let files: Vec<PathBuf> = files.into_iter().collect();
    info!("Found {} files", files.len());
    for file in &files {
        info!("  {}", file.display());
    }
    Ok(files)
}

/// One `<dir>/*.<ext>` pattern per extension, with the directory part
/// escaped so it matches literally.
fn patterns_for(directory: &Path, extensions: &[String]) -> Vec<String> {
    if directory.to_str().is_none() {
        warn!(
            "Directory name is not valid UTF-8, its files cannot be matched: {}",
            directory.display()
        );
    }
    let escaped_dir = Pattern::escape(&directory.to_string_lossy());
    extensions
        .iter()
        .map(|ext| {
            let file_pattern = format!("*.{}", Pattern::escape(ext));
            Path::new(&escaped_dir)
                .join(file_pattern)
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

/// `root` and every directory below it.
fn subdirectories(root: &Path) -> Vec<PathBuf> {
    let mut directories = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => directories.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry: {}", e),
        }
    }
    directories
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flat_scan_ignores_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.jpg"));
        touch(&dir.path().join("a.JPG"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("sub/c.jpg"));

        let files = discover(dir.path(), &exts(&["jpg", "JPG"]), false).unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("a.JPG"), dir.path().join("b.jpg")]
        );
    }

    #[test]
    fn recursive_scan_descends() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("sub/deeper/c.jpg"));
        touch(&dir.path().join("sub/b.png"));

        let files = discover(dir.path(), &exts(&["jpg"]), true).unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("a.jpg"), dir.path().join("sub/deeper/c.jpg")]
        );
    }

    #[test]
    fn extension_match_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.Jpg"));
        touch(&dir.path().join("b.jpg"));

        let files = discover(dir.path(), &exts(&["jpg"]), false).unwrap();

        assert_eq!(files, vec![dir.path().join("b.jpg")]);
    }

    #[test]
    fn overlapping_extensions_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.jpg"));

        let files = discover(dir.path(), &exts(&["jpg", "jpg"]), false).unwrap();

        assert_eq!(files.len(), 1);
    }

    #[test]
    fn directories_named_like_pictures_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("album.jpg")).unwrap();
        touch(&dir.path().join("a.jpg"));

        let files = discover(dir.path(), &exts(&["jpg"]), false).unwrap();

        assert_eq!(files, vec![dir.path().join("a.jpg")]);
    }

    #[test]
    fn root_with_glob_characters_is_matched_literally() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("trip [2020]");
        touch(&root.join("a.jpg"));

        let files = discover(&root, &exts(&["jpg"]), false).unwrap();

        assert_eq!(files, vec![root.join("a.jpg")]);
    }

    #[test]
    fn hidden_files_are_not_matched() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("._IMG_1.jpg"));
        touch(&dir.path().join("IMG_1.jpg"));
        touch(&dir.path().join("sub/.hidden.jpg"));

        let files = discover(dir.path(), &exts(&["jpg"]), true).unwrap();

        assert_eq!(files, vec![dir.path().join("IMG_1.jpg")]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_directory_yields_no_match() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(OsStr::from_bytes(b"caf\xe9"));
        touch(&root.join("a.jpg"));

        assert!(patterns_for(&root, &exts(&["jpg"]))[0].contains('\u{FFFD}'));
        let err = discover(&root, &exts(&["jpg"]), false).unwrap_err();
        assert!(matches!(err, OrganizeError::NoMatchingFiles(_)));
    }

    #[test]
    fn empty_result_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.png"));

        let err = discover(dir.path(), &exts(&["jpg"]), false).unwrap_err();

        assert!(matches!(err, OrganizeError::NoMatchingFiles(_)));
    }
}
