/**
 * Fatal error types raised before any file is touched
 */

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Input directory does not exist: {}", .0.display())]
    InputDirMissing(PathBuf),

    #[error("Input path is not a directory: {}", .0.display())]
    InputNotDirectory(PathBuf),

    #[error("Extension not recognized: {0}")]
    UnsupportedExtension(String),

    #[error("No extension category given")]
    NoExtensions,

    #[error("No matching files found in {}", .0.display())]
    NoMatchingFiles(PathBuf),

    #[error("Offset {offset} leaves no room to number {files} files")]
    OffsetOverflow { offset: u64, files: usize },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
