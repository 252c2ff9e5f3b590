/**
 * Run configuration, resolved once and passed by reference
 */

use std::path::PathBuf;

use crate::error::OrganizeError;
use crate::extensions::DEFAULT_CATEGORY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    pub fn from_delete_flag(delete: bool) -> Self {
        if delete {
            Self::Move
        } else {
            Self::Copy
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub input_dir: PathBuf,
    /// Destination root; may contain `%y`, `%m` and `%d`.
    pub output_template: String,
    /// Extension category names, e.g. `["jpg", "raw"]`.
    pub categories: Vec<String>,
    pub name_template: String,
    pub command_template: Option<String>,
    /// Zero-padding for `%n`; 0 picks the width automatically.
    pub digits: usize,
    pub offset: u64,
    pub recursive: bool,
    pub sidecar: bool,
    pub replace: bool,
    pub mode: TransferMode,
    pub quiet: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_template: String::from("."),
            categories: vec![DEFAULT_CATEGORY.to_string()],
            name_template: String::from("%f"),
            command_template: None,
            digits: 0,
            offset: 0,
            recursive: false,
            sidecar: false,
            replace: false,
            mode: TransferMode::Copy,
            quiet: false,
        }
    }
}

impl Options {
    /// Check everything that must hold before any file is touched.
    pub fn validate(&self) -> Result<(), OrganizeError> {
        if !self.input_dir.exists() {
            return Err(OrganizeError::InputDirMissing(self.input_dir.clone()));
        }
        if !self.input_dir.is_dir() {
            return Err(OrganizeError::InputNotDirectory(self.input_dir.clone()));
        }
        crate::extensions::resolve(&self.categories)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_flag_selects_move() {
        assert_eq!(TransferMode::from_delete_flag(true), TransferMode::Move);
        assert_eq!(TransferMode::from_delete_flag(false), TransferMode::Copy);
    }

    #[test]
    fn defaults_copy_jpg_with_original_names() {
        let options = Options::default();
        assert_eq!(options.mode, TransferMode::Copy);
        assert_eq!(options.categories, vec!["jpg"]);
        assert_eq!(options.name_template, "%f");
        assert!(!options.replace);
    }

    #[test]
    fn missing_input_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            input_dir: dir.path().join("nope"),
            ..Options::default()
        };
        assert!(matches!(
            options.validate(),
            Err(OrganizeError::InputDirMissing(_))
        ));
    }

    #[test]
    fn unknown_category_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            input_dir: dir.path().to_path_buf(),
            categories: vec!["gif".to_string()],
            ..Options::default()
        };
        assert!(matches!(
            options.validate(),
            Err(OrganizeError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn file_as_input_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        std::fs::write(&file, b"x").unwrap();
        let options = Options {
            input_dir: file,
            ..Options::default()
        };
        assert!(matches!(
            options.validate(),
            Err(OrganizeError::InputNotDirectory(_))
        ));
    }
}
