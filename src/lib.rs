pub mod config;
pub mod discovery;
pub mod error;
pub mod exif;
pub mod extensions;
pub mod file_ops;
pub mod grouping;
pub mod naming;

pub use config::{Options, TransferMode};
pub use error::OrganizeError;
pub use exif::{CaptureDate, DateResolver, ExifDateResolver, NoDate};
pub use file_ops::{FileProcessor, FileStatus, ProcessResult, RunSummary, TransferTask};
