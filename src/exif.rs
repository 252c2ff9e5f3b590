/**
 * Capture date extraction
 *
 * The pipeline only sees the `DateResolver` trait; `ExifDateResolver`
 * is the production implementation backed by kamadak-exif.
 * Lookup order:
 * 1. DateTimeOriginal
 * 2. DateTimeDigitized
 *
 * Blank and all-zero values count as absent.
 */

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use exif::{Field, In, Reader as ExifReader, Tag};
use log::{debug, trace};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Calendar date a picture was taken. No time component is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CaptureDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

impl From<NaiveDate> for CaptureDate {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month(), date.day())
    }
}

impl fmt::Display for CaptureDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Why no capture date could be determined for a file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NoDate {
    #[error("cannot open file: {0}")]
    Unreadable(String),
    #[error("no EXIF data: {0}")]
    NoExif(String),
    #[error("no capture date tag")]
    MissingTag,
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

pub trait DateResolver {
    fn resolve(&self, path: &Path) -> Result<CaptureDate, NoDate>;
}

const DATE_TAGS: [Tag; 2] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized];

#[derive(Debug, Default, Clone, Copy)]
pub struct ExifDateResolver;

impl ExifDateResolver {
    pub fn new() -> Self {
        Self
    }
}

impl DateResolver for ExifDateResolver {
    fn resolve(&self, path: &Path) -> Result<CaptureDate, NoDate> {
        debug!("Reading EXIF from: {}", path.display());

        let file = File::open(path).map_err(|e| NoDate::Unreadable(e.to_string()))?;
        let mut bufreader = BufReader::new(&file);
        let exif = ExifReader::new()
            .read_from_container(&mut bufreader)
            .map_err(|e| NoDate::NoExif(e.to_string()))?;

        capture_date_from(|tag| exif.get_field(tag, In::PRIMARY))
    }
}

/// Walk the capture date tags in priority order, skipping blank and
/// all-zero values.
fn capture_date_from<'a, F>(lookup: F) -> Result<CaptureDate, NoDate>
where
    F: Fn(Tag) -> Option<&'a Field>,
{
    let mut last_invalid = None;
    for tag in DATE_TAGS {
        let Some(field) = lookup(tag) else {
            continue;
        };
        let raw = field.display_value().to_string();
        trace!("{} = {}", tag, raw);

        if is_zero_timestamp(&raw) || raw == "unknown" {
            continue;
        }
        match parse_timestamp(&raw) {
            Some(date) => return Ok(date),
            None => last_invalid = Some(raw),
        }
    }

    Err(last_invalid.map_or(NoDate::MissingTag, NoDate::InvalidTimestamp))
}

/// Parse an EXIF (`2021:03:05 10:00:00`) or ISO (`2021-03-05 10:00:00`)
/// timestamp down to its date. Fractional seconds are dropped.
pub fn parse_timestamp(raw: &str) -> Option<CaptureDate> {
    let trimmed = raw.trim().trim_matches('"');
    let main_part = trimmed.split('.').next().unwrap_or(trimmed);

    let formats = ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(main_part, fmt).ok())
        .map(|dt| CaptureDate::from(dt.date()))
}

fn is_zero_timestamp(timestamp_str: &str) -> bool {
    timestamp_str
        .chars()
        .all(|c| matches!(c, '0' | ':' | '-' | ' ' | 'T'))
}
