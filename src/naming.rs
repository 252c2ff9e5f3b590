/**
 * Folder and file name templating
 *
 * Placeholders:
 * - %y  year, 4 digits
 * - %m  month, 2 digits
 * - %d  day, 2 digits
 * - %f  original file name including extension
 * - %n  sequence number, zero-padded
 */

use regex::Regex;
use std::sync::OnceLock;

use crate::exif::CaptureDate;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new("%[ymdfn]").expect("placeholder pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Year,
    Month,
    Day,
    FileName,
    Sequence,
}

impl Placeholder {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "%y" => Some(Self::Year),
            "%m" => Some(Self::Month),
            "%d" => Some(Self::Day),
            "%f" => Some(Self::FileName),
            "%n" => Some(Self::Sequence),
            _ => None,
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Self::Year => "%y",
            Self::Month => "%m",
            Self::Day => "%d",
            Self::FileName => "%f",
            Self::Sequence => "%n",
        }
    }

    fn is_date(self) -> bool {
        matches!(self, Self::Year | Self::Month | Self::Day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Placeholder(Placeholder),
}

/// Values substituted into a template for one file.
#[derive(Debug, Clone, Copy)]
pub struct NameContext<'a> {
    pub date: CaptureDate,
    pub original_name: &'a str,
    pub sequence: u64,
    /// Minimum width of the rendered sequence number.
    pub width: usize,
}

/// A template split once into literal text and placeholders, so values
/// are never rescanned for markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<TemplatePart>,
}

impl Template {
    pub fn parse(input: &str) -> Self {
        let mut parts = Vec::new();
        let mut last = 0;

        for m in placeholder_regex().find_iter(input) {
            if m.start() > last {
                parts.push(TemplatePart::Literal(input[last..m.start()].to_string()));
            }
            if let Some(placeholder) = Placeholder::from_marker(m.as_str()) {
                parts.push(TemplatePart::Placeholder(placeholder));
            }
            last = m.end();
        }
        if last < input.len() {
            parts.push(TemplatePart::Literal(input[last..].to_string()));
        }

        Self { parts }
    }

    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.parts
            .iter()
            .any(|p| *p == TemplatePart::Placeholder(placeholder))
    }

    /// Substitute every placeholder.
    pub fn render(&self, ctx: &NameContext<'_>) -> String {
        self.render_with(|placeholder| Some(value_for(placeholder, ctx)))
    }

    /// Substitute date placeholders only; `%f` and `%n` stay literal.
    pub fn render_date(&self, date: CaptureDate) -> String {
        self.render_with(|placeholder| {
            placeholder.is_date().then(|| {
                let ctx = NameContext {
                    date,
                    original_name: "",
                    sequence: 0,
                    width: 0,
                };
                value_for(placeholder, &ctx)
            })
        })
    }

    fn render_with<F>(&self, mut value: F) -> String
    where
        F: FnMut(Placeholder) -> Option<String>,
    {
        let mut output = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(s) => output.push_str(s),
                TemplatePart::Placeholder(p) => match value(*p) {
                    Some(v) => output.push_str(&v),
                    None => output.push_str(p.marker()),
                },
            }
        }
        output
    }
}

fn value_for(placeholder: Placeholder, ctx: &NameContext<'_>) -> String {
    match placeholder {
        Placeholder::Year => format!("{:04}", ctx.date.year),
        Placeholder::Month => format!("{:02}", ctx.date.month),
        Placeholder::Day => format!("{:02}", ctx.date.day),
        Placeholder::FileName => ctx.original_name.to_string(),
        Placeholder::Sequence => format!("{:0width$}", ctx.sequence, width = ctx.width),
    }
}

/// Width `%n` is padded to. An explicit digit count wins; zero means
/// "as wide as the largest number of the run".
pub fn sequence_width(digits: usize, offset: u64, file_count: usize) -> usize {
    if digits > 0 {
        return digits;
    }
    let largest = offset.saturating_add(file_count as u64);
    largest.max(1).to_string().len()
}
