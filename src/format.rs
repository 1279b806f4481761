//! The closed set of supported dialects.

use crate::error::ParseError;
use crate::record::RecordAccumulator;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Input dialects, one reader and one writer each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Pipe-delimited `tag|value|` records
    Lin,
    /// Bracket-tag `[Tag "Value"]` records
    Pbn,
    /// Single-character prefix, one field per line
    Rbn,
    /// Single-character prefix, packed `X{value}` groups
    Rbx,
    /// Plain text diagram
    Txt,
    /// E-mail style diagram with a seating compass
    Eml,
    /// Diagram with role-labelled hands and a trick table
    Rec,
}

impl Format {
    pub const ALL: [Format; 7] = [
        Format::Lin,
        Format::Pbn,
        Format::Rbn,
        Format::Rbx,
        Format::Txt,
        Format::Eml,
        Format::Rec,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Lin => "lin",
            Format::Pbn => "pbn",
            Format::Rbn => "rbn",
            Format::Rbx => "rbx",
            Format::Txt => "txt",
            Format::Eml => "eml",
            Format::Rec => "rec",
        }
    }

    /// Detect the dialect from a file extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }

    /// Canvas dialects carry no tags; fields are found by anchor search.
    pub fn is_canvas(self) -> bool {
        matches!(self, Format::Txt | Format::Eml | Format::Rec)
    }

    /// Render one record in this dialect.
    pub fn write_record(self, record: &RecordAccumulator) -> String {
        match self {
            Format::Lin => crate::lin::write_record(record),
            Format::Pbn => crate::pbn::write_record(record),
            Format::Rbn => crate::rbn::write_rbn(record),
            Format::Rbx => crate::rbn::write_rbx(record),
            Format::Txt => crate::canvas::txt::write_record(record),
            Format::Eml => crate::canvas::eml::write_record(record),
            Format::Rec => crate::canvas::rec::write_record(record),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::at(0, format!("unknown format: {}", s)))
    }
}
