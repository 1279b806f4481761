//! Physical lines and their dialect-specific classification.

use crate::format::Format;
use crate::tables::FormatTables;

/// Shape of a physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Carries a tag/value pair for the active dialect
    Structured,
    Empty,
    /// A run of dashes or equals signs
    Separator,
    Comment,
    Free,
}

/// A classified physical line. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    /// 1-based line number within the file the line came from
    pub no: u32,
    /// Index of that file in the owning `LineSource`
    pub source: usize,
    pub kind: LineKind,
    /// First (label, value) pair of a structured line
    pub field: Option<(String, String)>,
}

impl RawLine {
    pub fn label(&self) -> Option<&str> {
        self.field.as_ref().map(|(l, _)| l.as_str())
    }

    pub fn value(&self) -> Option<&str> {
        self.field.as_ref().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Same text and classification, wherever the line came from.
    pub fn same_content(&self, other: &RawLine) -> bool {
        self.text == other.text && self.kind == other.kind && self.field == other.field
    }
}

/// Per-file classification state (PBN commentary may span lines).
pub(crate) struct Classifier<'a> {
    format: Format,
    tables: &'a FormatTables,
    in_commentary: bool,
}

impl<'a> Classifier<'a> {
    pub(crate) fn new(format: Format, tables: &'a FormatTables) -> Self {
        Self {
            format,
            tables,
            in_commentary: false,
        }
    }

    /// Classify one line. The second value names a tolerated producer quirk.
    pub(crate) fn classify(
        &mut self,
        text: &str,
        no: u32,
        source: usize,
    ) -> (RawLine, Option<&'static str>) {
        let mut quirk = None;
        let mut field = None;
        let kind = self.kind_of(text, &mut field, &mut quirk);
        let line = RawLine {
            text: text.to_string(),
            no,
            source,
            kind,
            field,
        };
        (line, quirk)
    }

    fn kind_of(
        &mut self,
        text: &str,
        field: &mut Option<(String, String)>,
        quirk: &mut Option<&'static str>,
    ) -> LineKind {
        let trimmed = text.trim();

        if self.in_commentary {
            if trimmed.contains('}') {
                self.in_commentary = false;
            }
            return LineKind::Comment;
        }
        if trimmed.is_empty() {
            return LineKind::Empty;
        }
        if is_separator(trimmed) {
            return LineKind::Separator;
        }

        match self.format {
            Format::Lin => match split_pipe_pairs(trimmed) {
                Some((pairs, q)) => {
                    *quirk = q;
                    let (tag, value) = pairs[0];
                    *field = Some((tag.to_string(), value.to_string()));
                    LineKind::Structured
                }
                None => LineKind::Free,
            },
            Format::Pbn => {
                if trimmed.starts_with('%') || trimmed.starts_with(';') {
                    return LineKind::Comment;
                }
                if trimmed.starts_with('{') {
                    if !trimmed.contains('}') {
                        self.in_commentary = true;
                    }
                    return LineKind::Comment;
                }
                match parse_tag_pair(trimmed) {
                    Some((name, value, q)) => {
                        if q {
                            *quirk = Some("unterminated tag");
                        }
                        *field = Some((name, value));
                        LineKind::Structured
                    }
                    None => LineKind::Free,
                }
            }
            Format::Rbn => {
                if trimmed.starts_with('%') {
                    return LineKind::Comment;
                }
                let line = text.trim_end();
                let mut chars = line.chars();
                let Some(c) = chars.next() else {
                    return LineKind::Empty;
                };
                if self.tables.rbn_label(c).is_none() {
                    return LineKind::Free;
                }
                let rest = chars.as_str();
                let value = match rest.strip_prefix(' ') {
                    Some(v) => v,
                    None => {
                        if !rest.is_empty() {
                            *quirk = Some("missing field separator");
                        }
                        rest
                    }
                };
                *field = Some((c.to_string(), value.to_string()));
                LineKind::Structured
            }
            Format::Rbx => {
                if trimmed.starts_with('%') {
                    return LineKind::Comment;
                }
                match split_rbx_groups(trimmed) {
                    Some((groups, q)) => {
                        if q {
                            *quirk = Some("unterminated group");
                        }
                        let (c, value) = &groups[0];
                        *field = Some((c.to_string(), value.to_string()));
                        LineKind::Structured
                    }
                    None => LineKind::Free,
                }
            }
            Format::Txt | Format::Eml | Format::Rec => LineKind::Free,
        }
    }
}

fn is_separator(trimmed: &str) -> bool {
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-' || c == '=')
}

/// Split a pipe-delimited line into (tag, value) pairs.
///
/// Returns `None` unless the line holds an even number of fields. The flag
/// is set when a producer quirk had to be tolerated.
pub fn split_pipe_pairs(line: &str) -> Option<(Vec<(&str, &str)>, Option<&'static str>)> {
    if !line.contains('|') {
        return None;
    }
    let mut quirk = None;
    let mut tokens: Vec<&str> = line.split('|').collect();

    if tokens.len() % 2 == 1 && tokens.last() == Some(&"") {
        tokens.pop();
    } else if !line.ends_with('|') {
        quirk = Some("missing trailing delimiter");
    }
    while tokens.len() >= 2 && tokens[tokens.len() - 1].is_empty() && tokens[tokens.len() - 2].is_empty() {
        tokens.truncate(tokens.len() - 2);
        quirk = Some("duplicated trailing delimiter");
    }
    if tokens.is_empty() || tokens.len() % 2 == 1 {
        return None;
    }

    let pairs: Vec<(&str, &str)> = tokens
        .chunks(2)
        .map(|pair| (pair[0].trim(), pair[1]))
        .collect();
    if pairs.iter().any(|(tag, _)| tag.is_empty()) {
        return None;
    }
    Some((pairs, quirk))
}

/// Parse a tag pair from a line: [TagName "value"]
///
/// The flag reports a missing closing quote or bracket.
pub fn parse_tag_pair(line: &str) -> Option<(String, String, bool)> {
    let line = line.trim();
    let inner = line.strip_prefix('[')?;
    let (inner, mut quirk) = match inner.strip_suffix(']') {
        Some(inner) => (inner, false),
        None => (inner, true),
    };

    // Find the space between tag name and quoted value
    let space_pos = inner.find(' ')?;
    let name = inner[..space_pos].trim().to_string();
    let rest = inner[space_pos..].trim();
    if name.is_empty() {
        return None;
    }

    let rest = rest.strip_prefix('"')?;
    let value = match rest.strip_suffix('"') {
        Some(value) => value,
        None => {
            quirk = true;
            rest
        }
    };

    Some((name, value.to_string(), quirk))
}

/// Split a packed line into `X{value}` groups.
pub fn split_rbx_groups(line: &str) -> Option<(Vec<(char, String)>, bool)> {
    let mut groups = Vec::new();
    let mut rest = line.trim();
    let mut quirk = false;

    while let Some(c) = rest.chars().next() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let body = rest[1..].strip_prefix('{')?;
        match body.find('}') {
            Some(end) => {
                groups.push((c, body[..end].to_string()));
                rest = body[end + 1..].trim_start();
            }
            None => {
                // Only the last group of a line may lose its brace.
                groups.push((c, body.to_string()));
                quirk = true;
                rest = "";
            }
        }
    }

    if groups.is_empty() {
        None
    } else {
        Some((groups, quirk))
    }
}
