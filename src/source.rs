//! Buffered line source with lookahead, one-step rewind, fix overlays and
//! transparent splicing of embedded files.
//!
//! Files are read and classified once. Embedded files live in an arena of
//! providers addressed by index; a stack of frames over that arena tracks
//! which file the cursor is currently in.

use crate::error::{ParseError, Result};
use crate::format::Format;
use crate::line::{split_pipe_pairs, Classifier, LineKind, RawLine};
use crate::tables::{tables, FormatTables};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Replacement text for one line of the top-level file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixEdit {
    pub line: u32,
    pub text: String,
}

impl FixEdit {
    pub fn new(line: u32, text: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
        }
    }

    /// Parse a fix overlay: `<line-number> <replacement text>` per line.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse_file(content: &str) -> Result<Vec<FixEdit>> {
        let mut edits = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (number, text) = line.split_once(' ').unwrap_or((line, ""));
            let number = number.trim().parse::<u32>().map_err(|_| {
                ParseError::at(i as u32 + 1, format!("bad line number in fix file: {}", number))
            })?;
            edits.push(FixEdit::new(number, text));
        }
        Ok(edits)
    }

    /// Read and parse a fix overlay file.
    pub fn load(path: &Path) -> Result<Vec<FixEdit>> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_file(&content)
    }
}

struct Provider {
    name: String,
    dir: Option<PathBuf>,
    lines: Vec<RawLine>,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    provider: usize,
    pos: usize,
}

/// Classified lines of one input file plus any files it embeds.
pub struct LineSource {
    format: Format,
    tables: &'static FormatTables,
    providers: Vec<Provider>,
    cache: HashMap<PathBuf, usize>,
    stack: Vec<Frame>,
    last: Option<(Vec<Frame>, RawLine)>,
    original: Vec<String>,
    quirks: BTreeMap<&'static str, usize>,
    consumed: usize,
}

impl LineSource {
    /// Read a whole file and classify it for `format`.
    pub fn open(path: impl AsRef<Path>, format: Format, fixes: &[FixEdit]) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path.display().to_string();
        let text = decode(&name, bytes)?;
        let mut source = Self::build(&name, &text, format, fixes, path.parent())?;
        source.cache.insert(path.to_path_buf(), 0);
        Ok(source)
    }

    /// Classify in-memory text. Embedded references resolve against the
    /// current directory unless [`with_base_dir`](Self::with_base_dir) is used.
    pub fn from_text(name: &str, text: &str, format: Format, fixes: &[FixEdit]) -> Result<Self> {
        Self::build(name, text, format, fixes, None)
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.providers[0].dir = Some(dir.into());
        self
    }

    fn build(
        name: &str,
        text: &str,
        format: Format,
        fixes: &[FixEdit],
        dir: Option<&Path>,
    ) -> Result<Self> {
        let tables = tables();
        let overlay: BTreeMap<u32, &str> = fixes.iter().map(|f| (f.line, f.text.as_str())).collect();
        let original: Vec<String> = text.lines().map(str::to_string).collect();

        for line in overlay.keys() {
            if *line == 0 || *line as usize > original.len() {
                warn!("{}: fix for line {} is outside the file", name, line);
            }
        }

        let mut quirks = BTreeMap::new();
        let lines = classify_all(format, tables, 0, &original, &overlay, &mut quirks);

        let has_content = if format.is_canvas() {
            lines.iter().any(|l| l.kind == LineKind::Free)
        } else {
            lines.iter().any(|l| l.kind == LineKind::Structured)
        };
        if !has_content {
            return Err(ParseError::at(0, format!("{}: no {} records found", name, format)));
        }

        debug!("{}: {} lines as {}", name, lines.len(), format);

        Ok(Self {
            format,
            tables,
            providers: vec![Provider {
                name: name.to_string(),
                dir: dir.map(Path::to_path_buf),
                lines,
            }],
            cache: HashMap::new(),
            stack: vec![Frame {
                provider: 0,
                pos: 0,
            }],
            last: None,
            original,
            quirks,
            consumed: 0,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn tables(&self) -> &'static FormatTables {
        self.tables
    }

    /// Name of the top-level file.
    pub fn name(&self) -> &str {
        &self.providers[0].name
    }

    /// Name of the file a line came from.
    pub fn source_name(&self, source: usize) -> &str {
        self.providers
            .get(source)
            .map_or("?", |p| p.name.as_str())
    }

    /// `file:line` for diagnostics.
    pub fn describe(&self, line: &RawLine) -> String {
        format!("{}:{}", self.source_name(line.source), line.no)
    }

    /// Tie an error raised on a line of `source` to the embedded file it
    /// came from. Errors of the top-level file pass through.
    pub fn locate(&self, source: usize, error: ParseError) -> ParseError {
        match error {
            ParseError::Format { .. } | ParseError::Duplicate(_) if source != 0 => {
                ParseError::Embedded {
                    file: self.source_name(source).to_string(),
                    error: Box::new(error),
                }
            }
            error => error,
        }
    }

    /// Line count of the top-level file before any fix was applied.
    pub fn original_len(&self) -> usize {
        self.original.len()
    }

    /// Next classified line, splicing embedded files in place of their
    /// reference lines. `None` at the end of the stream.
    pub fn next(&mut self, skip_comments: bool) -> Result<Option<RawLine>> {
        let saved = self.stack.clone();
        loop {
            let Some(frame) = self.stack.last().copied() else {
                return Ok(None);
            };
            let provider = &self.providers[frame.provider];
            if frame.pos >= provider.lines.len() {
                if self.stack.len() > 1 {
                    self.stack.pop();
                    continue;
                }
                return Ok(None);
            }

            let line = provider.lines[frame.pos].clone();
            if let Some(top) = self.stack.last_mut() {
                top.pos += 1;
            }

            if let Some(name) = self.embedded_name(&line) {
                let idx = self
                    .resolve(&name, &line)
                    .map_err(|e| self.locate(line.source, e))?;
                self.stack.push(Frame {
                    provider: idx,
                    pos: 0,
                });
                continue;
            }
            if skip_comments && line.kind == LineKind::Comment {
                continue;
            }

            self.last = Some((saved, line.clone()));
            self.consumed += 1;
            return Ok(Some(line));
        }
    }

    /// Un-consume the line most recently returned by [`next`](Self::next).
    /// Only one step can be undone.
    pub fn previous(&mut self) -> Option<RawLine> {
        let (stack, line) = self.last.take()?;
        self.stack = stack;
        self.consumed -= 1;
        Some(line)
    }

    /// First byte of the next line without consuming it; `\n` for an empty line.
    /// An embedded reference that cannot be resolved is an error here too.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        let stack = self.stack.clone();
        let last = self.last.clone();
        let consumed = self.consumed;
        let next = self.next(false);
        self.stack = stack;
        self.last = last;
        self.consumed = consumed;
        Ok(next?.map(|l| l.text.bytes().next().unwrap_or(b'\n')))
    }

    pub fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.peek()?.is_none())
    }

    /// Original text of a top-level line, for diagnostics.
    pub fn line_at(&self, no: u32) -> String {
        (no as usize)
            .checked_sub(1)
            .and_then(|i| self.original.get(i))
            .cloned()
            .unwrap_or_default()
    }

    /// Back to the first line; nothing is re-read.
    pub fn rewind(&mut self) {
        self.stack = vec![Frame {
            provider: 0,
            pos: 0,
        }];
        self.last = None;
        self.consumed = 0;
    }

    /// Lines handed out so far, net of rewinds.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Count a tolerated producer quirk.
    pub fn note_quirk(&mut self, kind: &'static str) {
        *self.quirks.entry(kind).or_insert(0) += 1;
    }

    pub fn quirks(&self) -> &BTreeMap<&'static str, usize> {
        &self.quirks
    }

    fn embedded_name(&self, line: &RawLine) -> Option<String> {
        if self.format != Format::Lin || line.kind != LineKind::Structured {
            return None;
        }
        let (pairs, _) = split_pipe_pairs(line.text.trim())?;
        match pairs.as_slice() {
            [(_, value)] if is_lin_file_name(value) => Some(value.to_string()),
            _ => None,
        }
    }

    fn resolve(&mut self, name: &str, line: &RawLine) -> Result<usize> {
        let dir = self.providers[line.source].dir.clone();
        let path = match dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };

        if let Some(&idx) = self.cache.get(&path) {
            if self.stack.iter().any(|f| f.provider == idx) {
                return Err(ParseError::at(
                    line.no,
                    format!("embedded file {} includes itself", name),
                ));
            }
            return Ok(idx);
        }

        let bytes = std::fs::read(&path).map_err(|e| {
            ParseError::at(
                line.no,
                format!("cannot resolve embedded file {}: {}", path.display(), e),
            )
        })?;
        let display = path.display().to_string();
        let text = decode(&display, bytes)?;
        let original: Vec<String> = text.lines().map(str::to_string).collect();

        let idx = self.providers.len();
        let lines = classify_all(
            self.format,
            self.tables,
            idx,
            &original,
            &BTreeMap::new(),
            &mut self.quirks,
        );
        debug!(
            "{}: embedded {} ({} lines) as source {}",
            self.describe(line),
            display,
            lines.len(),
            idx
        );
        self.providers.push(Provider {
            name: display,
            dir: path.parent().map(Path::to_path_buf),
            lines,
        });
        self.cache.insert(path, idx);
        Ok(idx)
    }
}

fn is_lin_file_name(value: &str) -> bool {
    value.len() > 4
        && !value.contains(char::is_whitespace)
        && value.to_ascii_lowercase().ends_with(".lin")
}

/// UTF-8 when possible, Latin-1 otherwise; NUL bytes mean a binary file.
fn decode(name: &str, bytes: Vec<u8>) -> Result<String> {
    if let Some(offset) = bytes.iter().position(|&b| b == 0) {
        return Err(ParseError::Garbled {
            name: name.to_string(),
            offset,
        });
    }
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

fn classify_all(
    format: Format,
    tables: &FormatTables,
    source: usize,
    original: &[String],
    overlay: &BTreeMap<u32, &str>,
    quirks: &mut BTreeMap<&'static str, usize>,
) -> Vec<RawLine> {
    let mut classifier = Classifier::new(format, tables);
    original
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let no = i as u32 + 1;
            let text = match overlay.get(&no) {
                Some(fixed) => {
                    debug!("line {}: fix applied", no);
                    *fixed
                }
                None => text.as_str(),
            };
            let (line, quirk) = classifier.classify(text, no, source);
            if let Some(kind) = quirk {
                *quirks.entry(kind).or_insert(0) += 1;
            }
            line
        })
        .collect()
}
