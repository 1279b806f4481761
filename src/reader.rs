//! Streaming chunk reader with per-dialect dispatch.
//!
//! A [`ChunkReader`] owns one [`LineSource`] and the [`Reader`] for its
//! dialect, and yields one completed record at a time.
//!
//! # Example
//!
//! ```
//! use bridge_ingest::{ChunkReader, Format, Label, LineSource};
//!
//! let text = "qx|o1|\nmd|3SA,,,|\nmb|1C|\nmb|P|\nmb|P|\nmb|P|\nmc|13|\n";
//! let source = LineSource::from_text("demo.lin", text, Format::Lin, &[]).unwrap();
//! let chunks: Vec<_> = ChunkReader::new(source).collect::<Result<_, _>>().unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].record.get(Label::Auction), Some("1C:P:P:P"));
//! ```

use crate::canvas::{eml::EmlReader, rec::RecReader, txt::TxtReader};
use crate::error::{ParseError, Result};
use crate::format::Format;
use crate::lin::LinReader;
use crate::pbn::PbnReader;
use crate::rbn::{RbnReader, RbxReader};
use crate::record::{RecordAccumulator, ResetRange};
use crate::source::{FixEdit, LineSource};
use log::debug;
use std::path::Path;

/// One dialect's record state machine.
pub trait ChunkRead {
    /// Fill `acc` with the next record. Returns true when the record starts a
    /// new logical group (a header-level field changed).
    fn read(&mut self, source: &mut LineSource, acc: &mut RecordAccumulator) -> Result<bool>;

    /// Input held back inside the reader, not yet seen through the source.
    fn has_pending(&self) -> bool {
        false
    }
}

/// Header fields carried from one record to the next.
///
/// Dialects that state the header once and then list boards get it copied
/// into every board; a record whose header differs starts a new group.
#[derive(Debug, Default)]
pub struct HeaderCarry {
    previous: RecordAccumulator,
    seen: bool,
}

impl HeaderCarry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete `acc` and report whether it opens a new group.
    pub fn finish(&mut self, acc: &mut RecordAccumulator) -> bool {
        if acc.is_blank() {
            return false;
        }
        if acc.range_is_blank(ResetRange::HeaderOnly) {
            acc.copy_from(&self.previous, ResetRange::HeaderOnly);
            if self.seen {
                return false;
            }
            self.seen = true;
            return true;
        }
        let new_group = !self.seen || acc.differs_from(&self.previous, ResetRange::HeaderOnly);
        self.previous.reset(ResetRange::All);
        self.previous.copy_from(acc, ResetRange::HeaderOnly);
        self.seen = true;
        new_group
    }

    pub fn previous(&self) -> &RecordAccumulator {
        &self.previous
    }
}

/// Closed set of dialect readers, selected by exhaustive match.
pub enum Reader {
    Lin(LinReader),
    Pbn(PbnReader),
    Rbn(RbnReader),
    Rbx(RbxReader),
    Txt(TxtReader),
    Eml(EmlReader),
    Rec(RecReader),
}

impl Reader {
    pub fn for_format(format: Format) -> Self {
        match format {
            Format::Lin => Reader::Lin(LinReader::new()),
            Format::Pbn => Reader::Pbn(PbnReader::new()),
            Format::Rbn => Reader::Rbn(RbnReader::new()),
            Format::Rbx => Reader::Rbx(RbxReader::new()),
            Format::Txt => Reader::Txt(TxtReader::new()),
            Format::Eml => Reader::Eml(EmlReader::new()),
            Format::Rec => Reader::Rec(RecReader::new()),
        }
    }
}

impl ChunkRead for Reader {
    fn read(&mut self, source: &mut LineSource, acc: &mut RecordAccumulator) -> Result<bool> {
        match self {
            Reader::Lin(r) => r.read(source, acc),
            Reader::Pbn(r) => r.read(source, acc),
            Reader::Rbn(r) => r.read(source, acc),
            Reader::Rbx(r) => r.read(source, acc),
            Reader::Txt(r) => r.read(source, acc),
            Reader::Eml(r) => r.read(source, acc),
            Reader::Rec(r) => r.read(source, acc),
        }
    }

    fn has_pending(&self) -> bool {
        match self {
            Reader::Lin(r) => r.has_pending(),
            Reader::Pbn(r) => r.has_pending(),
            Reader::Rbn(r) => r.has_pending(),
            Reader::Rbx(r) => r.has_pending(),
            Reader::Txt(r) => r.has_pending(),
            Reader::Eml(r) => r.has_pending(),
            Reader::Rec(r) => r.has_pending(),
        }
    }
}

/// A completed record.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub record: RecordAccumulator,
    /// The record opens a new logical group
    pub new_group: bool,
}

/// Reads chunks from one file in one dialect.
///
/// Iteration stops after the first error: the rest of a file that failed to
/// parse is never reported.
pub struct ChunkReader {
    source: LineSource,
    reader: Reader,
    failed: bool,
    chunks_read: usize,
    groups_read: usize,
}

impl ChunkReader {
    pub fn new(source: LineSource) -> Self {
        let reader = Reader::for_format(source.format());
        Self {
            source,
            reader,
            failed: false,
            chunks_read: 0,
            groups_read: 0,
        }
    }

    /// Open a file and pick the reader for `format`.
    pub fn open(path: impl AsRef<Path>, format: Format, fixes: &[FixEdit]) -> Result<Self> {
        Ok(Self::new(LineSource::open(path, format, fixes)?))
    }

    pub fn source(&self) -> &LineSource {
        &self.source
    }

    /// Number of chunks successfully read so far.
    pub fn chunks_read(&self) -> usize {
        self.chunks_read
    }

    /// Number of groups started so far.
    pub fn groups_read(&self) -> usize {
        self.groups_read
    }

    fn read_chunk(&mut self) -> Option<Result<Chunk>> {
        loop {
            match self.source.is_exhausted() {
                Ok(true) if !self.reader.has_pending() => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }

            let consumed = self.source.consumed();
            let pending = self.reader.has_pending();
            let mut record = RecordAccumulator::new();
            let new_group = match self.reader.read(&mut self.source, &mut record) {
                Ok(new_group) => new_group,
                Err(e) => return Some(Err(e)),
            };

            if record.is_blank() {
                if consumed == self.source.consumed() && pending == self.reader.has_pending() {
                    return Some(Err(ParseError::at(
                        0,
                        format!("{}: reader stalled after {} chunks", self.source.name(), self.chunks_read),
                    )));
                }
                continue;
            }

            self.chunks_read += 1;
            if new_group {
                self.groups_read += 1;
            }
            debug!(
                "{}: chunk {} (group {}) board {}",
                self.source.name(),
                self.chunks_read,
                self.groups_read,
                record.get(crate::record::Label::BoardNo).unwrap_or("-")
            );
            return Some(Ok(Chunk { record, new_group }));
        }
    }
}

impl Iterator for ChunkReader {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.read_chunk();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
