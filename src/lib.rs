//! Bridge deal ingestion.
//!
//! This crate reads legacy bridge deal files into canonical records:
//! - **LIN** - pipe-delimited `tag|value|` records, with embedded-file splicing
//! - **PBN** - bracket-tag `[Tag "Value"]` records
//! - **RBN / RBX** - single-character field prefixes, one per line or packed
//! - **TXT / EML / REC** - ASCII deal diagrams with no tags at all
//!
//! A [`LineSource`] serves the classified lines of one file (with an
//! optional fix overlay), a dialect [`Reader`] fills a [`RecordAccumulator`]
//! per record, and a [`ChunkReader`] yields the completed records.
//!
//! # Example
//!
//! ```
//! use bridge_ingest::{ChunkReader, Format, Label, LineSource};
//!
//! let pbn_content = r#"
//! [Event "Club"]
//! [Board "1"]
//! [Dealer "N"]
//! [Vulnerable "None"]
//! [Deal "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ"]
//! "#;
//!
//! let source = LineSource::from_text("club.pbn", pbn_content, Format::Pbn, &[]).unwrap();
//! let chunks: Vec<_> = ChunkReader::new(source).collect::<Result<_, _>>().unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].record.get(Label::BoardNo), Some("1"));
//! ```

pub mod batch;
pub mod canvas;
mod error;
pub mod format;
pub mod line;
pub mod lin;
pub mod pbn;
pub mod rbn;
pub mod reader;
pub mod record;
pub mod source;
pub mod tables;

pub use error::{DuplicateLabelError, ParseError, Result};
pub use format::Format;
pub use line::{LineKind, RawLine};
pub use reader::{Chunk, ChunkRead, ChunkReader, HeaderCarry, Reader};
pub use record::{Label, RecordAccumulator, ResetRange};
pub use source::{FixEdit, LineSource};

// Re-export bridge-types for convenience
pub use bridge_types::{Card, Deal, Direction, Hand, Rank, Suit, Vulnerability};
