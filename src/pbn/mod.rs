//! PBN (Portable Bridge Notation) format reader and writer.
//!
//! One `[Tag "Value"]` per line. Auction, play and the two table tags are
//! followed by untagged continuation rows.

mod reader;
mod writer;

pub use reader::PbnReader;
pub use writer::{write_pbn, write_record};
pub(crate) use writer::vul_value;
