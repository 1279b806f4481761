//! RBN and RBX, the single-character-prefix formats.
//!
//! RBN puts one `X value` field per line and separates records with blank
//! lines. RBX packs a whole record into `X{value}` groups on one line.

mod reader;
mod writer;

pub use reader::{RbnReader, RbxReader};
pub use writer::{write_rbn, write_rbx};

use crate::error::Result;
use crate::record::{Label, RecordAccumulator};

/// Store one field read from either variant.
pub(crate) fn apply_field(
    acc: &mut RecordAccumulator,
    label: Label,
    value: &str,
    line: u32,
) -> Result<()> {
    match label {
        Label::Auction | Label::Play => acc.push_item(label, value, ":", line),
        Label::Notes => acc.push_item(label, value, "\n", line),
        Label::Teams => {
            acc.set(Label::Teams, value, line)?;
            if let Some((home, visit)) = value.split_once(':') {
                acc.set(Label::HomeTeam, home.trim(), line)?;
                acc.set(Label::VisitTeam, visit.trim(), line)?;
            }
        }
        _ => acc.set(label, value, line)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teams_split() {
        let mut acc = RecordAccumulator::new();
        apply_field(&mut acc, Label::Teams, "Lions:Tigers", 4).unwrap();
        assert_eq!(acc.get(Label::HomeTeam), Some("Lions"));
        assert_eq!(acc.get(Label::VisitTeam), Some("Tigers"));
        assert_eq!(acc.origin(Label::VisitTeam), Some(4));
    }

    #[test]
    fn test_repeated_auction_fields_join() {
        let mut acc = RecordAccumulator::new();
        apply_field(&mut acc, Label::Auction, "1C:P", 1).unwrap();
        apply_field(&mut acc, Label::Auction, "P:P", 2).unwrap();
        assert_eq!(acc.get(Label::Auction), Some("1C:P:P:P"));
        assert!(apply_field(&mut acc, Label::BoardNo, "1", 3).is_ok());
        assert!(apply_field(&mut acc, Label::BoardNo, "1", 4).is_err());
    }
}
