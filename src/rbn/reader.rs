//! RBN and RBX record readers.

use super::apply_field;
use crate::error::{ParseError, Result};
use crate::line::{split_rbx_groups, LineKind, RawLine};
use crate::reader::{ChunkRead, HeaderCarry};
use crate::record::{Label, RecordAccumulator, ResetRange};
use crate::source::LineSource;

fn unknown_letter(line: &RawLine) -> ParseError {
    let c = line.text.trim().chars().next().unwrap_or(' ');
    ParseError::at(line.no, format!("unknown field letter {:?}", c))
}

fn finish_record(carry: &mut HeaderCarry, acc: &mut RecordAccumulator) -> Result<bool> {
    if acc.is_blank() {
        return Ok(false);
    }
    if acc.is_set(Label::BoardNo) && !acc.is_set(Label::Deal) {
        let line = acc.origin(Label::BoardNo).unwrap_or(0);
        return Err(ParseError::at(line, "board has no deal"));
    }
    Ok(carry.finish(acc))
}

/// One `X value` field per line; blank lines end a record.
#[derive(Default)]
pub struct RbnReader {
    carry: HeaderCarry,
}

impl RbnReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkRead for RbnReader {
    fn read(&mut self, source: &mut LineSource, acc: &mut RecordAccumulator) -> Result<bool> {
        while let Some(line) = source.next(true)? {
            match line.kind {
                LineKind::Empty | LineKind::Separator => {
                    if !acc.is_blank() {
                        break;
                    }
                }
                LineKind::Comment => {}
                LineKind::Free => return Err(unknown_letter(&line)),
                LineKind::Structured => {
                    let Some((c, value)) = &line.field else {
                        continue;
                    };
                    let label = c
                        .chars()
                        .next()
                        .and_then(|c| source.tables().rbn_label(c))
                        .ok_or_else(|| unknown_letter(&line))?;
                    // Header fields after board fields open the next record
                    if label.is_header() && !acc.range_is_blank(ResetRange::BoardOnly) {
                        source.previous();
                        break;
                    }
                    apply_field(acc, label, value, line.no)?;
                }
            }
        }
        finish_record(&mut self.carry, acc)
    }
}

/// One record per line of packed `X{value}` groups.
#[derive(Default)]
pub struct RbxReader {
    carry: HeaderCarry,
}

impl RbxReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkRead for RbxReader {
    fn read(&mut self, source: &mut LineSource, acc: &mut RecordAccumulator) -> Result<bool> {
        while let Some(line) = source.next(true)? {
            match line.kind {
                LineKind::Empty | LineKind::Separator | LineKind::Comment => {}
                LineKind::Free => return Err(unknown_letter(&line)),
                LineKind::Structured => {
                    let Some((groups, _)) = split_rbx_groups(line.text.trim()) else {
                        return Err(unknown_letter(&line));
                    };
                    for (c, value) in groups {
                        let label = source.tables().rbn_label(c).ok_or_else(|| {
                            ParseError::at(line.no, format!("unknown field letter {:?}", c))
                        })?;
                        apply_field(acc, label, &value, line.no)?;
                    }
                    break;
                }
            }
        }
        finish_record(&mut self.carry, acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    const DEAL: &str = "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ";

    fn read_all<R: ChunkRead>(mut reader: R, text: &str, format: Format) -> Result<Vec<(RecordAccumulator, bool)>> {
        let mut source = LineSource::from_text("t", text, format, &[])?;
        let mut records = Vec::new();
        while !source.is_exhausted()? {
            let mut acc = RecordAccumulator::new();
            let new_group = reader.read(&mut source, &mut acc)?;
            if !acc.is_blank() {
                records.push((acc, new_group));
            }
        }
        Ok(records)
    }

    #[test]
    fn test_rbn_records() {
        let text = format!(
            "% RBN 3.1\nT Summer Pairs\nK Lions:Tigers\n\nB 1\nH {}\nA 1C:P:P:P\nR 9\n\nB 2\nH {}\n",
            DEAL, DEAL
        );
        let records = read_all(RbnReader::new(), &text, Format::Rbn).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[0].1);
        assert_eq!(records[0].0.get(Label::HomeTeam), Some("Lions"));

        let (board, new_group) = &records[1];
        assert!(!new_group);
        assert_eq!(board.get(Label::Title), Some("Summer Pairs"));
        assert_eq!(board.origin(Label::Title), Some(2));
        assert_eq!(board.get(Label::Auction), Some("1C:P:P:P"));
        assert_eq!(board.origin(Label::Result), Some(8));
        assert_eq!(records[2].0.get(Label::BoardNo), Some("2"));
    }

    #[test]
    fn test_rbn_header_letter_ends_board() {
        let text = format!("B 1\nH {}\nT Next Event\nB 2\nH {}\n", DEAL, DEAL);
        let records = read_all(RbnReader::new(), &text, Format::Rbn).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].1);
        assert_eq!(records[1].0.get(Label::Title), Some("Next Event"));
        assert_eq!(records[1].0.get(Label::BoardNo), Some("2"));
    }

    #[test]
    fn test_rbn_errors() {
        let text = format!("B 1\nH {}\nq what\n", DEAL);
        let err = read_all(RbnReader::new(), &text, Format::Rbn).unwrap_err();
        assert_eq!(err.line(), Some(3));

        assert!(read_all(RbnReader::new(), "B 1\nB 2\n", Format::Rbn).is_err());
        assert!(read_all(RbnReader::new(), "B 1\nR 9\n", Format::Rbn).is_err());
    }

    #[test]
    fn test_rbx_one_record_per_line() {
        let text = format!(
            "T{{Summer Pairs}}K{{Lions:Tigers}}\nB{{1}}H{{{}}}A{{1C:P:P:P}}R{{9}}\nB{{2}}H{{{}}}R{{10\n",
            DEAL, DEAL
        );
        let mut source = LineSource::from_text("t.rbx", &text, Format::Rbx, &[]).unwrap();
        let mut reader = RbxReader::new();
        let mut records = Vec::new();
        while !source.is_exhausted().unwrap() {
            let mut acc = RecordAccumulator::new();
            reader.read(&mut source, &mut acc).unwrap();
            records.push(acc);
        }
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].get(Label::VisitTeam), Some("Tigers"));
        assert_eq!(records[1].get(Label::Deal), Some(DEAL));
        assert_eq!(records[2].get(Label::Result), Some("10"));
        assert_eq!(source.quirks().get("unterminated group"), Some(&1));
    }

    #[test]
    fn test_rbx_unknown_letter() {
        let err = read_all(RbxReader::new(), "B{1}Q{x}\n", Format::Rbx).unwrap_err();
        assert_eq!(err.line(), Some(1));
    }
}
