//! PBN record reader.

use crate::error::{ParseError, Result};
use crate::line::{LineKind, RawLine};
use crate::reader::{ChunkRead, HeaderCarry};
use crate::record::{Label, RecordAccumulator};
use crate::source::LineSource;
use log::trace;

/// Reads one record: tag lines up to a blank line or a repeated
/// `Event`/`Board` tag.
#[derive(Default)]
pub struct PbnReader {
    carry: HeaderCarry,
    last: RecordAccumulator,
}

impl PbnReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_tag(
        &self,
        acc: &mut RecordAccumulator,
        line: &RawLine,
        label: Label,
        value: &str,
    ) -> Result<()> {
        // "#" repeats the previous record's value
        let value = if value == "#" {
            match self.last.get(label) {
                Some(previous) => previous.to_string(),
                None => {
                    return Err(ParseError::at(
                        line.no,
                        format!("# for {} with no previous value", label),
                    ))
                }
            }
        } else {
            value.to_string()
        };

        match label {
            // The tag value names the opening seat; calls and cards follow on
            // their own rows.
            Label::Auction | Label::Play => {}
            Label::DoubleDummy | Label::ScoresList => {}
            Label::Notes => acc.push_item(Label::Notes, &value, "\n", line.no),
            _ => acc.set(label, value, line.no)?,
        }
        Ok(())
    }
}

/// Add one continuation row of a multi-line section.
fn apply_row(acc: &mut RecordAccumulator, section: Label, row: &str, line: u32) {
    match section {
        Label::Auction => {
            for token in row.split_whitespace() {
                match note_ref(token) {
                    Some(n) => acc.append(Label::Auction, &format!("({})", n), line),
                    None => acc.push_item(Label::Auction, token, ":", line),
                }
            }
        }
        Label::Play => {
            let trick: String = row
                .split_whitespace()
                .filter(|t| {
                    let note = note_ref(t).is_some();
                    if note {
                        trace!("line {}: note reference {} in play", line, t);
                    }
                    !note
                })
                .collect();
            if !trick.is_empty() {
                acc.push_item(Label::Play, &trick, ":", line);
            }
        }
        _ => acc.push_item(section, row.trim(), ";", line),
    }
}

/// `=3=` style note reference.
fn note_ref(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('=')?.strip_suffix('=')?;
    if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
        Some(inner)
    } else {
        None
    }
}

impl ChunkRead for PbnReader {
    fn read(&mut self, source: &mut LineSource, acc: &mut RecordAccumulator) -> Result<bool> {
        let mut section: Option<Label> = None;

        while let Some(line) = source.next(true)? {
            match line.kind {
                LineKind::Empty | LineKind::Separator => {
                    if !acc.is_blank() {
                        break;
                    }
                }
                LineKind::Comment => {}
                LineKind::Free => match section {
                    Some(label) => apply_row(acc, label, &line.text, line.no),
                    None => {
                        source.note_quirk("stray text outside a section");
                        trace!("{}: stray text", source.describe(&line));
                    }
                },
                LineKind::Structured => {
                    section = None;
                    let (name, value) = match &line.field {
                        Some((name, value)) => (name.as_str(), value.as_str()),
                        None => continue,
                    };
                    let repeated = (name == "Event" && acc.is_set(Label::Event))
                        || (name == "Board" && acc.is_set(Label::BoardNo));
                    if repeated {
                        source.previous();
                        break;
                    }
                    let Some(label) = source.tables().pbn_label(name) else {
                        trace!("{}: tag {} ignored", source.describe(&line), name);
                        continue;
                    };
                    self.apply_tag(acc, &line, label, value)?;
                    if matches!(
                        label,
                        Label::Auction | Label::Play | Label::DoubleDummy | Label::ScoresList
                    ) {
                        section = Some(label);
                    }
                }
            }
        }

        if acc.is_blank() {
            return Ok(false);
        }
        if acc.is_set(Label::BoardNo) && !acc.is_set(Label::Deal) {
            let line = acc.origin(Label::BoardNo).unwrap_or(0);
            return Err(ParseError::at(line, "board has no deal"));
        }
        let new_group = self.carry.finish(acc);
        self.last = acc.clone();
        Ok(new_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn read_all(pbn: &str) -> Result<Vec<RecordAccumulator>> {
        let mut source = LineSource::from_text("t.pbn", pbn, Format::Pbn, &[])?;
        let mut reader = PbnReader::new();
        let mut records = Vec::new();
        while !source.is_exhausted()? {
            let mut acc = RecordAccumulator::new();
            reader.read(&mut source, &mut acc)?;
            if !acc.is_blank() {
                records.push(acc);
            }
        }
        Ok(records)
    }

    #[test]
    fn test_read_simple_pbn() {
        let pbn = r#"
[Board "1"]
[Dealer "N"]
[Vulnerable "None"]
[Deal "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ"]
"#;
        let boards = read_all(pbn).unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].get(Label::BoardNo), Some("1"));
        assert_eq!(boards[0].origin(Label::BoardNo), Some(2));
        assert_eq!(boards[0].get(Label::Dealer), Some("N"));
        assert_eq!(boards[0].get(Label::Vulnerable), Some("None"));
    }

    #[test]
    fn test_read_multiple_boards() {
        let pbn = r#"
[Event "Club"]
[Board "1"]
[Dealer "N"]
[Vulnerable "None"]
[Deal "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ"]
[Event "Club"]
[Board "2"]
[Dealer "E"]
[Vulnerable "NS"]
[Deal "E:Q7.AKT9.JT3.JT96 J653.QJ8.A.AQ732 K92.654.K954.K84 AT84.732.Q8762.5"]
"#;
        let boards = read_all(pbn).unwrap();
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[1].get(Label::BoardNo), Some("2"));
        assert_eq!(boards[1].origin(Label::Event), Some(7));
        assert_eq!(boards[1].get(Label::Vulnerable), Some("NS"));
    }

    #[test]
    fn test_read_pbn_with_commentary() {
        let pbn = r#"
[Board "1"]
[Deal "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ"]
{This is a multi-line
commentary that spans
several lines.}

[Board "2"]
[Deal "E:Q7.AKT9.JT3.JT96 J653.QJ8.A.AQ732 K92.654.K954.K84 AT84.732.Q8762.5"]
"#;
        let boards = read_all(pbn).unwrap();
        assert_eq!(boards.len(), 2);
    }

    #[test]
    fn test_sections() {
        let pbn = r#"[Board "5"]
[Deal "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ"]
[Auction "N"]
1C 1H =1= Pass 3NT
Pass Pass Pass
[Note "1:two suits"]
[Play "E"]
D2 DA D3 D8
H2 H4 HJ HQ
[OptimumResultTable "Declarer;Denomination\2R;Result\2R"]
N NT 9
S NT 9
"#;
        let boards = read_all(pbn).unwrap();
        let acc = &boards[0];
        assert_eq!(acc.get(Label::Auction), Some("1C:1H(1):Pass:3NT:Pass:Pass:Pass"));
        assert_eq!(acc.origin(Label::Auction), Some(4));
        assert_eq!(acc.get(Label::Notes), Some("1:two suits"));
        assert_eq!(acc.get(Label::Play), Some("D2DAD3D8:H2H4HJHQ"));
        assert_eq!(acc.get(Label::DoubleDummy), Some("N NT 9;S NT 9"));
    }

    #[test]
    fn test_hash_repeats_previous_value() {
        let pbn = r#"[Event "Club"]
[Board "1"]
[Deal "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ"]

[Event "#"]
[Board "2"]
[Deal "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ"]
"#;
        let boards = read_all(pbn).unwrap();
        assert_eq!(boards[1].get(Label::Event), Some("Club"));
        assert_eq!(boards[1].origin(Label::Event), Some(5));

        assert!(read_all("[Event \"#\"]\n").is_err());
    }

    #[test]
    fn test_board_without_deal() {
        let err = read_all("[Board \"3\"]\n[Dealer \"S\"]\n").unwrap_err();
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_unknown_tags_and_stray_text() {
        let pbn = "[Board \"1\"]\n[Deal \"N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ\"]\n[BidSystemEW \"Acol\"]\nstray\n";
        let mut source = LineSource::from_text("t.pbn", pbn, Format::Pbn, &[]).unwrap();
        let mut acc = RecordAccumulator::new();
        PbnReader::new().read(&mut source, &mut acc).unwrap();
        assert_eq!(acc.iter().count(), 2);
        assert_eq!(source.quirks().get("stray text outside a section"), Some(&1));
    }
}
