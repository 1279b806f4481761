//! LIN record state machine.

use super::dealer_from_digit;
use crate::error::{ParseError, Result};
use crate::line::{split_pipe_pairs, LineKind};
use crate::reader::{ChunkRead, HeaderCarry};
use crate::record::{Label, RecordAccumulator, ResetRange};
use crate::source::LineSource;
use crate::tables::LinTag;
use log::{debug, trace};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum State {
    AwaitHeader,
    Header,
    BoardFields,
    Auction,
    Play,
    Result,
}

#[derive(Debug, Clone)]
struct Pair {
    tag: String,
    value: String,
    line: u32,
    /// Provider the line came from
    source: usize,
    /// First pair of its physical line
    first: bool,
}

/// Reads one record of `tag|value|` pairs.
///
/// Several pairs may share a physical line; when a record ends in the middle
/// of a line the remaining pairs are held until the next call.
#[derive(Default)]
pub struct LinReader {
    pending: VecDeque<Pair>,
    carry: HeaderCarry,
    last_board: RecordAccumulator,
}

enum Step {
    Continue(State),
    Boundary,
}

impl LinReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_pair(&mut self, source: &mut LineSource) -> Result<Option<Pair>> {
        loop {
            if let Some(pair) = self.pending.pop_front() {
                return Ok(Some(pair));
            }
            let Some(line) = source.next(true)? else {
                return Ok(None);
            };
            match line.kind {
                LineKind::Structured => {
                    let Some((pairs, _)) = split_pipe_pairs(line.text.trim()) else {
                        continue;
                    };
                    for (i, (tag, value)) in pairs.into_iter().enumerate() {
                        self.pending.push_back(Pair {
                            tag: tag.to_string(),
                            value: value.to_string(),
                            line: line.no,
                            source: line.source,
                            first: i == 0,
                        });
                    }
                }
                LineKind::Empty | LineKind::Separator | LineKind::Comment => {}
                LineKind::Free => {
                    let error = ParseError::at(line.no, "expected tag|value| pairs");
                    return Err(source.locate(line.source, error));
                }
            }
        }
    }

    fn apply(
        &mut self,
        source: &mut LineSource,
        acc: &mut RecordAccumulator,
        state: State,
        cards: &mut usize,
        pair: &Pair,
    ) -> Result<Step> {
        let Some(tag) = source.tables().lin_tag(&pair.tag) else {
            return Err(ParseError::at(pair.line, format!("unknown tag {}", pair.tag)));
        };
        let line = pair.line;
        let value = pair.value.as_str();
        let in_board = state >= State::BoardFields;

        let next = match tag {
            LinTag::Header(label) => {
                if in_board {
                    return Ok(Step::Boundary);
                }
                acc.set(label, value, line)?;
                State::Header
            }
            LinTag::Players => match state {
                State::Header => {
                    acc.set(Label::PlayersList, value, line)?;
                    State::Header
                }
                _ if acc.is_set(Label::Players) => return Ok(Step::Boundary),
                _ => {
                    acc.set(Label::Players, value, line)?;
                    state.max(State::BoardFields)
                }
            },
            LinTag::BoardNo => {
                if acc.is_set(Label::BoardNo) || state >= State::Auction {
                    return Ok(Step::Boundary);
                }
                acc.set(Label::BoardNo, value, line)?;
                State::BoardFields
            }
            LinTag::Deal => {
                if acc.is_set(Label::Deal) || state >= State::Auction {
                    return Ok(Step::Boundary);
                }
                acc.set(Label::Deal, value, line)?;
                if let Some(dealer) = value.chars().next().and_then(dealer_from_digit) {
                    if !acc.is_set(Label::Dealer) {
                        acc.set(Label::Dealer, dealer.to_char().to_string(), line)?;
                    }
                }
                state.max(State::BoardFields)
            }
            LinTag::Vulnerable => {
                acc.set(Label::Vulnerable, value, line)?;
                state.max(State::BoardFields)
            }
            LinTag::Call => {
                if state >= State::Play {
                    return Err(ParseError::at(line, format!("call {} after play started", value)));
                }
                acc.push_item(Label::Auction, value, ":", line);
                State::Auction
            }
            LinTag::Alert => {
                acc.append(Label::Auction, &format!("({})", value), line);
                state
            }
            LinTag::Card => {
                if state == State::Result {
                    return Err(ParseError::at(line, format!("card {} after claim", value)));
                }
                let played: Vec<char> = value.trim().chars().collect();
                if played.len() > 2 {
                    source.note_quirk("several cards in one pc");
                }
                for card in played.chunks(2) {
                    let card: String = card.iter().collect();
                    if *cards > 0 && *cards % 4 == 0 {
                        acc.append(Label::Play, ":", line);
                    }
                    acc.append(Label::Play, &card, line);
                    *cards += 1;
                }
                State::Play
            }
            LinTag::Claim => {
                if value.trim().parse::<u8>().is_err() {
                    return Err(ParseError::at(line, format!("claim is not a trick count: {}", value)));
                }
                // The last claim of a board is the one that stood
                if acc.is_set(Label::Result) {
                    source.note_quirk("repeated claim");
                    acc.clear(Label::Result);
                }
                acc.set(Label::Result, value.trim(), line)?;
                State::Result
            }
            LinTag::ScoreMP => {
                acc.set(Label::ScoreMP, value, line)?;
                state
            }
            LinTag::Note => {
                acc.push_item(Label::Notes, value, "\n", line);
                state
            }
            LinTag::Display => {
                trace!("line {}: display tag {} skipped", line, pair.tag);
                state
            }
        };
        Ok(Step::Continue(next))
    }

    /// A board that names a number but no deal borrows the deal from the
    /// other room's record of the same board.
    fn complete_board(&mut self, acc: &mut RecordAccumulator) -> Result<()> {
        if !acc.is_set(Label::BoardNo) {
            return Ok(());
        }
        if !acc.is_set(Label::Deal) {
            let same_board = acc.board_number().is_some()
                && acc.board_number() == self.last_board.board_number();
            if !same_board || !self.last_board.is_set(Label::Deal) {
                let line = acc.origin(Label::BoardNo).unwrap_or(0);
                return Err(ParseError::at(
                    line,
                    format!("board {} has no deal", acc.get(Label::BoardNo).unwrap_or("?")),
                ));
            }
            debug!("board {}: deal taken from previous room", acc.get(Label::BoardNo).unwrap_or("?"));
            acc.copy_from(&self.last_board, ResetRange::DealOnly);
        }
        self.last_board = acc.clone();
        Ok(())
    }
}

impl ChunkRead for LinReader {
    fn read(&mut self, source: &mut LineSource, acc: &mut RecordAccumulator) -> Result<bool> {
        let mut state = State::AwaitHeader;
        let mut cards = 0;

        while let Some(pair) = self.next_pair(source)? {
            let step = self
                .apply(source, acc, state, &mut cards, &pair)
                .map_err(|e| source.locate(pair.source, e))?;
            match step {
                Step::Continue(next) => state = next,
                Step::Boundary => {
                    if pair.first {
                        self.pending.clear();
                        source.previous();
                    } else {
                        self.pending.push_front(pair);
                    }
                    break;
                }
            }
        }

        if acc.is_blank() {
            return Ok(false);
        }
        self.complete_board(acc)?;
        Ok(self.carry.finish(acc))
    }

    fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn read_all(text: &str) -> Result<Vec<RecordAccumulator>> {
        let mut source = LineSource::from_text("t.lin", text, Format::Lin, &[])?;
        let mut reader = LinReader::new();
        let mut records = Vec::new();
        while !source.is_exhausted()? || reader.has_pending() {
            let mut acc = RecordAccumulator::new();
            reader.read(&mut source, &mut acc)?;
            if !acc.is_blank() {
                records.push(acc);
            }
        }
        Ok(records)
    }

    #[test]
    fn test_one_pair_per_line() {
        let text = "qx|o1|\nmd|3SAKHJD876C5432,S2HQT9DKQ5CKQJT9,SQJT9HA32DAJ2CA8,|\nmb|1C|\nmb|P|\nmb|P|\nmb|P|\nmc|13|\n";
        let records = read_all(text).unwrap();
        assert_eq!(records.len(), 1);
        let acc = &records[0];
        assert_eq!(acc.get(Label::BoardNo), Some("o1"));
        assert_eq!(acc.origin(Label::BoardNo), Some(1));
        assert_eq!(acc.origin(Label::Deal), Some(2));
        assert_eq!(acc.get(Label::Dealer), Some("N"));
        assert_eq!(acc.get(Label::Auction), Some("1C:P:P:P"));
        assert_eq!(acc.origin(Label::Auction), Some(3));
        assert_eq!(acc.get(Label::Result), Some("13"));
        assert_eq!(acc.origin(Label::Result), Some(7));
    }

    #[test]
    fn test_boundary_in_mid_line() {
        let text = "qx|o1|md|3SA,,,|mb|1C|pc|D2|qx|o2|md|1SK,,,|\nmb|P|\n";
        let records = read_all(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(Label::Play), Some("D2"));
        assert_eq!(records[1].get(Label::BoardNo), Some("o2"));
        assert_eq!(records[1].origin(Label::BoardNo), Some(1));
        assert_eq!(records[1].get(Label::Dealer), Some("S"));
        assert_eq!(records[1].get(Label::Auction), Some("P"));
        assert_eq!(records[1].origin(Label::Auction), Some(2));
    }

    #[test]
    fn test_alerts_and_tricks() {
        let text = "qx|o1|md|3SA,,,|mb|1C|an|strong|mb|P|\npc|D2|pc|DA|pc|D3|pc|D8|pc|H2|\nnt|first|nt|second|\n";
        let records = read_all(text).unwrap();
        let acc = &records[0];
        assert_eq!(acc.get(Label::Auction), Some("1C(strong):P"));
        assert_eq!(acc.get(Label::Play), Some("D2DAD3D8:H2"));
        assert_eq!(acc.get(Label::Notes), Some("first\nsecond"));
    }

    #[test]
    fn test_packed_cards_quirk() {
        let text = "qx|o1|md|3SA,,,|pc|D2DAD3|pc|D8|pc|H2|\n";
        let mut source = LineSource::from_text("t.lin", text, Format::Lin, &[]).unwrap();
        let mut reader = LinReader::new();
        let mut acc = RecordAccumulator::new();
        reader.read(&mut source, &mut acc).unwrap();
        assert_eq!(acc.get(Label::Play), Some("D2DAD3D8:H2"));
        assert_eq!(source.quirks().get("several cards in one pc"), Some(&1));
    }

    #[test]
    fn test_repeated_claim_last_wins() {
        let text = "qx|o1|md|3SA,,,|pc|D2|mc|10|\nmc|9|\n";
        let mut source = LineSource::from_text("t.lin", text, Format::Lin, &[]).unwrap();
        let mut reader = LinReader::new();
        let mut acc = RecordAccumulator::new();
        reader.read(&mut source, &mut acc).unwrap();
        assert_eq!(acc.get(Label::Result), Some("9"));
        assert_eq!(acc.origin(Label::Result), Some(2));
        assert_eq!(source.quirks().get("repeated claim"), Some(&1));
    }

    #[test]
    fn test_error_in_embedded_file_is_located() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("deal.lin"), "md|3SA,,,|\nzz|bad|\n").unwrap();
        let mut source = LineSource::from_text("t.lin", "qx|o1|\nef|deal.lin|\n", Format::Lin, &[])
            .unwrap()
            .with_base_dir(dir.path());
        let mut reader = LinReader::new();
        let mut acc = RecordAccumulator::new();
        let err = reader.read(&mut source, &mut acc).unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.file().unwrap().ends_with("deal.lin"));
    }

    #[test]
    fn test_header_then_boards() {
        let text = "vg|Spring Cup,RR1,I,1,2,A,0,B,0|\npn|a,b,c,d,e,f,g,h|\nqx|o1|pn|a,b,c,d|md|3SA,,,|\nqx|c1|pn|e,f,g,h|md|3SA,,,|\n";
        let records = read_all(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(Label::PlayersList), Some("a,b,c,d,e,f,g,h"));
        assert_eq!(records[0].get(Label::Players), Some("a,b,c,d"));
        assert_eq!(records[1].get(Label::Players), Some("e,f,g,h"));
        assert_eq!(records[1].get(Label::Title), Some("Spring Cup,RR1,I,1,2,A,0,B,0"));
    }

    #[test]
    fn test_deal_borrowed_from_other_room() {
        let text = "qx|o3|md|3SA,,,|sv|e|\nqx|c3|mb|P|\n";
        let records = read_all(text).unwrap();
        assert_eq!(records[1].get(Label::Deal), Some("3SA,,,"));
        assert_eq!(records[1].get(Label::Vulnerable), Some("e"));
        assert_eq!(records[1].origin(Label::Deal), Some(1));

        let err = read_all("qx|o3|md|3SA,,,|\nqx|c4|mb|P|\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_errors() {
        assert!(read_all("qx|o1|md|3SA,,,|mc|ten|\n").is_err());
        assert!(read_all("qx|o1|md|3SA,,,|zz|1|\n").is_err());
        assert!(read_all("qx|o1|md|3SA,,,|pc|D2|mb|P|\n").is_err());
        let err = read_all("vg|a|\nvg|b|\n").unwrap_err();
        assert!(matches!(err, ParseError::Duplicate(_)));
    }

    #[test]
    fn test_display_tags_skipped() {
        let text = "pn|a,b,c,d|st||md|3SA,,,|rh||ah|Board 1|sv|o|pg||\n";
        let records = read_all(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(Label::Players), Some("a,b,c,d"));
        assert_eq!(records[0].get(Label::Vulnerable), Some("o"));
    }
}
