//! E-mail style diagram with a seating compass.
//!
//! The hearts row of the West/East block carries a `W   E` compass, with
//! `N` above and `S` below. The compass row anchors the whole diagram: its
//! seven rows above and seven below are the fifteen diagram rows.

use super::{
    deal_of, is_result_line, read_auction, read_canvas, read_diagram, read_result_line,
    seat_letter, seat_name, store_auction, store_diagram, trick_lead, write_auction,
    write_diagram, write_header, write_result_line, Anchors, Geometry, Layout, Names, Row,
};
use crate::error::{ParseError, Result};
use crate::line::RawLine;
use crate::pbn::vul_value;
use crate::reader::{ChunkRead, HeaderCarry};
use crate::record::{Label, RecordAccumulator};
use crate::source::LineSource;
use once_cell::sync::Lazy;
use regex::Regex;

pub const GEOMETRY: Geometry = Geometry {
    ns_col: 18,
    east_col: 30,
};

const COMPASS_COL: usize = 18;
const COMPASS_SEARCH: std::ops::RangeInclusive<usize> = 18..=22;
const COMPASS_FALLBACK: usize = 16;
const SEPARATOR: &str = "----------------------------------------";

static BOARD_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Board\s+(\S+)(?:\s+\(([^)]+?)\s+Room\))?\s*$").unwrap());
static DEALER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Dealer:\s*(\w+)\s+Vulnerable:\s*(.+?)\s*$").unwrap());

fn is_compass(lines: &[RawLine], i: usize, col: usize) -> bool {
    if i == 0 || i + 1 >= lines.len() {
        return false;
    }
    let row = Row::new(&lines[i].text);
    row.starts_with_at(col, "W   E")
        && Row::new(&lines[i - 1].text).at(col + 2) == 'N'
        && Row::new(&lines[i + 1].text).at(col + 2) == 'S'
}

/// (row index, column) of the compass.
fn find_compass(lines: &[RawLine]) -> Option<(usize, usize)> {
    let columns: Vec<usize> = COMPASS_SEARCH.chain([COMPASS_FALLBACK]).collect();
    (0..lines.len()).find_map(|i| {
        columns
            .iter()
            .find(|&&col| is_compass(lines, i, col))
            .map(|&col| (i, col))
    })
}

struct Eml;

impl Layout for Eml {
    fn title_prefix(&self) -> Option<&'static str> {
        Some("Subject:")
    }

    fn is_board_anchor(&self, text: &str) -> bool {
        BOARD_LINE.is_match(text)
    }

    fn is_terminal(&self, text: &str) -> bool {
        is_result_line(text)
    }

    fn ends_at_separator(&self) -> bool {
        true
    }

    fn parse_board(
        &self,
        source: &mut LineSource,
        board: &[RawLine],
        acc: &mut RecordAccumulator,
    ) -> Result<()> {
        let anchor = &board[0];
        let caps = BOARD_LINE
            .captures(anchor.text.trim())
            .ok_or_else(|| ParseError::at(anchor.no, "malformed board line"))?;
        acc.set(Label::BoardNo, &caps[1], anchor.no)?;
        if let Some(room) = caps.get(2) {
            acc.set(Label::Room, room.as_str(), anchor.no)?;
        }

        let preamble = board
            .iter()
            .find_map(|l| DEALER_LINE.captures(l.text.trim()).map(|caps| (l.no, caps)));
        if let Some((line, caps)) = preamble {
            let dealer = seat_letter(&caps[1])
                .ok_or_else(|| ParseError::at(line, format!("bad dealer {}", &caps[1])))?;
            acc.set(Label::Dealer, dealer, line)?;
            acc.set(Label::Vulnerable, &caps[2], line)?;
        }

        let (a, col) = find_compass(board)
            .ok_or_else(|| ParseError::at(anchor.no, "seating compass not found"))?;
        if a < 7 {
            return Err(ParseError::at(board[a].no, "deal diagram is incomplete"));
        }
        let anchors = Anchors {
            compass: Some(col),
            east_tag: None,
        };
        let diagram = read_diagram(source, &board[a - 7..], GEOMETRY, anchors)?;
        store_diagram(acc, &diagram)?;

        let mut next = a + 8;
        if let Some(table) = read_auction(board, next)? {
            store_auction(acc, &table)?;
            next = table.end;
        }
        for line in board.iter().skip(next) {
            let text = line.text.trim();
            if let Some(lead) = text.strip_prefix("Opening Lead:") {
                acc.set(Label::Play, lead.trim(), line.no)?;
            } else if is_result_line(text) {
                read_result_line(acc, line)?;
            }
        }
        Ok(())
    }
}

/// Reader for e-mail style diagrams.
#[derive(Default)]
pub struct EmlReader {
    carry: HeaderCarry,
}

impl EmlReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkRead for EmlReader {
    fn read(&mut self, source: &mut LineSource, acc: &mut RecordAccumulator) -> Result<bool> {
        read_canvas(&Eml, &mut self.carry, source, acc)
    }
}

/// Render one record as an e-mail style diagram. Only the opening lead of
/// the play survives.
pub fn write_record(record: &RecordAccumulator) -> String {
    let mut lines = write_header(record, Some("Subject:"));

    if let Some(board) = record.get(Label::BoardNo) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(match record.get(Label::Room) {
            Some(room) => format!("Board {} ({} Room)", board, room),
            None => format!("Board {}", board),
        });
        let dealer = record.get(Label::Dealer).and_then(seat_name);
        if let (Some(dealer), Some(vul)) = (dealer, record.get(Label::Vulnerable)) {
            lines.push(format!("Dealer: {}  Vulnerable: {}", dealer, vul_value(vul)));
        }
        lines.push(String::new());

        if let Some(deal) = deal_of(record) {
            let anchors = Anchors {
                compass: Some(COMPASS_COL),
                east_tag: None,
            };
            lines.extend(write_diagram(&deal, &Names::of(record), GEOMETRY, anchors));
            lines.push(String::new());
        }
        let auction = write_auction(record);
        if !auction.is_empty() {
            lines.extend(auction);
            lines.push(String::new());
        }
        if let Some(lead) = record.get(Label::Play).and_then(trick_lead) {
            lines.push(format!("Opening Lead: {}", lead));
        }
        if let Some(result) = write_result_line(record) {
            lines.push(result);
        }
        lines.push(SEPARATOR.to_string());
    }

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::reader::ChunkReader;
    use crate::record::ResetRange;

    const DEAL: &str = "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ";

    fn sample() -> RecordAccumulator {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::Title, "Club Night", 1).unwrap();
        acc.set(Label::BoardNo, "3", 2).unwrap();
        acc.set(Label::Room, "Open", 2).unwrap();
        acc.set(Label::Dealer, "S", 3).unwrap();
        acc.set(Label::Vulnerable, "EW", 3).unwrap();
        acc.set(Label::Deal, DEAL, 4).unwrap();
        acc.set(Label::North, "Nora", 4).unwrap();
        acc.set(Label::West, "Wanda", 4).unwrap();
        acc.set(Label::East, "Eve", 4).unwrap();
        acc.set(Label::South, "Sam", 4).unwrap();
        acc.set(Label::Auction, "1C:1H:P:P:P", 5).unwrap();
        acc.set(Label::Play, "DK", 6).unwrap();
        acc.set(Label::Contract, "1H", 7).unwrap();
        acc.set(Label::Declarer, "E", 7).unwrap();
        acc.set(Label::Result, "8", 7).unwrap();
        acc
    }

    fn read(text: &str) -> Vec<crate::reader::Chunk> {
        let source = LineSource::from_text("t.eml", text, Format::Eml, &[]).unwrap();
        ChunkReader::new(source).map(|c| c.unwrap()).collect()
    }

    #[test]
    fn test_compass_layout() {
        let text = write_record(&sample());
        let lines: Vec<&str> = text.lines().collect();
        let a = lines.iter().position(|l| l.contains("W   E")).unwrap();
        assert_eq!(lines[a].find("W   E"), Some(COMPASS_COL));
        assert_eq!(lines[a - 1].chars().nth(COMPASS_COL + 2), Some('N'));
        assert!(lines.contains(&"Dealer: South  Vulnerable: EW"));
        assert!(lines.contains(&"Opening Lead: DK"));
        assert_eq!(lines.last(), Some(&SEPARATOR));
    }

    #[test]
    fn test_write_then_read() {
        let chunks = read(&write_record(&sample()));
        assert_eq!(chunks.len(), 2);
        let board = &chunks[1].record;
        assert_eq!(board.get(Label::Title), Some("Club Night"));
        assert_eq!(board.get(Label::Room), Some("Open"));
        assert_eq!(board.get(Label::Deal), Some(DEAL));
        assert_eq!(board.get(Label::Play), Some("DK"));
        assert!(!board.differs_from(&sample(), ResetRange::All));
    }

    #[test]
    fn test_shifted_compass() {
        let text = write_record(&sample());
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        let a = lines.iter().position(|l| l.contains("W   E")).unwrap();
        let anchors = Anchors {
            compass: Some(COMPASS_FALLBACK),
            east_tag: None,
        };
        let deal = deal_of(&sample()).unwrap();
        let rows = write_diagram(&deal, &Names::of(&sample()), GEOMETRY, anchors);
        lines.splice(a - 7..=a + 7, rows);

        let chunks = read(&lines.join("\n"));
        assert_eq!(chunks[1].record.get(Label::Deal), Some(DEAL));
        assert_eq!(chunks[1].record.get(Label::East), Some("Eve"));
    }

    #[test]
    fn test_missing_compass_is_error() {
        let source = LineSource::from_text(
            "t.eml",
            "Board 1\nDealer: North  Vulnerable: None\n\nno diagram\n",
            Format::Eml,
            &[],
        )
        .unwrap();
        assert!(ChunkReader::new(source).next().unwrap().is_err());
    }
}
