//! Plain text diagram.
//!
//! ```text
//! Summer Pairs
//! Date: 2024-05-01
//!
//! Board 1  Dealer N  Vul None
//!
//!             Nora
//!             S K843
//!             ...
//! Wanda                   Eve
//! S AQJ7                  S 962
//! ...
//! West      North     East      South
//!           1C        P         P
//!
//! Result: 3NT by South, 9 tricks, score 400
//! ```

use super::{
    deal_of, is_result_line, read_auction, read_canvas, read_diagram, read_result_line,
    seat_letter, store_auction, store_diagram, write_auction, write_diagram, write_header,
    write_result_line, Anchors, Geometry, Layout, Names, SUIT_ROW,
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
    ns_col: 12,
    east_col: 24,
};

static BOARD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Board\s+(\S+)(?:\s+Dealer\s+(\w+))?(?:\s+Vul\s+(.+?))?\s*$").unwrap()
});

struct Txt;

impl Layout for Txt {
    fn title_prefix(&self) -> Option<&'static str> {
        None
    }

    fn is_board_anchor(&self, text: &str) -> bool {
        BOARD_LINE.is_match(text)
    }

    fn is_terminal(&self, text: &str) -> bool {
        is_result_line(text)
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
        if let Some(dealer) = caps.get(2) {
            let letter = seat_letter(dealer.as_str())
                .ok_or_else(|| ParseError::at(anchor.no, format!("bad dealer {}", dealer.as_str())))?;
            acc.set(Label::Dealer, letter, anchor.no)?;
        }
        if let Some(vul) = caps.get(3) {
            acc.set(Label::Vulnerable, vul.as_str(), anchor.no)?;
        }

        // North's name row sits one to three rows below the board line
        let top = (1..=3)
            .find(|&i| {
                board
                    .get(i + 1)
                    .map_or(false, |row| SUIT_ROW.is_match(row.text.trim()) && row.text.trim().starts_with('S'))
            })
            .ok_or_else(|| ParseError::at(anchor.no, "no deal diagram below board line"))?;
        let rows = board.get(top..).unwrap_or_default();
        let diagram = read_diagram(source, rows, GEOMETRY, Anchors::default())?;
        store_diagram(acc, &diagram)?;

        let mut next = top + super::DIAGRAM_ROWS;
        if let Some(table) = read_auction(board, next)? {
            store_auction(acc, &table)?;
            next = table.end;
        }
        for line in board.iter().skip(next) {
            if is_result_line(&line.text) {
                read_result_line(acc, line)?;
            }
        }
        Ok(())
    }
}

/// Reader for plain text diagrams.
#[derive(Default)]
pub struct TxtReader {
    carry: HeaderCarry,
}

impl TxtReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkRead for TxtReader {
    fn read(&mut self, source: &mut LineSource, acc: &mut RecordAccumulator) -> Result<bool> {
        read_canvas(&Txt, &mut self.carry, source, acc)
    }
}

/// Render one record as a plain text diagram.
pub fn write_record(record: &RecordAccumulator) -> String {
    let mut lines = write_header(record, None);

    if let Some(board) = record.get(Label::BoardNo) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        let mut anchor = format!("Board {}", board);
        if let Some(dealer) = record.get(Label::Dealer) {
            anchor.push_str(&format!("  Dealer {}", dealer));
        }
        if let Some(vul) = record.get(Label::Vulnerable) {
            anchor.push_str(&format!("  Vul {}", vul_value(vul)));
        }
        lines.push(anchor);
        lines.push(String::new());

        if let Some(deal) = deal_of(record) {
            lines.extend(write_diagram(&deal, &Names::of(record), GEOMETRY, Anchors::default()));
            lines.push(String::new());
        }
        let auction = write_auction(record);
        if !auction.is_empty() {
            lines.extend(auction);
            lines.push(String::new());
        }
        if let Some(result) = write_result_line(record) {
            lines.push(result);
        }
    }

    lines.join("\n") + "\n"
}
