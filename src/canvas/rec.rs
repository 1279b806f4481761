//! Record-sheet diagram: role-prefixed names and a trick table.
//!
//! ```text
//! Board 1  Room Open  Dealer N  Vul None
//!
//!           North: Nora
//!           S K843
//!           ...
//! West: Wanda             East: Eve
//! ...
//! Auction: 1NT P 3NT P P P
//! Contract: 3NT by N
//!
//! Trick  Lead   2nd    3rd    4th
//! 1      D2     DA     D3     D8
//!
//! Result: 9 tricks, score 400
//! ```

use super::{
    deal_of, is_result_line, read_canvas, read_diagram, search, seat_letter, store_diagram,
    tokens, write_diagram, write_header, Anchors, Geometry, Layout, Names, Row, DIAGRAM_ROWS,
};
use crate::error::{ParseError, Result};
use crate::line::RawLine;
use crate::pbn::vul_value;
use crate::reader::{ChunkRead, HeaderCarry};
use crate::record::{auction_calls, trick_cards, Label, RecordAccumulator};
use crate::source::LineSource;
use once_cell::sync::Lazy;
use regex::Regex;

pub const GEOMETRY: Geometry = Geometry {
    ns_col: 10,
    east_col: 24,
};

const TRICK_WIDTH: usize = 7;
const TRICK_COLUMNS: [&str; 4] = ["Lead", "2nd", "3rd", "4th"];
const TRICK_HEADER_ROW: &str = "Trick  Lead   2nd    3rd    4th";

static BOARD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^Board\s+(\S+)(?:\s+Room\s+(\S+))?(?:\s+Dealer\s+(\w+))?(?:\s+Vul\s+(.+?))?\s*$",
    )
    .unwrap()
});
static CONTRACT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Contract:\s*(?:(Passed out)|(\S+)(?:\s+by\s+(\w+))?)\s*$").unwrap()
});
static RESULT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Result:\s*(\d+)\s+tricks(?:,\s*score\s+(\S+))?\s*$").unwrap());
static TRICK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Trick\s+Lead\s+2nd\s+3rd\s+4th\s*$").unwrap());

/// Strip the `Role:` prefix from a diagram name field.
fn role_name(field: &str, role: &str, line: u32) -> Result<String> {
    let prefix = format!("{}:", role);
    field
        .strip_prefix(&prefix)
        .map(|name| name.trim().to_string())
        .ok_or_else(|| ParseError::at(line, format!("expected {} in diagram", prefix)))
}

/// Columns of the four card cells, found near their nominal offsets.
fn trick_columns(header: &Row) -> Option<[usize; 4]> {
    let mut cols = [0; 4];
    for (i, name) in TRICK_COLUMNS.iter().enumerate() {
        let nominal = (i + 1) * TRICK_WIDTH;
        cols[i] = search(header, name, nominal.saturating_sub(2), 4)?;
    }
    Some(cols)
}

/// Read trick rows below the header at `lines[0]`.
fn read_tricks(acc: &mut RecordAccumulator, lines: &[RawLine]) -> Result<()> {
    let header = &lines[0];
    let cols = trick_columns(&Row::new(&header.text))
        .ok_or_else(|| ParseError::at(header.no, "trick columns out of position"))?;

    for line in &lines[1..] {
        if line.text.trim().is_empty() || is_result_line(&line.text) {
            break;
        }
        let mut cells = tokens(&line.text).into_iter();
        let Some((_, number)) = cells.next() else {
            break;
        };
        if number.parse::<u32>().is_err() {
            return Err(ParseError::at(line.no, format!("bad trick number {}", number)));
        }

        let mut trick = String::new();
        let mut seat = 0;
        for (col, card) in cells {
            // A card belongs to the first column it reaches, and columns only move right
            let Some(i) = cols.iter().position(|&c| col <= c + 2).filter(|&i| i >= seat) else {
                return Err(ParseError::at(line.no, format!("card {} outside trick columns", card)));
            };
            seat = i + 1;
            trick.push_str(&card);
        }
        acc.push_item(Label::Play, &trick, ":", line.no);
    }
    Ok(())
}

struct Rec;

impl Layout for Rec {
    fn title_prefix(&self) -> Option<&'static str> {
        Some("Title:")
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
        if let Some(room) = caps.get(2) {
            acc.set(Label::Room, room.as_str(), anchor.no)?;
        }
        if let Some(dealer) = caps.get(3) {
            let letter = seat_letter(dealer.as_str())
                .ok_or_else(|| ParseError::at(anchor.no, format!("bad dealer {}", dealer.as_str())))?;
            acc.set(Label::Dealer, letter, anchor.no)?;
        }
        if let Some(vul) = caps.get(4) {
            acc.set(Label::Vulnerable, vul.as_str(), anchor.no)?;
        }

        let top = (1..=3)
            .find(|&i| board.get(i).map_or(false, |r| r.text.trim_start().starts_with("North:")))
            .ok_or_else(|| ParseError::at(anchor.no, "no deal diagram below board line"))?;
        let anchors = Anchors {
            compass: None,
            east_tag: Some("East:"),
        };
        let mut diagram = read_diagram(source, &board[top..], GEOMETRY, anchors)?;
        for ((_, name, line), role) in diagram.names.iter_mut().zip(["North", "West", "East", "South"]) {
            *name = role_name(name, role, *line)?;
        }
        store_diagram(acc, &diagram)?;

        let rest = top + DIAGRAM_ROWS;
        for (i, line) in board.iter().enumerate().skip(rest) {
            let text = line.text.trim();
            if let Some(calls) = text.strip_prefix("Auction:") {
                for (_, call) in tokens(calls) {
                    acc.push_item(Label::Auction, &call, ":", line.no);
                }
            } else if text.starts_with("Contract:") {
                let caps = CONTRACT_LINE
                    .captures(text)
                    .ok_or_else(|| ParseError::at(line.no, "malformed contract line"))?;
                if caps.get(1).is_some() {
                    acc.set(Label::Contract, "Pass", line.no)?;
                } else {
                    acc.set(Label::Contract, &caps[2], line.no)?;
                    if let Some(declarer) = caps.get(3) {
                        let letter = seat_letter(declarer.as_str()).ok_or_else(|| {
                            ParseError::at(line.no, format!("bad declarer {}", declarer.as_str()))
                        })?;
                        acc.set(Label::Declarer, letter, line.no)?;
                    }
                }
            } else if TRICK_HEADER.is_match(text) {
                read_tricks(acc, &board[i..])?;
            } else if is_result_line(text) {
                let caps = RESULT_LINE
                    .captures(text)
                    .ok_or_else(|| ParseError::at(line.no, "malformed result line"))?;
                acc.set(Label::Result, &caps[1], line.no)?;
                if let Some(score) = caps.get(2) {
                    acc.set(Label::Score, score.as_str(), line.no)?;
                }
            }
        }
        Ok(())
    }
}

/// Reader for record-sheet diagrams.
#[derive(Default)]
pub struct RecReader {
    carry: HeaderCarry,
}

impl RecReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkRead for RecReader {
    fn read(&mut self, source: &mut LineSource, acc: &mut RecordAccumulator) -> Result<bool> {
        read_canvas(&Rec, &mut self.carry, source, acc)
    }
}

fn prefixed(role: &str, name: &str) -> String {
    format!("{}: {}", role, name).trim_end().to_string()
}

/// Render one record as a record sheet.
pub fn write_record(record: &RecordAccumulator) -> String {
    let mut lines = write_header(record, Some("Title:"));

    if let Some(board) = record.get(Label::BoardNo) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        let mut anchor = format!("Board {}", board);
        if let Some(room) = record.get(Label::Room) {
            anchor.push_str(&format!("  Room {}", room));
        }
        if let Some(dealer) = record.get(Label::Dealer) {
            anchor.push_str(&format!("  Dealer {}", dealer));
        }
        if let Some(vul) = record.get(Label::Vulnerable) {
            anchor.push_str(&format!("  Vul {}", vul_value(vul)));
        }
        lines.push(anchor);
        lines.push(String::new());

        if let Some(deal) = deal_of(record) {
            let names = Names::of(record);
            let names = Names {
                north: prefixed("North", &names.north),
                west: prefixed("West", &names.west),
                east: prefixed("East", &names.east),
                south: prefixed("South", &names.south),
            };
            let anchors = Anchors {
                compass: None,
                east_tag: Some("East:"),
            };
            lines.extend(write_diagram(&deal, &names, GEOMETRY, anchors));
            lines.push(String::new());
        }

        if let Some(auction) = record.get(Label::Auction) {
            lines.push(format!("Auction: {}", auction_calls(auction).join(" ")).trim_end().to_string());
        }
        match (record.get(Label::Contract), record.get(Label::Declarer)) {
            (Some("Pass"), _) => lines.push("Contract: Passed out".to_string()),
            (Some(contract), Some(declarer)) => {
                lines.push(format!("Contract: {} by {}", contract, declarer))
            }
            (Some(contract), None) => lines.push(format!("Contract: {}", contract)),
            (None, _) => {}
        }

        if let Some(play) = record.get(Label::Play) {
            lines.push(String::new());
            lines.push(TRICK_HEADER_ROW.to_string());
            for (n, trick) in play.split(':').enumerate() {
                let mut row = format!("{:<width$}", n + 1, width = TRICK_WIDTH);
                for card in trick_cards(trick) {
                    row.push_str(&format!("{:<width$}", card, width = TRICK_WIDTH));
                }
                lines.push(row.trim_end().to_string());
            }
        }

        if let Some(tricks) = record.get(Label::Result) {
            lines.push(String::new());
            let mut result = format!("Result: {} tricks", tricks);
            if let Some(score) = record.get(Label::Score) {
                result.push_str(&format!(", score {}", score));
            }
            lines.push(result);
        }
    }

    lines.join("\n") + "\n"
}
