//! Canvas diagrams: fixed-column ASCII layouts with no tags.
//!
//! Nothing in a canvas record is labelled. Fields are found by searching
//! for anchors (a board line, a role name, a seating compass, `Result:`)
//! and then reading at offsets relative to the anchor. Player names wider
//! than their column push everything to their right, so column positions
//! are searched within a window rather than assumed.

pub mod eml;
pub mod rec;
pub mod txt;

use crate::error::{ParseError, Result};
use crate::line::{LineKind, RawLine};
use crate::lin::parse_md;
use crate::reader::HeaderCarry;
use crate::record::{auction_calls, trick_cards, Label, RecordAccumulator};
use crate::source::LineSource;
use bridge_types::{Card, Deal, Direction, Hand, Rank, Suit};
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

/// Widest player name a diagram accepts.
pub const MAX_NAME_WIDTH: usize = 40;

const EAST_WINDOW: usize = MAX_NAME_WIDTH + 8;
const ROLE_WIDTH: usize = 10;
const ROLE_FALLBACK: usize = 8;
const DIAGRAM_ROWS: usize = 15;

const SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
const ROLES: [(&str, Direction); 4] = [
    ("West", Direction::West),
    ("North", Direction::North),
    ("East", Direction::East),
    ("South", Direction::South),
];

const HEADER_PREFIXES: [(&str, Label); 6] = [
    ("Date:", Label::Date),
    ("Location:", Label::Location),
    ("Event:", Label::Event),
    ("Session:", Label::Session),
    ("Scoring:", Label::Scoring),
    ("Teams:", Label::Teams),
];

static SUIT_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([SHDC])\s+(-|(?:10|[AKQJT98765432])+)$").unwrap());
static ROLE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*West\s+North\s+East\s+South\s*$").unwrap());
static RESULT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^Result:\s*(?:(Passed out)|(\S+)\s+by\s+(\w+),\s*(\d+)\s+tricks(?:,\s*score\s+(\S+))?)\s*$",
    )
    .unwrap()
});

/// Nominal columns of one layout.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    /// Column of the North and South blocks
    pub ns_col: usize,
    /// Column East starts at when West is narrow
    pub east_col: usize,
}

/// A line addressed by character column.
pub(crate) struct Row {
    chars: Vec<char>,
}

impl Row {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    pub(crate) fn at(&self, col: usize) -> char {
        self.chars.get(col).copied().unwrap_or(' ')
    }

    pub(crate) fn slice(&self, from: usize, to: usize) -> String {
        let to = to.min(self.chars.len());
        let from = from.min(to);
        self.chars[from..to].iter().collect()
    }

    pub(crate) fn rest(&self, from: usize) -> String {
        self.slice(from, self.chars.len())
    }

    pub(crate) fn starts_with_at(&self, col: usize, needle: &str) -> bool {
        needle
            .chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(col + i) == Some(&c))
    }
}

/// First column in `start..=start + window` where a field begins after two blanks.
pub(crate) fn gap_column(row: &Row, start: usize, window: usize) -> Option<usize> {
    (start.max(2)..=start + window)
        .take_while(|&c| c < row.len())
        .find(|&c| row.at(c) != ' ' && row.at(c - 1) == ' ' && row.at(c - 2) == ' ')
}

/// First column in `start..=start + window` where `needle` occurs.
pub(crate) fn search(row: &Row, needle: &str, start: usize, window: usize) -> Option<usize> {
    (start..=start + window).find(|&c| row.starts_with_at(c, needle))
}

/// `N`, `North`, `n` all give `N`.
pub(crate) fn seat_letter(word: &str) -> Option<String> {
    let c = word.trim().chars().next()?.to_ascii_uppercase();
    Direction::from_char(c).map(|d| d.to_char().to_string())
}

pub(crate) fn seat_name(letter: &str) -> Option<&'static str> {
    let dir = Direction::from_char(letter.chars().next()?)?;
    ROLES.iter().find(|(_, d)| *d == dir).map(|(name, _)| *name)
}

/// The record's deal in either PBN or md notation.
pub(crate) fn deal_of(record: &RecordAccumulator) -> Option<Deal> {
    let value = record.get(Label::Deal)?;
    Deal::from_pbn(value).or_else(|| parse_md(value).map(|(_, deal)| deal))
}

/// First card of the first trick.
pub(crate) fn trick_lead(play: &str) -> Option<&str> {
    play.split(':').next().and_then(|trick| trick_cards(trick).first().copied())
}

/// Whitespace-separated tokens with their starting columns. Parenthesised
/// annotations stay attached to the call before them.
pub(crate) fn tokens(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut depth = 0usize;

    for (col, c) in text.chars().enumerate() {
        if c.is_whitespace() && depth == 0 {
            if !current.is_empty() {
                out.push((start, std::mem::take(&mut current)));
            }
            continue;
        }
        if current.is_empty() {
            start = col;
        }
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(c);
    }
    if !current.is_empty() {
        out.push((start, current));
    }
    out
}

// ---- header block ----

fn set_teams(acc: &mut RecordAccumulator, value: &str, line: u32) -> Result<()> {
    acc.set(Label::Teams, value, line)?;
    if let Some((home, visit)) = value.split_once(" vs ") {
        acc.set(Label::HomeTeam, home.trim(), line)?;
        acc.set(Label::VisitTeam, visit.trim(), line)?;
    }
    Ok(())
}

fn is_header_line(text: &str, title_prefix: Option<&str>) -> bool {
    let text = text.trim();
    title_prefix.map_or(false, |p| text.starts_with(p))
        || HEADER_PREFIXES.iter().any(|(p, _)| text.starts_with(p))
}

/// Store one header line. Returns false when the line is not a header field.
fn read_header_line(
    acc: &mut RecordAccumulator,
    line: &RawLine,
    title_prefix: Option<&str>,
) -> Result<bool> {
    let text = line.text.trim();
    if let Some(value) = title_prefix.and_then(|p| text.strip_prefix(p)) {
        acc.set(Label::Title, value.trim(), line.no)?;
        return Ok(true);
    }
    for (prefix, label) in HEADER_PREFIXES {
        if let Some(value) = text.strip_prefix(prefix) {
            let value = value.trim();
            if label == Label::Teams {
                set_teams(acc, value, line.no)?;
            } else {
                acc.set(label, value, line.no)?;
            }
            return Ok(true);
        }
    }
    // A bare first line is the title
    if title_prefix.is_none() && !acc.is_set(Label::Title) {
        acc.set(Label::Title, text, line.no)?;
        return Ok(true);
    }
    Ok(false)
}

pub(crate) fn write_header(record: &RecordAccumulator, title_prefix: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(title) = record.get(Label::Title) {
        lines.push(match title_prefix {
            Some(prefix) => format!("{} {}", prefix, title),
            None => title.to_string(),
        });
    }
    for (prefix, label) in HEADER_PREFIXES {
        if let Some(value) = record.get(label) {
            lines.push(format!("{} {}", prefix, value));
        }
    }
    lines
}

// ---- deal diagram ----

/// Anchors a layout adds to the plain diagram.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Anchors {
    /// Column of the `W   E` compass on the hearts row
    pub compass: Option<usize>,
    /// Prefix that marks the East name field
    pub east_tag: Option<&'static str>,
}

/// Hands and names read from the fifteen diagram rows.
pub(crate) struct Diagram {
    pub deal: Deal,
    /// (seat, name, line) for North, West, East, South
    pub names: Vec<(Label, String, u32)>,
    /// Line of the first card row
    pub line: u32,
}

fn parse_suit_row(source: &mut LineSource, text: &str, suit: Suit, line: u32) -> Result<Vec<Card>> {
    let caps = SUIT_ROW
        .captures(text.trim())
        .ok_or_else(|| ParseError::at(line, format!("expected {} suit row: {:?}", suit.to_char(), text.trim())))?;
    if caps[1].chars().next() != Some(suit.to_char()) {
        return Err(ParseError::at(line, format!("expected {} suit row", suit.to_char())));
    }

    let holding = &caps[2];
    if holding == "-" {
        return Ok(Vec::new());
    }
    if holding.contains("10") {
        source.note_quirk("10 written for ten");
    }
    let mut cards = Vec::new();
    for rank in holding.replace("10", "T").chars() {
        let rank = Rank::from_char(rank)
            .ok_or_else(|| ParseError::at(line, format!("bad rank {}", rank)))?;
        cards.push(Card::new(suit, rank));
    }
    Ok(cards)
}

fn read_hand(source: &mut LineSource, rows: &[(String, u32)]) -> Result<Hand> {
    let mut cards = Vec::new();
    for ((text, line), suit) in rows.iter().zip(SUITS) {
        cards.extend(parse_suit_row(source, text, suit, *line)?);
    }
    Ok(Hand::from_cards(cards))
}

/// Split a West/East row at the East field.
fn split_west_east(row: &Row, start: usize, east_tag: Option<&str>) -> (String, String) {
    let east = match east_tag {
        Some(tag) => search(row, tag, start, EAST_WINDOW)
            .filter(|&c| c == 0 || row.at(c - 1) == ' '),
        None => gap_column(row, start, EAST_WINDOW),
    };
    match east {
        Some(col) => (row.slice(0, col).trim().to_string(), row.rest(col).trim().to_string()),
        None => (row.rest(0).trim().to_string(), String::new()),
    }
}

/// Read the fifteen rows: North name and suits, West/East names and suits,
/// South name and suits.
pub(crate) fn read_diagram(
    source: &mut LineSource,
    rows: &[RawLine],
    geometry: Geometry,
    anchors: Anchors,
) -> Result<Diagram> {
    if rows.len() < DIAGRAM_ROWS {
        let line = rows.last().map_or(0, |r| r.no);
        return Err(ParseError::at(line, "deal diagram is incomplete"));
    }
    let plain = |i: usize| (rows[i].text.trim().to_string(), rows[i].no);

    let north: Vec<(String, u32)> = (1..5).map(plain).collect();
    let south: Vec<(String, u32)> = (11..15).map(plain).collect();

    let names_row = Row::new(&rows[5].text);
    let (west_name, east_name) = split_west_east(&names_row, geometry.east_col, anchors.east_tag);

    let mut west = Vec::new();
    let mut east = Vec::new();
    for i in 6..10 {
        let row = Row::new(&rows[i].text);
        let (w, e) = match anchors.compass {
            Some(c) => {
                let e = gap_column(&row, c + 5, EAST_WINDOW).map_or(String::new(), |col| row.rest(col));
                (row.slice(0, c).trim().to_string(), e.trim().to_string())
            }
            None => split_west_east(&row, geometry.east_col, None),
        };
        west.push((w, rows[i].no));
        east.push((e, rows[i].no));
    }

    let mut deal = Deal::new();
    deal.set_hand(Direction::North, read_hand(source, &north)?);
    deal.set_hand(Direction::West, read_hand(source, &west)?);
    deal.set_hand(Direction::East, read_hand(source, &east)?);
    deal.set_hand(Direction::South, read_hand(source, &south)?);

    let names = vec![
        (Label::North, rows[0].text.trim().to_string(), rows[0].no),
        (Label::West, west_name, rows[5].no),
        (Label::East, east_name, rows[5].no),
        (Label::South, rows[10].text.trim().to_string(), rows[10].no),
    ];

    Ok(Diagram {
        deal,
        names,
        line: rows[1].no,
    })
}

/// Store the deal and every non-empty name.
pub(crate) fn store_diagram(acc: &mut RecordAccumulator, diagram: &Diagram) -> Result<()> {
    acc.set(Label::Deal, diagram.deal.to_pbn(Direction::North), diagram.line)?;
    for (label, name, line) in &diagram.names {
        if !name.is_empty() {
            acc.set(*label, name.as_str(), *line)?;
        }
    }
    Ok(())
}

fn suit_rows(hand: &Hand) -> Vec<String> {
    SUITS
        .iter()
        .map(|&suit| {
            let mut cards = hand.cards_in_suit(suit);
            if cards.is_empty() {
                return format!("{} -", suit.to_char());
            }
            cards.sort_by(|a, b| b.rank.cmp(&a.rank));
            let ranks: String = cards.iter().map(|c| c.rank.to_char()).collect();
            format!("{} {}", suit.to_char(), ranks)
        })
        .collect()
}

fn clip(name: &str) -> String {
    name.chars().take(MAX_NAME_WIDTH).collect()
}

fn pad_to(text: &mut String, col: usize) {
    let len = text.chars().count();
    if len < col {
        text.push_str(&" ".repeat(col - len));
    }
}

/// West at column 0, East at its column or two blanks past a wide West.
fn join_west_east(west: &str, east: &str, east_col: usize) -> String {
    let mut row = west.to_string();
    if !east.is_empty() {
        let col = east_col.max(west.chars().count() + 2);
        pad_to(&mut row, col);
        row.push_str(east);
    }
    row
}

/// Player names for a diagram: North, West, East, South.
pub(crate) struct Names {
    pub north: String,
    pub west: String,
    pub east: String,
    pub south: String,
}

impl Names {
    pub(crate) fn of(record: &RecordAccumulator) -> Self {
        let name = |label| clip(record.get(label).unwrap_or(""));
        Self {
            north: name(Label::North),
            west: name(Label::West),
            east: name(Label::East),
            south: name(Label::South),
        }
    }
}

pub(crate) fn write_diagram(deal: &Deal, names: &Names, geometry: Geometry, anchors: Anchors) -> Vec<String> {
    let mut rows = Vec::with_capacity(DIAGRAM_ROWS);
    let indent = " ".repeat(geometry.ns_col);
    let centre = |rows: &mut Vec<String>, name: &str, hand: &Hand| {
        rows.push(format!("{}{}", indent, name).trim_end().to_string());
        for suit in suit_rows(hand) {
            rows.push(format!("{}{}", indent, suit));
        }
    };

    centre(&mut rows, &names.north, deal.hand(Direction::North));

    rows.push(join_west_east(&names.west, &names.east, geometry.east_col));
    let west = suit_rows(deal.hand(Direction::West));
    let east = suit_rows(deal.hand(Direction::East));
    for (i, (w, e)) in west.iter().zip(&east).enumerate() {
        match anchors.compass {
            Some(c) => {
                let mut row = w.clone();
                pad_to(&mut row, c);
                row.push_str(match i {
                    0 => "  N",
                    1 => "W   E",
                    2 => "  S",
                    _ => "",
                });
                pad_to(&mut row, geometry.east_col);
                row.push_str(e);
                rows.push(row);
            }
            None => rows.push(join_west_east(w, e, geometry.east_col)),
        }
    }

    centre(&mut rows, &names.south, deal.hand(Direction::South));
    rows
}

// ---- auction table ----

/// Calls read from a role-headed auction table.
pub(crate) struct AuctionTable {
    pub calls: Vec<(String, u32)>,
    /// Seat of the first call
    pub first_seat: Option<Direction>,
    /// Index just past the table
    pub end: usize,
}

fn role_columns(row: &Row) -> Option<[usize; 4]> {
    for width in [ROLE_WIDTH, ROLE_FALLBACK] {
        let mut cols = [0; 4];
        let found = ROLES.iter().enumerate().all(|(i, (role, _))| {
            match search(row, role, (i * width).saturating_sub(2), 4) {
                Some(col) => {
                    cols[i] = col;
                    true
                }
                None => false,
            }
        });
        if found {
            return Some(cols);
        }
    }
    None
}

fn is_marker(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with("Result:") || text.starts_with("Opening Lead:")
}

/// Find the role header at or after `from` and read the calls below it.
pub(crate) fn read_auction(lines: &[RawLine], from: usize) -> Result<Option<AuctionTable>> {
    let Some(header) = (from..lines.len()).find(|&i| ROLE_ROW.is_match(&lines[i].text)) else {
        return Ok(None);
    };
    let cols = role_columns(&Row::new(&lines[header].text))
        .ok_or_else(|| ParseError::at(lines[header].no, "auction roles out of position"))?;

    let mut table = AuctionTable {
        calls: Vec::new(),
        first_seat: None,
        end: header + 1,
    };
    for line in &lines[header + 1..] {
        if line.text.trim().is_empty() || is_marker(&line.text) {
            break;
        }
        for (col, call) in tokens(&line.text) {
            if table.first_seat.is_none() {
                let seat = cols.iter().rposition(|&c| c <= col).unwrap_or(0);
                table.first_seat = Some(ROLES[seat].1);
            }
            table.calls.push((call, line.no));
        }
        table.end += 1;
    }
    Ok(Some(table))
}

/// Append the calls; a missing dealer is taken from the first call's seat.
pub(crate) fn store_auction(acc: &mut RecordAccumulator, table: &AuctionTable) -> Result<()> {
    for (call, line) in &table.calls {
        acc.push_item(Label::Auction, call, ":", *line);
    }
    if let (Some(seat), Some((_, line))) = (table.first_seat, table.calls.first()) {
        if !acc.is_set(Label::Dealer) {
            acc.set(Label::Dealer, seat.to_char().to_string(), *line)?;
        }
    }
    Ok(())
}

pub(crate) fn write_auction(record: &RecordAccumulator) -> Vec<String> {
    let Some(auction) = record.get(Label::Auction).filter(|a| !a.is_empty()) else {
        return Vec::new();
    };
    let dealer = record
        .get(Label::Dealer)
        .and_then(|d| d.chars().next())
        .and_then(Direction::from_char);
    let mut seat = ROLES
        .iter()
        .position(|(_, d)| Some(*d) == dealer)
        .unwrap_or(0);

    let mut header = String::new();
    for (role, _) in ROLES {
        header.push_str(&format!("{:<width$}", role, width = ROLE_WIDTH));
    }
    let mut rows = vec![header.trim_end().to_string()];

    let mut row = " ".repeat(seat * ROLE_WIDTH);
    for call in auction_calls(auction) {
        let width = ROLE_WIDTH.max(call.chars().count() + 2);
        row.push_str(&format!("{:<width$}", call, width = width));
        seat += 1;
        if seat == 4 {
            rows.push(row.trim_end().to_string());
            row.clear();
            seat = 0;
        }
    }
    if !row.trim().is_empty() {
        rows.push(row.trim_end().to_string());
    }
    rows
}

// ---- result line ----

pub(crate) fn is_result_line(text: &str) -> bool {
    text.trim_start().starts_with("Result:")
}

/// `Result: 3NT by S, 9 tricks, score 400` or `Result: Passed out`.
pub(crate) fn read_result_line(acc: &mut RecordAccumulator, line: &RawLine) -> Result<()> {
    let caps = RESULT_LINE
        .captures(line.text.trim())
        .ok_or_else(|| ParseError::at(line.no, "malformed result line"))?;
    if caps.get(1).is_some() {
        acc.set(Label::Contract, "Pass", line.no)?;
        return Ok(());
    }
    acc.set(Label::Contract, &caps[2], line.no)?;
    let declarer = seat_letter(&caps[3])
        .ok_or_else(|| ParseError::at(line.no, format!("bad declarer {}", &caps[3])))?;
    acc.set(Label::Declarer, declarer, line.no)?;
    acc.set(Label::Result, &caps[4], line.no)?;
    if let Some(score) = caps.get(5) {
        acc.set(Label::Score, score.as_str(), line.no)?;
    }
    Ok(())
}

pub(crate) fn write_result_line(record: &RecordAccumulator) -> Option<String> {
    let contract = record.get(Label::Contract)?;
    if contract == "Pass" {
        return Some("Result: Passed out".to_string());
    }
    let declarer = seat_name(record.get(Label::Declarer)?)?;
    let tricks = record.get(Label::Result)?;
    let mut line = format!("Result: {} by {}, {} tricks", contract, declarer, tricks);
    if let Some(score) = record.get(Label::Score) {
        line.push_str(&format!(", score {}", score));
    }
    Some(line)
}

// ---- record driver ----

/// What distinguishes one canvas layout from another.
pub(crate) trait Layout {
    fn title_prefix(&self) -> Option<&'static str>;
    fn is_board_anchor(&self, text: &str) -> bool;
    fn is_terminal(&self, text: &str) -> bool;
    fn ends_at_separator(&self) -> bool {
        false
    }
    /// `board[0]` is the board anchor line.
    fn parse_board(
        &self,
        source: &mut LineSource,
        board: &[RawLine],
        acc: &mut RecordAccumulator,
    ) -> Result<()>;
}

/// Read a header block or one board.
pub(crate) fn read_canvas<L: Layout>(
    layout: &L,
    carry: &mut HeaderCarry,
    source: &mut LineSource,
    acc: &mut RecordAccumulator,
) -> Result<bool> {
    let mut board: Vec<RawLine> = Vec::new();

    while let Some(line) = source.next(true)? {
        if board.is_empty() {
            if layout.is_board_anchor(line.text.trim()) {
                if !acc.is_blank() {
                    source.previous();
                    break;
                }
                board.push(line);
                continue;
            }
            if matches!(line.kind, LineKind::Empty | LineKind::Separator) {
                continue;
            }
            if !read_header_line(acc, &line, layout.title_prefix())? {
                source.note_quirk("stray text outside a board");
                trace!("{}: stray text", source.describe(&line));
            }
            continue;
        }

        if layout.is_board_anchor(line.text.trim()) || is_header_line(&line.text, layout.title_prefix()) {
            source.previous();
            break;
        }
        if line.kind == LineKind::Separator && layout.ends_at_separator() {
            break;
        }
        let terminal = layout.is_terminal(&line.text);
        board.push(line);
        if terminal {
            break;
        }
    }

    if !board.is_empty() {
        layout.parse_board(source, &board, acc)?;
        if !acc.is_set(Label::Deal) {
            return Err(ParseError::at(board[0].no, "board has no deal"));
        }
        if let Some(n) = acc.board_number() {
            acc.guess_dealer_and_vul(n);
        }
    }

    if acc.is_blank() {
        return Ok(false);
    }
    Ok(carry.finish(acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn source() -> LineSource {
        LineSource::from_text("t.txt", "x\n", Format::Txt, &[]).unwrap()
    }

    fn raw(lines: &[String]) -> Vec<RawLine> {
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| RawLine {
                text: text.clone(),
                no: i as u32 + 1,
                source: 0,
                kind: if text.trim().is_empty() { LineKind::Empty } else { LineKind::Free },
                field: None,
            })
            .collect()
    }

    fn sample_deal() -> Deal {
        Deal::from_pbn("N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ")
            .unwrap()
    }

    fn names(west: &str) -> Names {
        Names {
            north: "Nora".to_string(),
            west: west.to_string(),
            east: "Eve".to_string(),
            south: "Sam".to_string(),
        }
    }

    #[test]
    fn test_gap_column() {
        let row = Row::new("S AK43                  S QJ");
        assert_eq!(gap_column(&row, 24, 10), Some(24));
        let row = Row::new("Alexander von Humboldt the Younger  Eve");
        assert_eq!(gap_column(&row, 24, EAST_WINDOW), Some(36));
        assert_eq!(gap_column(&Row::new("S AK43"), 24, 10), None);
    }

    #[test]
    fn test_tokens_keep_annotations() {
        let toks = tokens("          1C(could be short)  P");
        assert_eq!(
            toks,
            vec![(10, "1C(could be short)".to_string()), (30, "P".to_string())]
        );
    }

    #[test]
    fn test_diagram_round_trip() {
        let geometry = Geometry { ns_col: 12, east_col: 24 };
        let deal = sample_deal();
        let rows = write_diagram(&deal, &names("Wanda"), geometry, Anchors::default());
        assert_eq!(rows.len(), DIAGRAM_ROWS);

        let mut src = source();
        let diagram = read_diagram(&mut src, &raw(&rows), geometry, Anchors::default()).unwrap();
        assert_eq!(diagram.deal.to_pbn(Direction::North), deal.to_pbn(Direction::North));
        assert_eq!(diagram.names[1].1, "Wanda");
        assert_eq!(diagram.names[2].1, "Eve");
        assert_eq!(diagram.line, 2);
    }

    #[test]
    fn test_wide_west_name_pushes_east() {
        let geometry = Geometry { ns_col: 12, east_col: 24 };
        let wide = "W".repeat(MAX_NAME_WIDTH);
        let rows = write_diagram(&sample_deal(), &names(&wide), geometry, Anchors::default());
        assert!(rows[5].starts_with(&wide));
        assert!(rows[5].ends_with("  Eve"));

        let mut src = source();
        let diagram = read_diagram(&mut src, &raw(&rows), geometry, Anchors::default()).unwrap();
        assert_eq!(diagram.names[1].1, wide);
        assert_eq!(diagram.names[2].1, "Eve");
    }

    #[test]
    fn test_ten_quirk() {
        let mut src = source();
        let cards = parse_suit_row(&mut src, "H A109", Suit::Hearts, 3).unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(src.quirks().get("10 written for ten"), Some(&1));
        assert!(parse_suit_row(&mut src, "S A109", Suit::Hearts, 3).is_err());
        assert!(parse_suit_row(&mut src, "H -", Suit::Hearts, 3).unwrap().is_empty());
    }

    #[test]
    fn test_auction_table() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::Dealer, "E", 1).unwrap();
        acc.set(Label::Auction, "1C(strong):P:1H:P:P:P", 1).unwrap();
        let rows = write_auction(&acc);
        assert_eq!(rows[0], "West      North     East      South");
        assert!(rows[1].starts_with("                    1C(strong)"));

        let lines = raw(&rows);
        let table = read_auction(&lines, 0).unwrap().unwrap();
        assert_eq!(table.first_seat, Some(Direction::East));
        let calls: Vec<&str> = table.calls.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(calls, vec!["1C(strong)", "P", "1H", "P", "P", "P"]);
        assert_eq!(table.end, rows.len());
    }

    #[test]
    fn test_auction_table_alert_text() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::Dealer, "N", 1).unwrap();
        acc.set(Label::Auction, "1C(Stayman: asks):1H(11-15 (5+ clubs)):P", 1).unwrap();
        let rows = write_auction(&acc);
        let table = read_auction(&raw(&rows), 0).unwrap().unwrap();
        let calls: Vec<&str> = table.calls.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(calls, vec!["1C(Stayman: asks)", "1H(11-15 (5+ clubs))", "P"]);
    }

    #[test]
    fn test_role_fallback_width() {
        let row = Row::new("West    North   East    South");
        assert_eq!(role_columns(&row), Some([0, 8, 16, 24]));
    }

    #[test]
    fn test_result_line() {
        let line = raw(&["Result: 3NT by South, 9 tricks, score 400".to_string()]);
        let mut acc = RecordAccumulator::new();
        read_result_line(&mut acc, &line[0]).unwrap();
        assert_eq!(acc.get(Label::Contract), Some("3NT"));
        assert_eq!(acc.get(Label::Declarer), Some("S"));
        assert_eq!(acc.get(Label::Result), Some("9"));
        assert_eq!(acc.get(Label::Score), Some("400"));
        assert_eq!(
            write_result_line(&acc).as_deref(),
            Some("Result: 3NT by South, 9 tricks, score 400")
        );

        let bad = raw(&["Result: who knows".to_string()]);
        assert!(read_result_line(&mut RecordAccumulator::new(), &bad[0]).is_err());
    }
}
