//! Canonical record model.
//!
//! Every dialect reader writes into a [`RecordAccumulator`]: a fixed table of
//! canonical [`Label`]s, each holding a value and the line it came from.

use crate::error::DuplicateLabelError;
use bridge_types::{Direction, Vulnerability};
use std::fmt;

/// Canonical field labels shared by all dialects.
///
/// The declaration order matters: header labels come first, then the board
/// labels, and the [`ResetRange`]s are contiguous slices of this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Title,
    Date,
    Location,
    Event,
    Session,
    Scoring,
    Teams,
    HomeTeam,
    VisitTeam,
    PlayersList,
    PlayersHeader,
    ScoresList,
    BoardsList,
    BoardNo,
    Room,
    Deal,
    Dealer,
    Vulnerable,
    Players,
    West,
    North,
    East,
    South,
    Auction,
    Declarer,
    Contract,
    Play,
    Result,
    Score,
    ScoreIMP,
    ScoreMP,
    DoubleDummy,
    Notes,
}

impl Label {
    pub const COUNT: usize = 33;

    pub const ALL: [Label; Label::COUNT] = [
        Label::Title,
        Label::Date,
        Label::Location,
        Label::Event,
        Label::Session,
        Label::Scoring,
        Label::Teams,
        Label::HomeTeam,
        Label::VisitTeam,
        Label::PlayersList,
        Label::PlayersHeader,
        Label::ScoresList,
        Label::BoardsList,
        Label::BoardNo,
        Label::Room,
        Label::Deal,
        Label::Dealer,
        Label::Vulnerable,
        Label::Players,
        Label::West,
        Label::North,
        Label::East,
        Label::South,
        Label::Auction,
        Label::Declarer,
        Label::Contract,
        Label::Play,
        Label::Result,
        Label::Score,
        Label::ScoreIMP,
        Label::ScoreMP,
        Label::DoubleDummy,
        Label::Notes,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Append labels concatenate writes; all others are set-once.
    pub fn is_append(self) -> bool {
        matches!(self, Label::Auction | Label::Play | Label::Notes)
    }

    pub fn is_header(self) -> bool {
        ResetRange::HeaderOnly.contains(self)
    }

    pub fn name(self) -> &'static str {
        match self {
            Label::Title => "title",
            Label::Date => "date",
            Label::Location => "location",
            Label::Event => "event",
            Label::Session => "session",
            Label::Scoring => "scoring",
            Label::Teams => "teams",
            Label::HomeTeam => "home team",
            Label::VisitTeam => "visit team",
            Label::PlayersList => "players list",
            Label::PlayersHeader => "players header",
            Label::ScoresList => "scores list",
            Label::BoardsList => "boards list",
            Label::BoardNo => "board",
            Label::Room => "room",
            Label::Deal => "deal",
            Label::Dealer => "dealer",
            Label::Vulnerable => "vulnerable",
            Label::Players => "players",
            Label::West => "west",
            Label::North => "north",
            Label::East => "east",
            Label::South => "south",
            Label::Auction => "auction",
            Label::Declarer => "declarer",
            Label::Contract => "contract",
            Label::Play => "play",
            Label::Result => "result",
            Label::Score => "score",
            Label::ScoreIMP => "score imp",
            Label::ScoreMP => "score mp",
            Label::DoubleDummy => "double dummy",
            Label::Notes => "notes",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Semantic slices of the label table used for resets and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRange {
    All,
    HeaderOnly,
    BoardOnly,
    DealOnly,
}

impl ResetRange {
    pub fn contains(self, label: Label) -> bool {
        match self {
            ResetRange::All => true,
            ResetRange::HeaderOnly => label <= Label::BoardsList,
            ResetRange::BoardOnly => label >= Label::BoardNo,
            ResetRange::DealOnly => matches!(
                label,
                Label::Deal | Label::Dealer | Label::Vulnerable | Label::DoubleDummy
            ),
        }
    }

    pub fn labels(self) -> impl Iterator<Item = Label> {
        Label::ALL.into_iter().filter(move |l| self.contains(*l))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    value: String,
    line: u32,
}

/// Label → value table for one logical record (a header or a board).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordAccumulator {
    fields: Vec<Option<Field>>,
}

impl Default for RecordAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordAccumulator {
    pub fn new() -> Self {
        Self {
            fields: vec![None; Label::COUNT],
        }
    }

    /// Clear every label in `range`.
    pub fn reset(&mut self, range: ResetRange) {
        for label in range.labels() {
            self.fields[label.index()] = None;
        }
    }

    /// Clear one label so it can be written again.
    pub fn clear(&mut self, label: Label) {
        self.fields[label.index()] = None;
    }

    /// Write a label. Set-once labels reject a second write; append labels
    /// behave like [`append`](Self::append).
    pub fn set(
        &mut self,
        label: Label,
        value: impl Into<String>,
        line: u32,
    ) -> Result<(), DuplicateLabelError> {
        let value = value.into();
        if label.is_append() {
            self.append(label, &value, line);
            return Ok(());
        }
        match &self.fields[label.index()] {
            Some(existing) => Err(DuplicateLabelError {
                label,
                origin_line: existing.line,
                line,
            }),
            None => {
                self.fields[label.index()] = Some(Field { value, line });
                Ok(())
            }
        }
    }

    /// Concatenate `value` onto a label. The first write fixes the origin line.
    pub fn append(&mut self, label: Label, value: &str, line: u32) {
        match &mut self.fields[label.index()] {
            Some(field) => field.value.push_str(value),
            slot @ None => {
                *slot = Some(Field {
                    value: value.to_string(),
                    line,
                })
            }
        }
    }

    /// Append `item`, preceded by `sep` unless the label is still empty.
    pub fn push_item(&mut self, label: Label, item: &str, sep: &str, line: u32) {
        if self.is_empty(label) {
            self.append(label, item, line);
        } else {
            self.append(label, sep, line);
            self.append(label, item, line);
        }
    }

    pub fn get(&self, label: Label) -> Option<&str> {
        self.fields[label.index()].as_ref().map(|f| f.value.as_str())
    }

    /// Line the label was first written from.
    pub fn origin(&self, label: Label) -> Option<u32> {
        self.fields[label.index()].as_ref().map(|f| f.line)
    }

    pub fn is_set(&self, label: Label) -> bool {
        self.fields[label.index()].is_some()
    }

    /// True when the label is unset or holds an empty value.
    pub fn is_empty(&self, label: Label) -> bool {
        self.get(label).map_or(true, str::is_empty)
    }

    /// True when no label at all is set.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(Option::is_none)
    }

    /// True when no label of `range` is set.
    pub fn range_is_blank(&self, range: ResetRange) -> bool {
        range.labels().all(|l| !self.is_set(l))
    }

    /// Copy the labels of `range` from `other`, unset labels included.
    pub fn copy_from(&mut self, other: &RecordAccumulator, range: ResetRange) {
        for label in range.labels() {
            self.fields[label.index()] = other.fields[label.index()].clone();
        }
    }

    /// True if any label in `range` has a different value (origins are ignored).
    pub fn differs_from(&self, other: &RecordAccumulator, range: ResetRange) -> bool {
        range.labels().any(|l| self.get(l) != other.get(l))
    }

    /// Fill in Dealer and Vulnerable from the board number when they are absent.
    pub fn guess_dealer_and_vul(&mut self, board_no: u32) {
        let line = self.origin(Label::BoardNo).unwrap_or(0);
        let (dealer, vul) = dealer_and_vul(board_no);
        if !self.is_set(Label::Dealer) {
            self.fields[Label::Dealer.index()] = Some(Field {
                value: dealer.to_char().to_string(),
                line,
            });
        }
        if !self.is_set(Label::Vulnerable) {
            self.fields[Label::Vulnerable.index()] = Some(Field {
                value: vul.to_pbn().to_string(),
                line,
            });
        }
    }

    /// Numeric part of the board label: "o12" and "12" both give 12.
    pub fn board_number(&self) -> Option<u32> {
        let value = self.get(Label::BoardNo)?;
        let digits: String = value
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    /// Set labels in canonical order with their values and origin lines.
    pub fn iter(&self) -> impl Iterator<Item = (Label, &str, u32)> {
        Label::ALL.into_iter().filter_map(move |l| {
            self.fields[l.index()]
                .as_ref()
                .map(|f| (l, f.value.as_str(), f.line))
        })
    }
}

impl fmt::Display for RecordAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value, line) in self.iter() {
            writeln!(f, "{:>5}  {}: {}", line, label, value)?;
        }
        Ok(())
    }
}

/// Dealer and vulnerability of a board in the standard 16-board rotation.
pub fn dealer_and_vul(board_no: u32) -> (Direction, Vulnerability) {
    // Board 16 and board 0 share a slot so every input maps somewhere.
    let slot = (board_no as usize + 15) % 16;
    let dealer = match slot % 4 {
        0 => Direction::North,
        1 => Direction::East,
        2 => Direction::South,
        _ => Direction::West,
    };
    let vul = match slot {
        0 | 7 | 10 | 13 => Vulnerability::None,
        1 | 4 | 11 | 14 => Vulnerability::NorthSouth,
        2 | 5 | 8 | 15 => Vulnerability::EastWest,
        _ => Vulnerability::Both,
    };
    (dealer, vul)
}

/// Split one trick of a canonical play string into cards.
///
/// Cards are two characters (suit, rank); `-` and `*` stand alone.
pub fn trick_cards(trick: &str) -> Vec<&str> {
    let mut cards = Vec::new();
    let mut rest = trick;
    while let Some(c) = rest.chars().next() {
        let width = if c == '-' || c == '*' {
            1
        } else {
            rest.char_indices().nth(2).map_or(rest.len(), |(i, _)| i)
        };
        cards.push(&rest[..width]);
        rest = &rest[width..];
    }
    cards
}

/// Split a canonical auction into calls, each with its `(...)` annotations.
///
/// Annotation text is free: a `:` or a nested `(...)` inside it belongs to
/// the annotation, not to the auction.
pub fn auction_calls(auction: &str) -> Vec<&str> {
    let mut calls = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in auction.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                calls.push(&auction[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < auction.len() || !calls.is_empty() {
        calls.push(&auction[start..]);
    }
    calls
}

/// Split one call of [`auction_calls`] into the call and the text of each
/// annotation, outer parentheses removed.
pub fn call_parts(item: &str) -> (&str, Vec<&str>) {
    let call_end = item.find('(').unwrap_or(item.len());
    let mut notes = Vec::new();
    let mut depth = 0usize;
    let mut open = call_end;
    for (i, c) in item[call_end..].char_indices() {
        let i = i + call_end;
        match c {
            '(' => {
                if depth == 0 {
                    open = i + 1;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    notes.push(&item[open..i]);
                }
            }
            _ => {}
        }
    }
    if depth > 0 {
        notes.push(&item[open..]);
    }
    (&item[..call_end], notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auction_calls_keep_annotation_text() {
        assert_eq!(auction_calls("1C:P:P:P"), vec!["1C", "P", "P", "P"]);
        assert_eq!(
            auction_calls("1C(Stayman: asks):P"),
            vec!["1C(Stayman: asks)", "P"]
        );
        assert_eq!(
            auction_calls("1C(11-15 (5+ clubs)):1H"),
            vec!["1C(11-15 (5+ clubs))", "1H"]
        );
        assert!(auction_calls("").is_empty());
    }

    #[test]
    fn test_call_parts() {
        assert_eq!(call_parts("1C"), ("1C", vec![]));
        assert_eq!(call_parts("1C(Stayman: asks)"), ("1C", vec!["Stayman: asks"]));
        assert_eq!(call_parts("1C(11-15 (5+ clubs))"), ("1C", vec!["11-15 (5+ clubs)"]));
        assert_eq!(call_parts("2D(1)(2)"), ("2D", vec!["1", "2"]));
        assert_eq!(call_parts("(lead-in)"), ("", vec!["lead-in"]));
    }

    #[test]
    fn test_set_once_rejects_second_write() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::BoardNo, "1", 3).unwrap();
        let err = acc.set(Label::BoardNo, "2", 9).unwrap_err();
        assert_eq!(err.label, Label::BoardNo);
        assert_eq!(err.origin_line, 3);
        assert_eq!(err.line, 9);
        assert_eq!(acc.get(Label::BoardNo), Some("1"));
    }

    #[test]
    fn test_reset_allows_rewrite() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::Title, "Spring", 1).unwrap();
        acc.set(Label::BoardNo, "1", 2).unwrap();
        acc.reset(ResetRange::BoardOnly);
        assert!(acc.is_set(Label::Title));
        assert!(!acc.is_set(Label::BoardNo));
        acc.set(Label::BoardNo, "2", 7).unwrap();
        assert_eq!(acc.origin(Label::BoardNo), Some(7));
    }

    #[test]
    fn test_append_never_fails() {
        let mut acc = RecordAccumulator::new();
        for (i, call) in ["1C", "P", "1H", "P"].iter().enumerate() {
            acc.push_item(Label::Auction, call, ":", 10 + i as u32);
        }
        acc.set(Label::Auction, ":P", 20).unwrap();
        assert_eq!(acc.get(Label::Auction), Some("1C:P:1H:P:P"));
        assert_eq!(acc.origin(Label::Auction), Some(10));
    }

    #[test]
    fn test_reset_ranges() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::Event, "Cup", 1).unwrap();
        acc.set(Label::Deal, "N:...", 2).unwrap();
        acc.set(Label::Contract, "3N", 3).unwrap();
        acc.reset(ResetRange::DealOnly);
        assert!(acc.is_set(Label::Event));
        assert!(!acc.is_set(Label::Deal));
        assert!(acc.is_set(Label::Contract));
        acc.reset(ResetRange::HeaderOnly);
        assert!(!acc.is_set(Label::Event));
        acc.reset(ResetRange::All);
        assert!(acc.is_blank());
    }

    #[test]
    fn test_copy_and_diff_header_range() {
        let mut a = RecordAccumulator::new();
        a.set(Label::Title, "Final", 1).unwrap();
        a.set(Label::BoardNo, "4", 2).unwrap();

        let mut b = RecordAccumulator::new();
        b.set(Label::BoardNo, "5", 8).unwrap();
        assert!(b.differs_from(&a, ResetRange::HeaderOnly));

        b.copy_from(&a, ResetRange::HeaderOnly);
        assert!(!b.differs_from(&a, ResetRange::HeaderOnly));
        assert!(b.differs_from(&a, ResetRange::BoardOnly));
        assert_eq!(b.get(Label::BoardNo), Some("5"));
    }

    #[test]
    fn test_is_empty_vs_is_set() {
        let mut acc = RecordAccumulator::new();
        assert!(acc.is_empty(Label::Auction));
        acc.append(Label::Auction, "", 4);
        assert!(acc.is_set(Label::Auction));
        assert!(acc.is_empty(Label::Auction));
    }

    #[test]
    fn test_guess_board_one() {
        let mut acc = RecordAccumulator::new();
        acc.guess_dealer_and_vul(1);
        assert_eq!(
            acc.get(Label::Dealer),
            Some(Direction::North.to_char().to_string().as_str())
        );
        assert_eq!(
            acc.get(Label::Vulnerable),
            Some(Vulnerability::None.to_pbn().to_string().as_str())
        );
    }

    #[test]
    fn test_guess_is_periodic() {
        for n in 1..=64u32 {
            let mut a = RecordAccumulator::new();
            let mut b = RecordAccumulator::new();
            a.guess_dealer_and_vul(n);
            b.guess_dealer_and_vul(n + 16);
            assert!(!a.differs_from(&b, ResetRange::All), "board {}", n);
        }
    }

    #[test]
    fn test_guess_keeps_existing_values() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::Dealer, "W", 5).unwrap();
        acc.guess_dealer_and_vul(1);
        assert_eq!(acc.get(Label::Dealer), Some("W"));
        assert!(acc.is_set(Label::Vulnerable));
    }

    #[test]
    fn test_rotation_table() {
        assert_eq!(dealer_and_vul(2).0, Direction::East);
        assert_eq!(dealer_and_vul(2).1, Vulnerability::NorthSouth);
        assert_eq!(dealer_and_vul(4).1, Vulnerability::Both);
        assert_eq!(dealer_and_vul(8).0, Direction::West);
        assert_eq!(dealer_and_vul(8).1, Vulnerability::None);
        assert_eq!(dealer_and_vul(16).1, Vulnerability::EastWest);
    }

    #[test]
    fn test_board_number() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::BoardNo, "o12", 1).unwrap();
        assert_eq!(acc.board_number(), Some(12));
    }

    #[test]
    fn test_trick_cards() {
        assert_eq!(trick_cards("D2DAD3D8"), vec!["D2", "DA", "D3", "D8"]);
        assert_eq!(trick_cards("S4-H2"), vec!["S4", "-", "H2"]);
        assert!(trick_cards("").is_empty());
    }
}
