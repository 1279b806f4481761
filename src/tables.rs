//! Read-only dialect tables.
//!
//! Built once on first use and shared by reference between every reader and
//! every worker thread; nothing mutates them afterwards.

use crate::record::Label;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// What a pipe-delimited tag means to the LIN state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinTag {
    Header(Label),
    Players,
    BoardNo,
    Deal,
    Vulnerable,
    Call,
    Alert,
    Card,
    Claim,
    ScoreMP,
    Note,
    /// Presentation-only tags consumed without a label.
    Display,
}

const LIN_TAGS: &[(&str, LinTag)] = &[
    ("vg", LinTag::Header(Label::Title)),
    ("rs", LinTag::Header(Label::ScoresList)),
    ("pw", LinTag::Header(Label::PlayersHeader)),
    ("bn", LinTag::Header(Label::BoardsList)),
    ("pn", LinTag::Players),
    ("qx", LinTag::BoardNo),
    ("md", LinTag::Deal),
    ("sv", LinTag::Vulnerable),
    ("mb", LinTag::Call),
    ("an", LinTag::Alert),
    ("pc", LinTag::Card),
    ("mc", LinTag::Claim),
    ("mp", LinTag::ScoreMP),
    ("nt", LinTag::Note),
    ("ah", LinTag::Display),
    ("pg", LinTag::Display),
    ("st", LinTag::Display),
    ("rh", LinTag::Display),
    ("sk", LinTag::Display),
    ("hs", LinTag::Display),
    ("at", LinTag::Display),
    ("nn", LinTag::Display),
];

/// PBN tag names in writing order.
pub const PBN_TAGS: &[(&str, Label)] = &[
    ("Event", Label::Event),
    ("Site", Label::Location),
    ("Date", Label::Date),
    ("Description", Label::Title),
    ("Stage", Label::Session),
    ("Teams", Label::Teams),
    ("HomeTeam", Label::HomeTeam),
    ("VisitTeam", Label::VisitTeam),
    ("Board", Label::BoardNo),
    ("Room", Label::Room),
    ("West", Label::West),
    ("North", Label::North),
    ("East", Label::East),
    ("South", Label::South),
    ("Dealer", Label::Dealer),
    ("Vulnerable", Label::Vulnerable),
    ("Deal", Label::Deal),
    ("Scoring", Label::Scoring),
    ("Declarer", Label::Declarer),
    ("Contract", Label::Contract),
    ("Result", Label::Result),
    ("Score", Label::Score),
    ("ScoreIMP", Label::ScoreIMP),
    ("ScoreMP", Label::ScoreMP),
    ("Auction", Label::Auction),
    ("Play", Label::Play),
    ("Note", Label::Notes),
    ("OptimumResultTable", Label::DoubleDummy),
    ("ScoreTable", Label::ScoresList),
];

/// Single-character prefixes shared by RBN and RBX.
pub const RBN_CHARS: &[(char, Label)] = &[
    ('T', Label::Title),
    ('D', Label::Date),
    ('L', Label::Location),
    ('E', Label::Event),
    ('S', Label::Session),
    ('F', Label::Scoring),
    ('K', Label::Teams),
    ('B', Label::BoardNo),
    ('O', Label::Room),
    ('H', Label::Deal),
    ('G', Label::Dealer),
    ('V', Label::Vulnerable),
    ('N', Label::Players),
    ('A', Label::Auction),
    ('X', Label::Declarer),
    ('C', Label::Contract),
    ('P', Label::Play),
    ('R', Label::Result),
    ('Z', Label::Score),
    ('I', Label::ScoreIMP),
    ('M', Label::ScoreMP),
    ('Y', Label::DoubleDummy),
    ('J', Label::Notes),
];

/// Lookup tables for every tagged dialect.
#[derive(Debug)]
pub struct FormatTables {
    lin: HashMap<&'static str, LinTag>,
    pbn: HashMap<&'static str, Label>,
    rbn: [Option<Label>; 128],
}

impl FormatTables {
    fn build() -> Self {
        let mut rbn = [None; 128];
        for &(c, label) in RBN_CHARS {
            rbn[c as usize] = Some(label);
        }
        Self {
            lin: LIN_TAGS.iter().copied().collect(),
            pbn: PBN_TAGS.iter().copied().collect(),
            rbn,
        }
    }

    pub fn lin_tag(&self, tag: &str) -> Option<LinTag> {
        self.lin.get(tag).copied()
    }

    pub fn pbn_label(&self, tag: &str) -> Option<Label> {
        self.pbn.get(tag).copied()
    }

    pub fn rbn_label(&self, c: char) -> Option<Label> {
        if c.is_ascii() {
            self.rbn[c as usize]
        } else {
            None
        }
    }
}

static TABLES: Lazy<FormatTables> = Lazy::new(FormatTables::build);

/// The process-wide tables.
pub fn tables() -> &'static FormatTables {
    &TABLES
}

pub fn pbn_tag(label: Label) -> Option<&'static str> {
    PBN_TAGS.iter().find(|(_, l)| *l == label).map(|(t, _)| *t)
}

pub fn rbn_char(label: Label) -> Option<char> {
    RBN_CHARS.iter().find(|(_, l)| *l == label).map(|(c, _)| *c)
}
