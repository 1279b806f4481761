//! LIN record writer.

use super::{dealer_digit, parse_md, parse_sv, sv_code};
use crate::record::{auction_calls, call_parts, trick_cards, Label, RecordAccumulator};
use bridge_types::{Deal, Direction, Suit, Vulnerability};

const HEADER_TAGS: [(&str, Label); 4] = [
    ("vg", Label::Title),
    ("rs", Label::ScoresList),
    ("pw", Label::PlayersHeader),
    ("bn", Label::BoardsList),
];

/// Encode a deal as an md value: dealer digit, then South, West and North.
pub fn encode_md(deal: &Deal, dealer: Direction) -> String {
    let mut out = String::new();
    out.push(dealer_digit(dealer));

    let hands: Vec<String> = [Direction::South, Direction::West, Direction::North]
        .iter()
        .map(|&dir| {
            let hand = deal.hand(dir);
            let mut s = String::new();
            for suit in Suit::ALL {
                s.push(suit.to_char());
                let mut cards = hand.cards_in_suit(suit);
                cards.sort_by(|a, b| b.rank.cmp(&a.rank));
                for card in cards {
                    s.push(card.rank.to_char());
                }
            }
            s
        })
        .collect();

    out.push_str(&hands.join(","));
    out.push(',');
    out
}

fn md_value(record: &RecordAccumulator) -> Option<String> {
    let value = record.get(Label::Deal)?;
    if parse_md(value).is_some() {
        return Some(value.to_string());
    }
    match Deal::from_pbn(value) {
        Some(deal) => {
            let dealer = record
                .get(Label::Dealer)
                .and_then(|d| d.chars().next())
                .and_then(Direction::from_char)
                .unwrap_or(Direction::North);
            Some(encode_md(&deal, dealer))
        }
        None => Some(value.to_string()),
    }
}

fn sv_value(value: &str) -> String {
    if parse_sv(value).is_some() {
        return value.to_string();
    }
    match Vulnerability::from_pbn(value) {
        Some(vul) => sv_code(vul).to_string(),
        None => value.to_string(),
    }
}

/// Write one record, one pair per line.
pub fn write_record(record: &RecordAccumulator) -> String {
    let mut lines = Vec::new();
    let mut header = false;

    for (tag, label) in HEADER_TAGS {
        if let Some(value) = record.get(label) {
            lines.push(format!("{}|{}|", tag, value));
            header = true;
        }
    }
    // pn only reads as the players list inside a header block
    if header {
        if let Some(players) = record.get(Label::PlayersList) {
            lines.push(format!("pn|{}|", players));
        }
    }

    if let Some(board) = record.get(Label::BoardNo) {
        lines.push(format!("qx|{}|", board));
    }
    if let Some(players) = record.get(Label::Players) {
        lines.push(format!("pn|{}|", players));
    }
    if let Some(md) = md_value(record) {
        lines.push(format!("md|{}|", md));
    }
    if let Some(vul) = record.get(Label::Vulnerable) {
        lines.push(format!("sv|{}|", sv_value(vul)));
    }

    if let Some(auction) = record.get(Label::Auction) {
        for item in auction_calls(auction) {
            let (call, alerts) = call_parts(item);
            if !call.is_empty() {
                lines.push(format!("mb|{}|", call));
            }
            for alert in alerts {
                lines.push(format!("an|{}|", alert));
            }
        }
    }

    if let Some(play) = record.get(Label::Play) {
        for trick in play.split(':') {
            for card in trick_cards(trick) {
                lines.push(format!("pc|{}|", card));
            }
        }
    }

    if let Some(result) = record.get(Label::Result) {
        lines.push(format!("mc|{}|", result));
    }
    if let Some(mp) = record.get(Label::ScoreMP) {
        lines.push(format!("mp|{}|", mp));
    }
    if let Some(notes) = record.get(Label::Notes) {
        for note in notes.split('\n') {
            lines.push(format!("nt|{}|", note));
        }
    }

    lines.join("\n") + "\n"
}
