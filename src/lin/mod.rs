//! LIN (Linear) format, the pipe-delimited BBO record format.
//!
//! Each physical line holds one or more `tag|value|` pairs. Records are
//! recovered by a state machine over the pairs, see [`LinReader`].

mod reader;
mod writer;

pub use reader::LinReader;
pub use writer::{encode_md, write_record};

use bridge_types::{Card, Deal, Direction, Hand, Rank, Suit, Vulnerability};

/// Dealer encoded by the leading digit of an md value: 1=S, 2=W, 3=N, 4=E.
pub fn dealer_from_digit(c: char) -> Option<Direction> {
    match c {
        '1' => Some(Direction::South),
        '2' => Some(Direction::West),
        '3' => Some(Direction::North),
        '4' => Some(Direction::East),
        _ => None,
    }
}

pub fn dealer_digit(dealer: Direction) -> char {
    match dealer {
        Direction::South => '1',
        Direction::West => '2',
        Direction::North => '3',
        Direction::East => '4',
    }
}

/// Parse the md (make deal) field
/// Format: dealer_digit + hands (3 hands, 4th is implied)
pub fn parse_md(md_str: &str) -> Option<(Direction, Deal)> {
    let dealer = dealer_from_digit(md_str.chars().next()?)?;

    let hands_str = &md_str[1..];
    let hand_strs: Vec<&str> = hands_str.split(',').collect();

    if hand_strs.len() < 3 {
        return None;
    }

    let mut deal = Deal::new();
    let directions = [
        Direction::South,
        Direction::West,
        Direction::North,
        Direction::East,
    ];

    for (i, hand_str) in hand_strs.iter().enumerate().take(3) {
        deal.set_hand(directions[i], parse_lin_hand(hand_str));
    }

    // The 4th hand holds whatever the other three don't
    let fourth = calculate_fourth_hand(&deal, directions[3]);
    deal.set_hand(directions[3], fourth);

    Some((dealer, deal))
}

/// Parse a single hand in LIN format
/// Format: suits concatenated with suit letter prefix (SHDC order)
fn parse_lin_hand(hand_str: &str) -> Hand {
    let mut hand = Hand::new();
    let mut current_suit: Option<Suit> = None;

    for c in hand_str.chars() {
        match Suit::from_char(c.to_ascii_uppercase()) {
            Some(suit) => current_suit = Some(suit),
            None => {
                if let (Some(suit), Some(rank)) = (current_suit, Rank::from_char(c)) {
                    hand.add_card(Card::new(suit, rank));
                }
            }
        }
    }

    hand
}

/// Calculate the fourth hand from the three known hands
fn calculate_fourth_hand(deal: &Deal, fourth_dir: Direction) -> Hand {
    let mut fourth = Hand::new();

    for suit in Suit::ALL {
        for rank in Rank::ALL {
            let card = Card::new(suit, rank);
            let held = Direction::ALL
                .iter()
                .any(|&dir| dir != fourth_dir && deal.hand(dir).has_card(card));
            if !held {
                fourth.add_card(card);
            }
        }
    }

    fourth
}

/// Parse vulnerability from an sv field
pub fn parse_sv(sv: &str) -> Option<Vulnerability> {
    match sv.to_lowercase().as_str() {
        "o" | "0" | "-" => Some(Vulnerability::None),
        "n" | "ns" => Some(Vulnerability::NorthSouth),
        "e" | "ew" => Some(Vulnerability::EastWest),
        "b" | "both" | "all" => Some(Vulnerability::Both),
        _ => None,
    }
}

pub fn sv_code(vul: Vulnerability) -> &'static str {
    match vul {
        Vulnerability::None => "o",
        Vulnerability::NorthSouth => "n",
        Vulnerability::EastWest => "e",
        Vulnerability::Both => "b",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sv() {
        assert_eq!(parse_sv("o"), Some(Vulnerability::None));
        assert_eq!(parse_sv("b"), Some(Vulnerability::Both));
        assert_eq!(parse_sv("n"), Some(Vulnerability::NorthSouth));
        assert_eq!(parse_sv("e"), Some(Vulnerability::EastWest));
        assert_eq!(parse_sv("None"), None);
    }

    #[test]
    fn test_parse_lin_hand() {
        let hand = parse_lin_hand("SAKQHJT9D8765C432");
        assert_eq!(hand.suit_length(Suit::Spades), 3);
        assert_eq!(hand.suit_length(Suit::Hearts), 3);
        assert_eq!(hand.suit_length(Suit::Diamonds), 4);
        assert_eq!(hand.suit_length(Suit::Clubs), 3);
    }

    #[test]
    fn test_parse_md_fills_fourth_hand() {
        let (dealer, deal) =
            parse_md("3SAKHJD876C5432,S2HQT9DKQ5CKQJT9,SQJT9HA32DAJ2CA8,").unwrap();
        assert_eq!(dealer, Direction::North);
        for dir in Direction::ALL {
            assert_eq!(deal.hand(dir).len(), 13, "{:?}", dir);
        }
        assert!(parse_md("9S,H,D").is_none());
        assert!(parse_md("").is_none());
    }

    #[test]
    fn test_dealer_digits() {
        for dir in Direction::ALL {
            assert_eq!(dealer_from_digit(dealer_digit(dir)), Some(dir));
        }
    }
}
