//! PBN record writer.

use crate::lin::{parse_md, parse_sv};
use crate::record::{auction_calls, call_parts, trick_cards, Label, RecordAccumulator};
use crate::tables::PBN_TAGS;
use bridge_types::{Deal, Vulnerability};

const OPTIMUM_COLUMNS: &str = "Declarer;Denomination\\2R;Result\\2R";

/// Write records to PBN format
pub fn write_pbn(records: &[RecordAccumulator]) -> String {
    let mut output = String::new();

    // PBN header
    output.push_str("% PBN 2.1\n");
    output.push_str("% EXPORT\n");
    output.push('\n');

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&write_record(record));
    }

    output
}

pub(crate) fn deal_value(value: &str) -> String {
    if Deal::from_pbn(value).is_some() {
        return value.to_string();
    }
    match parse_md(value) {
        Some((dealer, deal)) => deal.to_pbn(dealer),
        None => value.to_string(),
    }
}

pub(crate) fn vul_value(value: &str) -> String {
    if Vulnerability::from_pbn(value).is_some() {
        return value.to_string();
    }
    match parse_sv(value) {
        Some(vul) => vul.to_pbn().to_string(),
        None => value.to_string(),
    }
}

/// Number a note reference takes, when it is one.
fn note_number(text: &str) -> Option<usize> {
    text.parse().ok()
}

/// Auction rows of four calls. Numeric `(n)` annotations become `=n=`
/// references; other annotation text gets the next free note number and is
/// returned as a note.
fn auction_rows(auction: &str, notes: Option<&str>) -> (Vec<String>, Vec<(usize, String)>) {
    let calls = auction_calls(auction);
    let used = calls
        .iter()
        .flat_map(|&item| call_parts(item).1)
        .filter_map(note_number)
        .chain(
            notes
                .into_iter()
                .flat_map(|n| n.split('\n'))
                .filter_map(|n| n.split_once(':').and_then(|(k, _)| note_number(k))),
        )
        .max()
        .unwrap_or(0);

    let mut tokens = Vec::new();
    let mut alerts = Vec::new();
    for item in calls {
        let (call, annotations) = call_parts(item);
        if !call.is_empty() {
            tokens.push(call.to_string());
        }
        for text in annotations {
            let n = match note_number(text) {
                Some(n) => n,
                None => {
                    let n = used + alerts.len() + 1;
                    alerts.push((n, text.to_string()));
                    n
                }
            };
            tokens.push(format!("={}=", n));
        }
    }

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut calls = 0;
    for token in tokens {
        let is_note = token.starts_with('=');
        if !is_note && calls == 4 {
            rows.push(row.join(" "));
            row.clear();
            calls = 0;
        }
        if !is_note {
            calls += 1;
        }
        row.push(token);
    }
    if !row.is_empty() {
        rows.push(row.join(" "));
    }
    (rows, alerts)
}

/// Convert a single record to PBN format
pub fn write_record(record: &RecordAccumulator) -> String {
    let mut lines = Vec::new();
    let (rows, alerts) = record
        .get(Label::Auction)
        .map(|auction| auction_rows(auction, record.get(Label::Notes)))
        .unwrap_or_default();

    for &(tag, label) in PBN_TAGS {
        if label == Label::Notes {
            let notes = record.get(Label::Notes).into_iter().flat_map(|n| n.split('\n'));
            lines.extend(notes.map(|note| format!("[Note \"{}\"]", note)));
            lines.extend(alerts.iter().map(|(n, text)| format!("[Note \"{}:{}\"]", n, text)));
            continue;
        }
        let Some(value) = record.get(label) else {
            continue;
        };
        match label {
            Label::Deal => lines.push(format!("[Deal \"{}\"]", deal_value(value))),
            Label::Vulnerable => lines.push(format!("[Vulnerable \"{}\"]", vul_value(value))),
            Label::Auction => {
                let first = record.get(Label::Dealer).unwrap_or("?");
                lines.push(format!("[Auction \"{}\"]", first));
                lines.extend(rows.iter().cloned());
            }
            Label::Play => {
                lines.push("[Play \"?\"]".to_string());
                for trick in value.split(':') {
                    lines.push(trick_cards(trick).join(" "));
                }
            }
            Label::DoubleDummy | Label::ScoresList => {
                let columns = if label == Label::DoubleDummy {
                    OPTIMUM_COLUMNS
                } else {
                    ""
                };
                lines.push(format!("[{} \"{}\"]", tag, columns));
                lines.extend(value.split(';').map(str::to_string));
            }
            _ => lines.push(format!("[{} \"{}\"]", tag, value)),
        }
    }

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEAL: &str = "N:K843.T542.J6.863 AQJ7.K.Q75.AT942 962.AJ7.KT82.J75 T5.Q9863.A943.KQ";

    #[test]
    fn test_write_simple_board() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::BoardNo, "1", 1).unwrap();
        acc.set(Label::Dealer, "N", 1).unwrap();
        acc.set(Label::Vulnerable, "None", 1).unwrap();
        acc.set(Label::Deal, DEAL, 1).unwrap();

        let pbn = write_record(&acc);

        assert!(pbn.contains("[Board \"1\"]"));
        assert!(pbn.contains("[Dealer \"N\"]"));
        assert!(pbn.contains("[Vulnerable \"None\"]"));
        assert!(pbn.contains(&format!("[Deal \"{}\"]", DEAL)));
    }

    #[test]
    fn test_write_pbn_header() {
        let pbn = write_pbn(&[]);

        assert!(pbn.starts_with("% PBN 2.1\n"));
        assert!(pbn.contains("% EXPORT"));
    }

    #[test]
    fn test_lin_values_converted() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::Deal, "3SAKHJD876C5432,S2HQT9DKQ5CKQJT9,SQJT9HA32DAJ2CA8,", 1).unwrap();
        acc.set(Label::Vulnerable, "b", 1).unwrap();
        let pbn = write_record(&acc);
        assert!(pbn.contains("[Deal \"N:"));
        assert!(pbn.contains("[Vulnerable \"All\"]") || pbn.contains("[Vulnerable \"Both\"]"));
    }

    #[test]
    fn test_auction_rows() {
        let (rows, alerts) = auction_rows("1C(1):1H:P:P:P", None);
        assert_eq!(rows, vec!["1C =1= 1H P P", "P"]);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_alert_text_becomes_note() {
        let mut acc = RecordAccumulator::new();
        acc.set(Label::Dealer, "N", 1).unwrap();
        acc.set(Label::Auction, "1C(1):2C(Stayman: asks):P", 2).unwrap();
        acc.set(Label::Notes, "1:natural", 3).unwrap();

        let pbn = write_record(&acc);
        assert!(pbn.contains("1C =1= 2C =2= P\n"), "{}", pbn);
        assert!(pbn.contains("[Note \"1:natural\"]\n[Note \"2:Stayman: asks\"]"));
    }

    #[test]
    fn test_round_trip() {
        use crate::format::Format;
        use crate::reader::ChunkReader;
        use crate::source::LineSource;

        let mut acc = RecordAccumulator::new();
        acc.set(Label::Event, "Club", 1).unwrap();
        acc.set(Label::BoardNo, "1", 2).unwrap();
        acc.set(Label::Dealer, "N", 3).unwrap();
        acc.set(Label::Deal, DEAL, 4).unwrap();
        acc.set(Label::Auction, "1C(1):1H:P:P:P", 5).unwrap();
        acc.set(Label::Play, "D2DAD3D8:H2", 6).unwrap();
        acc.set(Label::DoubleDummy, "N NT 9;S NT 9", 7).unwrap();

        let pbn = write_pbn(&[acc.clone()]);
        let source = LineSource::from_text("rt.pbn", &pbn, Format::Pbn, &[]).unwrap();
        let chunks: Vec<_> = ChunkReader::new(source).map(|c| c.unwrap()).collect();

        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0]
            .record
            .differs_from(&acc, crate::record::ResetRange::All));
    }
}
