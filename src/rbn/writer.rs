//! RBN and RBX writers.

use crate::record::{Label, RecordAccumulator};
use crate::tables::RBN_CHARS;

/// (letter, value) fields of one range, notes split one per field.
fn fields(record: &RecordAccumulator, header: bool) -> Vec<(char, String)> {
    let mut out = Vec::new();
    for &(c, label) in RBN_CHARS {
        if label.is_header() != header {
            continue;
        }
        let Some(value) = record.get(label) else {
            continue;
        };
        if label == Label::Notes {
            out.extend(value.split('\n').map(|note| (c, note.to_string())));
        } else {
            out.push((c, value.to_string()));
        }
    }
    out
}

/// Header block, a blank line, then the board block.
pub fn write_rbn(record: &RecordAccumulator) -> String {
    let mut output = String::new();
    let header = fields(record, true);
    for (c, value) in &header {
        output.push_str(&format!("{} {}\n", c, value));
    }
    let board = fields(record, false);
    if !header.is_empty() && !board.is_empty() {
        output.push('\n');
    }
    for (c, value) in &board {
        output.push_str(&format!("{} {}\n", c, value));
    }
    output
}

/// Header line, then the board line.
pub fn write_rbx(record: &RecordAccumulator) -> String {
    let mut output = String::new();
    for header in [true, false] {
        let groups: String = fields(record, header)
            .iter()
            .map(|(c, value)| format!("{}{{{}}}", c, value))
            .collect();
        if !groups.is_empty() {
            output.push_str(&groups);
            output.push('\n');
        }
    }
    output
}
