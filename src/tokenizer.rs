//! Hand-rolled CSV tokenizer.
//!
//! Works one physical line at a time: [`split_lines()`] breaks the input on
//! `\r\n`, `\n` or `\r`, and [`parse_line()`] scans a single line with one
//! `inside_quotes` flag. Quoted fields may contain commas and doubled quotes,
//! but not line breaks. Tokenizing never fails; malformed quoting yields a
//! differently shaped field instead of an error.

pub type Row = Vec<String>;

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Splits `content` on any of `\r\n`, `\n` and `\r`.
///
/// A trailing line break yields a final empty line, which callers skip.
pub fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = content.as_bytes();
    let mut start = 0usize;
    let mut idx = 0usize;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\r' => {
                lines.push(&content[start..idx]);
                if bytes.get(idx + 1) == Some(&b'\n') {
                    idx += 1;
                }
                start = idx + 1;
            }
            b'\n' => {
                lines.push(&content[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
        idx += 1;
    }
    lines.push(&content[start..]);
    lines
}

pub fn parse_line(line: &str) -> Row {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut inside_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            QUOTE => {
                if inside_quotes && chars.peek() == Some(&QUOTE) {
                    current.push(QUOTE);
                    chars.next();
                } else {
                    inside_quotes = !inside_quotes;
                }
            }
            DELIMITER if !inside_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    // An unterminated quote keeps whatever was accumulated.
    fields.push(current);
    fields
}

pub fn tokenize(content: &str) -> Vec<Row> {
    split_lines(content).into_iter().map(parse_line).collect()
}
