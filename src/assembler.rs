use log::warn;
use serde::Serialize;

use crate::{
    error::{LoaderError, LoaderResult},
    record::FlatRecord,
    tokenizer::{self, Row},
};

/// A data row dropped because its field count did not match the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// 1-based physical line number in the input.
    pub line: usize,
    pub expected: usize,
    pub found: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub header: Row,
    pub records: Vec<FlatRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// The first non-blank line is the header. Rows whose field count differs
/// from the header's are skipped and reported, they never abort the batch.
pub fn assemble_content(content: &str) -> LoaderResult<Assembly> {
    let mut lines = tokenizer::split_lines(content)
        .into_iter()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header_line) = lines.next().ok_or(LoaderError::EmptyInput)?;
    let header = tokenizer::parse_line(header_line)
        .into_iter()
        .map(|field| field.trim().to_string())
        .collect::<Row>();
    if header.iter().all(|field| field.is_empty()) {
        return Err(LoaderError::NoHeaderFields);
    }

    let rows = lines
        .map(|(line, text)| (line, tokenizer::parse_line(text)))
        .collect::<Vec<_>>();
    Ok(assemble(header, rows))
}

/// Zips each numbered row against `header`, skipping rows of the wrong width.
pub fn assemble(header: Row, rows: Vec<(usize, Row)>) -> Assembly {
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for (line, row) in rows {
        if row.len() != header.len() {
            warn!(
                "Skipping line {line}: expected {} field(s), found {}",
                header.len(),
                row.len()
            );
            skipped.push(SkippedRow {
                line,
                expected: header.len(),
                found: row.len(),
            });
            continue;
        }
        let record = header
            .iter()
            .zip(row)
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect::<FlatRecord>();
        records.push(record);
    }
    Assembly {
        header,
        records,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored_without_diagnostics() {
        let assembly = assemble_content("a,b\n\n   \n1,2\n").expect("assemble");
        assert_eq!(assembly.records.len(), 1);
        assert!(assembly.skipped.is_empty());
    }

    #[test]
    fn header_may_follow_leading_blank_lines() {
        let assembly = assemble_content("\n\nid,name\n7,x").expect("assemble");
        assert_eq!(assembly.header, vec!["id", "name"]);
        assert_eq!(assembly.records[0].get("id"), Some("7"));
    }

    #[test]
    fn mismatched_rows_report_physical_line_numbers() {
        let assembly = assemble_content("a,b,c\n1,2\n\n1,2,3,4\n1,2,3").expect("assemble");
        assert_eq!(assembly.records.len(), 1);
        assert_eq!(
            assembly.skipped,
            vec![
                SkippedRow { line: 2, expected: 3, found: 2 },
                SkippedRow { line: 4, expected: 3, found: 4 },
            ]
        );
    }

    #[test]
    fn whitespace_only_content_is_fatal() {
        assert!(matches!(assemble_content(" \r\n\t\n"), Err(LoaderError::EmptyInput)));
        assert!(matches!(assemble_content(""), Err(LoaderError::EmptyInput)));
    }

    #[test]
    fn header_of_empty_names_is_fatal() {
        assert!(matches!(
            assemble_content(", ,\n1,2,3"),
            Err(LoaderError::NoHeaderFields)
        ));
    }
}
