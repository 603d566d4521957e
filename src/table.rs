use std::fmt::Write as _;

/// Renders `rows` under `headers` as a left-aligned text table with a dashed
/// separator line. Control characters inside cells are flattened to spaces.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(flatten(cell).chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers, &widths));
    let dashes = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&dashes, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", flatten(cell), width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn flatten(cell: &str) -> String {
    cell.replace(['\n', '\r', '\t'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_padded_to_widest_cell() {
        let headers = vec!["bucket".to_string(), "count".to_string()];
        let rows = vec![
            vec!["<20".to_string(), "3".to_string()],
            vec!["20-40".to_string(), "12".to_string()],
        ];
        let rendered = render_table(&headers, &rows);
        assert_eq!(
            rendered.lines().collect::<Vec<_>>(),
            vec!["bucket  count", "------  -----", "<20     3", "20-40   12"]
        );
    }

    #[test]
    fn embedded_newlines_stay_on_one_line() {
        let headers = vec!["info".to_string()];
        let rows = vec![vec!["a\nb".to_string()]];
        assert_eq!(render_table(&headers, &rows).lines().count(), 3);
    }
}
