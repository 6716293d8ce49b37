// Live view: ExportSpec rendered as a terminal table

use beantrack_engine::ExportSpec;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a column may grow before cells are cut with "...".
const MAX_COL_WIDTH: usize = 40;
const ELLIPSIS: &str = "...";

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to `width` display columns, marking the cut with "...".
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width <= ELLIPSIS.len() {
        return ELLIPSIS[..width].to_string();
    }

    let budget = width - ELLIPSIS.len();
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }
    format!("{}{}", &s[..end_byte], ELLIPSIS)
}

/// Pad or truncate to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let cut = truncate_display(s, width);
    let w = display_width(&cut);
    format!("{}{}", cut, " ".repeat(width.saturating_sub(w)))
}

/// Same headers and cells as the exporters, one line per row, newlines flattened.
pub fn render_table(spec: &ExportSpec) -> String {
    let rows: Vec<Vec<String>> = spec
        .display_rows()
        .into_iter()
        .map(|row| row.into_iter().map(|c| c.replace(['\r', '\n'], " ")).collect())
        .collect();

    let widths: Vec<usize> = spec
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| display_width(&r[i]))
                .chain(std::iter::once(display_width(h)))
                .max()
                .unwrap_or(0)
                .min(MAX_COL_WIDTH)
        })
        .collect();

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad_right(c, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(&spec.headers));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in &rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&format!(
        "({} row{})\n",
        rows.len(),
        if rows.len() == 1 { "" } else { "s" }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use beantrack_engine::Cell;

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate_display("hello world", 8), "hello...");
        assert_eq!(truncate_display("short", 8), "short");
        assert_eq!(truncate_display("abcdef", 2), "..");
    }

    #[test]
    fn pads_cjk_by_display_width() {
        assert_eq!(pad_right("日本", 6), "日本  ");
    }

    #[test]
    fn table_aligns_columns_and_counts_rows() {
        let spec = ExportSpec {
            headers: vec!["#".into(), "Full Name".into()],
            rows: vec![
                vec![Cell::Number(1.0), Cell::Text("Ana Cruz".into())],
                vec![Cell::Number(2.0), Cell::Missing],
            ],
            filename_base: "x".into(),
            entity: None,
        };
        let out = render_table(&spec);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "#  Full Name");
        assert_eq!(lines[1], "-  ---------");
        assert_eq!(lines[2], "1  Ana Cruz");
        assert_eq!(lines[3], "2  \u{2014}");
        assert_eq!(lines[4], "(2 rows)");
    }
}
