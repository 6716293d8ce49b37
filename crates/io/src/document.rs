// Paginated PDF export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use beantrack_engine::{format, ExportSpec};

use crate::layout::{self, DocumentOptions, MM_TO_PT};
use crate::{export_filename, target_path, ExportError};

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

/// Line pitch as a multiple of the font size.
const LINE_FACTOR: f32 = 1.6;
/// Horizontal padding inside each cell, mm.
const CELL_PAD_MM: f32 = 1.0;
/// Title size over the body font size, pt.
const TITLE_EXTRA: f32 = 5.0;
/// Smallest body font a full page may shrink to, pt.
const MIN_BODY_FONT: f32 = 3.0;

/// Render `spec` to PDF bytes. One page per `rows_per_page` slice; each page
/// carries the title, the generation time, the column headers and a
/// "Page X of Y" footer.
pub fn render(
    spec: &ExportSpec,
    options: &DocumentOptions,
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font("Helvetica"));
    let bold_id = doc.add_object(font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular_id,
            FONT_BOLD => bold_id,
        },
    });

    let frame = Frame::new(spec, options)?;
    let pages = layout::paginate(spec.row_count(), options.orientation.rows_per_page());
    let total = pages.len();
    let stamp = format!("Generated: {}", format::format_timestamp(generated_at));
    let title = options.title_for(spec);

    let mut kids: Vec<Object> = Vec::with_capacity(total);
    for (index, range) in pages.into_iter().enumerate() {
        let mut ops = Vec::new();
        frame.heading(&mut ops, title, &stamp);
        frame.header_row(&mut ops, &spec.headers);
        for (line, row) in spec.rows[range].iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|c| c.display()).collect();
            frame.body_row(&mut ops, line, &cells);
        }
        frame.footer(&mut ops, index + 1, total);

        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => total as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), frame.page_w.into(), frame.page_h.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id: ObjectId = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Write `<title>_<date>.pdf` into `dir`. `Ok(None)` for an empty export.
pub fn export(
    spec: &ExportSpec,
    options: &DocumentOptions,
    dir: &Path,
    generated_at: NaiveDateTime,
) -> Result<Option<PathBuf>, ExportError> {
    if spec.is_empty() {
        log::debug!("document export of {:?} skipped: no rows", spec.filename_base);
        return Ok(None);
    }
    let name = export_filename(options.title_for(spec), generated_at.date(), "pdf");
    let path = target_path(dir, &name)?;
    let bytes = render(spec, options, generated_at)?;

    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    log::info!(
        "wrote {} rows over {} page(s) to {}",
        spec.row_count(),
        layout::paginate(spec.row_count(), options.orientation.rows_per_page()).len(),
        path.display()
    );
    Ok(Some(path))
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Standard Type1 fonts are WinAnsi; unmappable characters become '?'.
fn win_ansi(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(text);
    if !had_errors {
        return bytes.into_owned();
    }
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let (bytes, _, bad) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if bad {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

// ============================================================================
// Page geometry
// ============================================================================

/// Page geometry in points, origin bottom-left as PDF expects.
struct Frame {
    page_w: f32,
    page_h: f32,
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    font_size: f32,
    /// Body text size; at most `font_size`.
    body_font: f32,
    /// The header rule; body row bands start here.
    body_top: f32,
    row_h: f32,
    /// Column widths in mm, plus their x offsets in points.
    widths_mm: Vec<f32>,
    col_x: Vec<f32>,
}

impl Frame {
    /// Body rows share the band between the header rule and the bottom
    /// margin. When a full page of rows at `font_size` would overflow it, the
    /// body font shrinks to fit; below [`MIN_BODY_FONT`] the layout is rejected.
    fn new(spec: &ExportSpec, options: &DocumentOptions) -> Result<Self, ExportError> {
        options.validate().map_err(ExportError::Layout)?;
        let (w_mm, h_mm) = options.page_mm();
        let m = options.margins;
        let font_size = options.font_size.clamp(4.0, 24.0);

        let widths_mm = layout::resolve_widths(
            &layout::column_widths(spec, options.orientation),
            options.usable_width_mm(),
        );
        let left = m.left * MM_TO_PT;
        let mut col_x = Vec::with_capacity(widths_mm.len());
        let mut x = left;
        for w in &widths_mm {
            col_x.push(x);
            x += w * MM_TO_PT;
        }

        let top = (h_mm - m.top) * MM_TO_PT;
        let bottom = m.bottom * MM_TO_PT;
        let header_y = top - (font_size + TITLE_EXTRA) - font_size * LINE_FACTOR * 2.0;
        let body_top = header_y - font_size * 0.5;
        let rows = options.orientation.rows_per_page() as f32;
        let row_h = (font_size * LINE_FACTOR).min((body_top - bottom) / rows);
        let body_font = font_size.min(row_h / LINE_FACTOR);
        if body_font < MIN_BODY_FONT {
            return Err(ExportError::Layout(format!(
                "{} rows per page do not fit on {} {} at {} pt; use smaller margins or font size",
                rows, options.paper.name, options.orientation, font_size
            )));
        }
        if body_font < font_size {
            log::debug!("body font reduced from {} to {:.2} pt to fit {} rows", font_size, body_font, rows);
        }

        Ok(Self {
            page_w: w_mm * MM_TO_PT,
            page_h: h_mm * MM_TO_PT,
            left,
            right: (w_mm - m.right) * MM_TO_PT,
            top,
            bottom,
            font_size,
            body_font,
            body_top,
            row_h,
            widths_mm,
            col_x,
        })
    }

    fn title_size(&self) -> f32 {
        self.font_size + TITLE_EXTRA
    }

    /// Baseline of the header row.
    fn header_y(&self) -> f32 {
        self.top - self.title_size() - self.font_size * LINE_FACTOR * 2.0
    }

    fn heading(&self, ops: &mut Vec<Operation>, title: &str, stamp: &str) {
        text(ops, FONT_BOLD, self.title_size(), self.left, self.top - self.title_size(), title);
        text(
            ops,
            FONT_REGULAR,
            self.font_size,
            self.left,
            self.top - self.title_size() - self.font_size * LINE_FACTOR,
            stamp,
        );
    }

    fn header_row(&self, ops: &mut Vec<Operation>, headers: &[String]) {
        self.cells(ops, FONT_BOLD, self.font_size, self.header_y(), headers);
        line(ops, self.left, self.body_top, self.right, self.body_top, 0.8);
    }

    /// Row `line_no` sits in the band `[body_top - row_h * (n + 1), body_top - row_h * n]`.
    fn body_row(&self, ops: &mut Vec<Operation>, line_no: usize, cells: &[String]) {
        let band_bottom = self.body_top - self.row_h * (line_no as f32 + 1.0);
        let y = band_bottom + (self.row_h - self.body_font) / 2.0 + self.body_font * 0.25;
        self.cells(ops, FONT_REGULAR, self.body_font, y, cells);
        line(ops, self.left, band_bottom, self.right, band_bottom, 0.2);
    }

    fn cells(&self, ops: &mut Vec<Operation>, font: &str, size: f32, y: f32, values: &[String]) {
        for ((value, x), width_mm) in values.iter().zip(&self.col_x).zip(&self.widths_mm) {
            let fitted = layout::fit_text(value, width_mm - CELL_PAD_MM * 2.0, size);
            text(ops, font, size, x + CELL_PAD_MM * MM_TO_PT, y, &fitted);
        }
    }

    fn footer(&self, ops: &mut Vec<Operation>, page: usize, total: usize) {
        let label = format!("Page {} of {}", page, total);
        // Helvetica digits and most letters are close to half an em.
        let width = label.chars().count() as f32 * self.font_size * 0.5;
        let x = (self.page_w - width) / 2.0;
        let y = (self.bottom - self.font_size * LINE_FACTOR).max(self.font_size);
        text(ops, FONT_REGULAR, self.font_size, x, y, &label);
    }
}

fn text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, s: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(s), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn line(ops: &mut Vec<Operation>, x1: f32, y: f32, x2: f32, y2: f32, width: f32) {
    ops.push(Operation::new("w", vec![width.into()]));
    ops.push(Operation::new("m", vec![x1.into(), y.into()]));
    ops.push(Operation::new("l", vec![x2.into(), y2.into()]));
    ops.push(Operation::new("S", vec![]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Orientation;
    use beantrack_engine::{Cell, EntityKind};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn spec(rows: usize) -> ExportSpec {
        ExportSpec {
            headers: vec!["#".into(), "User".into(), "Description".into()],
            rows: (0..rows)
                .map(|i| {
                    vec![
                        Cell::Number((i + 1) as f64),
                        Cell::Text(format!("user{i}")),
                        if i % 3 == 0 { Cell::Missing } else { Cell::Text("Exported report".into()) },
                    ]
                })
                .collect(),
            filename_base: "Activity Log".into(),
            entity: Some(EntityKind::ActivityLog),
        }
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(14, 5, 0).unwrap()
    }

    #[test]
    fn test_page_count_follows_rows_per_page() {
        let opts = DocumentOptions { orientation: Orientation::Landscape, ..DocumentOptions::default() };
        let bytes = render(&spec(61), &opts, at()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_every_page_has_footer_and_header() {
        let bytes = render(&spec(26), &DocumentOptions::default(), at()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        for (n, page_id) in pages.values().enumerate() {
            let content = doc.get_and_decode_page_content(*page_id).unwrap();
            let strings: Vec<Vec<u8>> = content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| op.operands.first()?.as_str().ok().map(|s| s.to_vec()))
                .collect();
            let footer = format!("Page {} of 2", n + 1).into_bytes();
            assert!(strings.contains(&footer), "page {} missing footer", n + 1);
            assert!(strings.contains(&b"Activity Log".to_vec()));
            assert!(strings.contains(&b"Description".to_vec()));
        }
    }

    fn number(obj: &Object) -> f32 {
        match obj {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            other => panic!("not a number: {:?}", other),
        }
    }

    /// (y of the preceding Td, shown bytes) for every Tj on page 1.
    fn placed_text(bytes: &[u8]) -> Vec<(f32, Vec<u8>)> {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = doc.get_and_decode_page_content(page_id).unwrap();
        let mut y = f32::NAN;
        let mut placed = Vec::new();
        for op in &content.operations {
            match op.operator.as_str() {
                "Td" => y = number(&op.operands[1]),
                "Tj" => placed.push((y, op.operands[0].as_str().unwrap().to_vec())),
                _ => {}
            }
        }
        placed
    }

    #[test]
    fn test_full_page_stays_inside_margins_at_font_extremes() {
        for orientation in [Orientation::Portrait, Orientation::Landscape] {
            for font_size in [4.0, 24.0] {
                let opts = DocumentOptions { orientation, font_size, ..DocumentOptions::default() };
                let rows = orientation.rows_per_page();
                let bytes = render(&spec(rows), &opts, at()).unwrap();
                let placed = placed_text(&bytes);

                let bottom = opts.margins.bottom * MM_TO_PT;
                let top = opts.page_mm().1 * MM_TO_PT - opts.margins.top * MM_TO_PT;
                let footer_y = placed
                    .iter()
                    .find(|(_, s)| s.starts_with(b"Page "))
                    .map(|(y, _)| *y)
                    .unwrap();
                for (y, s) in placed.iter().filter(|(_, s)| !s.starts_with(b"Page ")) {
                    let label = String::from_utf8_lossy(s);
                    assert!(*y >= bottom - 0.01, "{orientation} {font_size}pt: {label:?} at y={y} below {bottom}");
                    assert!(*y > footer_y, "{orientation} {font_size}pt: {label:?} at or below footer");
                    assert!(*y <= top, "{orientation} {font_size}pt: {label:?} above top margin");
                }

                // Every row of the page is drawn
                for i in 0..rows {
                    let user = format!("user{i}");
                    assert!(placed.iter().any(|(_, s)| s == user.as_bytes()), "{user} missing");
                }
            }
        }
    }

    #[test]
    fn test_large_font_shrinks_body_rows_only() {
        let opts = DocumentOptions { orientation: Orientation::Landscape, font_size: 24.0, ..DocumentOptions::default() };
        let bytes = render(&spec(30), &opts, at()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = doc.get_and_decode_page_content(page_id).unwrap();
        let sizes: Vec<f32> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tf")
            .map(|op| number(&op.operands[1]))
            .collect();
        // Title and header keep their size; body rows are smaller
        assert!(sizes.contains(&29.0));
        assert!(sizes.contains(&24.0));
        assert!(sizes.iter().any(|s| *s < 24.0 && *s >= MIN_BODY_FONT));
    }

    #[test]
    fn test_unfittable_layout_is_an_error() {
        let margins = crate::layout::Margins::uniform(120.0);
        let opts = DocumentOptions { paper: crate::layout::PaperSize::A5, margins, ..DocumentOptions::default() };
        assert!(matches!(render(&spec(3), &opts, at()), Err(ExportError::Layout(_))));

        // Enough room for the validator, not for 30 rows under a 24 pt heading
        let tight = DocumentOptions {
            orientation: Orientation::Landscape,
            paper: crate::layout::PaperSize::A5,
            margins: crate::layout::Margins { top: 45.0, left: 10.0, right: 10.0, bottom: 45.0 },
            font_size: 24.0,
            title: None,
        };
        let err = render(&spec(30), &tight, at()).unwrap_err();
        assert!(err.to_string().contains("do not fit"), "{}", err);
    }

    #[test]
    fn test_placeholder_encodes_to_win_ansi() {
        assert_eq!(win_ansi(format::PLACEHOLDER), vec![0x97]);
        assert_eq!(win_ansi("Peña"), b"Pe\xf1a".to_vec());
        assert_eq!(win_ansi("田"), b"?".to_vec());
    }

    #[test]
    fn test_export_names_file_after_title() {
        let dir = tempdir().unwrap();
        let opts = DocumentOptions { title: Some("Q3 Activity".into()), ..DocumentOptions::default() };
        let path = export(&spec(3), &opts, dir.path(), at()).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "Q3_Activity_2024-07-01.pdf");
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let dir = tempdir().unwrap();
        let out = export(&spec(0), &DocumentOptions::default(), dir.path(), at()).unwrap();
        assert!(out.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
