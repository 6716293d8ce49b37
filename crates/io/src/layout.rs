// Document layout: paper, margins, column widths, pagination

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use beantrack_engine::{EntityKind, ExportSpec};

pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// Rows per page are fixed per orientation; landscape has more vertical room per row band.
pub const ROWS_PER_PAGE_PORTRAIT: usize = 25;
pub const ROWS_PER_PAGE_LANDSCAPE: usize = 30;

// ============================================================================
// Orientation / paper / margins
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn rows_per_page(self) -> usize {
        match self {
            Orientation::Portrait => ROWS_PER_PAGE_PORTRAIT,
            Orientation::Landscape => ROWS_PER_PAGE_LANDSCAPE,
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" | "p" => Ok(Orientation::Portrait),
            "landscape" | "l" => Ok(Orientation::Landscape),
            other => Err(format!("unknown orientation '{}' (expected portrait or landscape)", other)),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        })
    }
}

/// Named paper preset, dimensions in millimetres as printed in portrait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperSize {
    pub name: &'static str,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PaperSize {
    pub const A4: PaperSize = PaperSize { name: "A4", width_mm: 210.0, height_mm: 297.0 };
    pub const A3: PaperSize = PaperSize { name: "A3", width_mm: 297.0, height_mm: 420.0 };
    pub const A5: PaperSize = PaperSize { name: "A5", width_mm: 148.0, height_mm: 210.0 };
    pub const LETTER: PaperSize = PaperSize { name: "Letter", width_mm: 215.9, height_mm: 279.4 };
    pub const LEGAL: PaperSize = PaperSize { name: "Legal", width_mm: 215.9, height_mm: 355.6 };
    pub const LONG: PaperSize = PaperSize { name: "Long", width_mm: 215.9, height_mm: 330.2 };

    pub const ALL: [PaperSize; 6] = [
        PaperSize::A4,
        PaperSize::A3,
        PaperSize::A5,
        PaperSize::LETTER,
        PaperSize::LEGAL,
        PaperSize::LONG,
    ];

    /// Case-insensitive preset lookup. "Folio" is the same sheet as "Long".
    pub fn by_name(name: &str) -> Option<PaperSize> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("folio") {
            return Some(PaperSize::LONG);
        }
        PaperSize::ALL.into_iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// (width, height) in mm for `orientation`.
    pub fn oriented(&self, orientation: Orientation) -> (f32, f32) {
        match orientation {
            Orientation::Portrait => (self.width_mm, self.height_mm),
            Orientation::Landscape => (self.height_mm, self.width_mm),
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        PaperSize::A4
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaperSize::by_name(s).ok_or_else(|| {
            let names: Vec<&str> = PaperSize::ALL.iter().map(|p| p.name).collect();
            format!("unknown paper size '{}' (expected one of: {})", s.trim(), names.join(", "))
        })
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Margins {
    pub const DEFAULT_MM: f32 = 15.0;

    pub fn uniform(mm: f32) -> Self {
        Self { top: mm, left: mm, right: mm, bottom: mm }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Margins::uniform(Margins::DEFAULT_MM)
    }
}

/// `"12"` for all sides, or `"top,left,right,bottom"`.
impl FromStr for Margins {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f32> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| format!("invalid margin '{}'", p.trim()))
            })
            .collect::<Result<_, _>>()?;
        match parts.as_slice() {
            [all] => Ok(Margins::uniform(*all)),
            [top, left, right, bottom] => Ok(Margins { top: *top, left: *left, right: *right, bottom: *bottom }),
            _ => Err(format!("expected 1 or 4 margin values, got {}", parts.len())),
        }
    }
}

/// Everything the document exporter needs beyond the table itself.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOptions {
    pub orientation: Orientation,
    pub paper: PaperSize,
    pub margins: Margins,
    pub font_size: f32,
    /// Defaults to the export's filename base.
    pub title: Option<String>,
}

impl DocumentOptions {
    pub const DEFAULT_FONT_SIZE: f32 = 9.0;
    /// Smallest table area, in mm on each axis, the margins may leave.
    pub const MIN_USABLE_MM: f32 = 50.0;

    pub fn title_for<'a>(&'a self, spec: &'a ExportSpec) -> &'a str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&spec.filename_base)
    }

    /// Page size in mm, oriented.
    pub fn page_mm(&self) -> (f32, f32) {
        self.paper.oriented(self.orientation)
    }

    /// Width available to the table in mm, never negative.
    pub fn usable_width_mm(&self) -> f32 {
        (self.page_mm().0 - self.margins.left - self.margins.right).max(0.0)
    }

    /// Height between the top and bottom margins in mm, never negative.
    pub fn usable_height_mm(&self) -> f32 {
        (self.page_mm().1 - self.margins.top - self.margins.bottom).max(0.0)
    }

    /// Reject margins that leave less than [`Self::MIN_USABLE_MM`] on either axis.
    pub fn validate(&self) -> Result<(), String> {
        let (w, h) = self.page_mm();
        let usable = [("width", self.usable_width_mm(), w), ("height", self.usable_height_mm(), h)];
        for (axis, left_over, page) in usable {
            if left_over < Self::MIN_USABLE_MM {
                return Err(format!(
                    "margins leave {:.1} mm of usable {} on {} {} ({:.1} mm page); at least {} mm is needed",
                    left_over,
                    axis,
                    self.paper.name,
                    self.orientation,
                    page,
                    Self::MIN_USABLE_MM,
                ));
            }
        }
        Ok(())
    }
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            paper: PaperSize::A4,
            margins: Margins::default(),
            font_size: Self::DEFAULT_FONT_SIZE,
            title: None,
        }
    }
}

// ============================================================================
// Column widths
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    Fixed(f32),
    /// Shares whatever width the fixed columns leave.
    Auto,
}

use self::ColumnWidth::{Auto, Fixed};

pub const ROW_NUMBER_WIDTH_MM: f32 = 8.0;
const MIN_AUTO_WIDTH_MM: f32 = 12.0;

// One entry per default column of the entity, leading `#` included.
const BENEFICIARY_PORTRAIT: &[ColumnWidth] =
    &[Fixed(8.0), Fixed(20.0), Fixed(32.0), Fixed(14.0), Fixed(16.0), Fixed(18.0), Fixed(10.0), Fixed(22.0), Auto];
const BENEFICIARY_LANDSCAPE: &[ColumnWidth] =
    &[Fixed(10.0), Fixed(24.0), Fixed(45.0), Fixed(16.0), Fixed(20.0), Fixed(22.0), Fixed(12.0), Fixed(28.0), Auto];
const FARM_PORTRAIT: &[ColumnWidth] =
    &[Fixed(8.0), Fixed(18.0), Fixed(22.0), Fixed(40.0), Fixed(16.0), Fixed(22.0), Auto];
const FARM_LANDSCAPE: &[ColumnWidth] =
    &[Fixed(10.0), Fixed(22.0), Fixed(28.0), Fixed(55.0), Fixed(20.0), Fixed(28.0), Auto];
const SEEDLING_PORTRAIT: &[ColumnWidth] =
    &[Fixed(8.0), Fixed(20.0), Fixed(34.0), Fixed(24.0), Fixed(16.0), Fixed(16.0), Fixed(20.0), Fixed(20.0), Auto];
const SEEDLING_LANDSCAPE: &[ColumnWidth] =
    &[Fixed(10.0), Fixed(26.0), Fixed(50.0), Fixed(34.0), Fixed(20.0), Fixed(20.0), Fixed(28.0), Fixed(28.0), Auto];
const SURVEY_PORTRAIT: &[ColumnWidth] =
    &[Fixed(8.0), Fixed(20.0), Fixed(32.0), Fixed(28.0), Fixed(20.0), Fixed(14.0), Fixed(14.0), Auto];
const SURVEY_LANDSCAPE: &[ColumnWidth] =
    &[Fixed(10.0), Fixed(26.0), Fixed(48.0), Fixed(40.0), Fixed(26.0), Fixed(18.0), Fixed(18.0), Auto];
const LOG_PORTRAIT: &[ColumnWidth] = &[Fixed(8.0), Fixed(34.0), Fixed(26.0), Fixed(26.0), Auto];
const LOG_LANDSCAPE: &[ColumnWidth] = &[Fixed(10.0), Fixed(40.0), Fixed(34.0), Fixed(34.0), Auto];

/// Static width table for an entity's default columns.
pub fn width_table(kind: EntityKind, orientation: Orientation) -> &'static [ColumnWidth] {
    use Orientation::{Landscape, Portrait};
    match (kind, orientation) {
        (EntityKind::BeneficiaryList, Portrait) => BENEFICIARY_PORTRAIT,
        (EntityKind::BeneficiaryList, Landscape) => BENEFICIARY_LANDSCAPE,
        (EntityKind::FarmLocation, Portrait) => FARM_PORTRAIT,
        (EntityKind::FarmLocation, Landscape) => FARM_LANDSCAPE,
        (EntityKind::SeedlingRecord, Portrait) => SEEDLING_PORTRAIT,
        (EntityKind::SeedlingRecord, Landscape) => SEEDLING_LANDSCAPE,
        (EntityKind::CropSurveyStatus, Portrait) => SURVEY_PORTRAIT,
        (EntityKind::CropSurveyStatus, Landscape) => SURVEY_LANDSCAPE,
        (EntityKind::ActivityLog, Portrait) => LOG_PORTRAIT,
        (EntityKind::ActivityLog, Landscape) => LOG_LANDSCAPE,
    }
}

/// Width spec for every column of `spec`.
///
/// Default column sets use the entity's table. Anything else (custom selection,
/// merged report) keeps a fixed `#` column and makes the rest `Auto`.
pub fn column_widths(spec: &ExportSpec, orientation: Orientation) -> Vec<ColumnWidth> {
    if let Some(kind) = spec.entity.filter(|_| spec.uses_default_columns()) {
        let table = width_table(kind, orientation);
        if table.len() == spec.column_count() {
            return table.to_vec();
        }
        log::warn!("width table for {kind} does not match its default columns");
    }
    (0..spec.column_count())
        .map(|i| if i == 0 { Fixed(ROW_NUMBER_WIDTH_MM) } else { Auto })
        .collect()
}

/// Resolve a width spec to millimetres within `usable_mm`.
///
/// Auto columns split the remainder equally (with a floor); if the result
/// overflows the usable width every column is scaled down proportionally.
pub fn resolve_widths(widths: &[ColumnWidth], usable_mm: f32) -> Vec<f32> {
    let fixed: f32 = widths
        .iter()
        .map(|w| match w {
            Fixed(mm) => *mm,
            Auto => 0.0,
        })
        .sum();
    let autos = widths.iter().filter(|w| matches!(w, Auto)).count();
    let auto_mm = if autos == 0 {
        0.0
    } else {
        ((usable_mm - fixed) / autos as f32).max(MIN_AUTO_WIDTH_MM)
    };

    let mut resolved: Vec<f32> = widths
        .iter()
        .map(|w| match w {
            Fixed(mm) => *mm,
            Auto => auto_mm,
        })
        .collect();

    let total: f32 = resolved.iter().sum();
    if total > usable_mm && total > 0.0 {
        let scale = usable_mm / total;
        for w in &mut resolved {
            *w *= scale;
        }
    }
    resolved
}

// ============================================================================
// Pagination / text fitting
// ============================================================================

/// Row index ranges, one per page: exactly `ceil(rows / per_page)` of them.
pub fn paginate(row_count: usize, rows_per_page: usize) -> Vec<Range<usize>> {
    let per_page = rows_per_page.max(1);
    (0..row_count.div_ceil(per_page))
        .map(|page| {
            let start = page * per_page;
            start..(start + per_page).min(row_count)
        })
        .collect()
}

/// Average Helvetica glyph advance as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.52;
const ELLIPSIS: &str = "...";

/// Truncate `text` so it fits `width_mm` at `font_size` pt, marking cuts with "...".
pub fn fit_text(text: &str, width_mm: f32, font_size: f32) -> String {
    let glyph_mm = font_size * AVG_GLYPH_EM / MM_TO_PT;
    let max_chars = if glyph_mm > 0.0 { (width_mm / glyph_mm).floor() as usize } else { usize::MAX };
    let len = text.chars().count();
    if len <= max_chars {
        return text.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(max_chars).collect();
    }
    let kept: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}
