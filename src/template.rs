//! Template schema: the declarative configuration a report is driven by.
//!
//! The template arrives as already-parsed JSON; loading it from disk is
//! the caller's concern. Field references inside it use `{Name}` tokens
//! resolved at bind time, so the template never names a concrete record
//! type.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level report template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default = "default_true")]
    pub rtl: bool,
    #[serde(default = "default_margin")]
    pub margin: f32,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_paper_size")]
    pub paper_size: String,
    #[serde(default = "default_orientation")]
    pub orientation: String,
    #[serde(default)]
    pub header: Option<PageHeader>,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub footer: Option<PageFooter>,
}

impl Template {
    pub fn from_json(text: &str) -> Result<Template> {
        serde_json::from_str(text).context("Template is not valid JSON")
    }

    /// Paper dimensions in millimetres after applying the orientation.
    /// Unknown sizes fall back to A4, unknown orientations to landscape.
    pub fn paper_dimensions(&self) -> (f32, f32) {
        let (w, h) = match self.paper_size.to_ascii_uppercase().as_str() {
            "A0" => (841.0, 1189.0),
            "A1" => (594.0, 841.0),
            "A2" => (420.0, 594.0),
            "A3" => (297.0, 420.0),
            "A5" => (148.0, 210.0),
            "A6" => (105.0, 148.0),
            _ => (210.0, 297.0),
        };
        match self.orientation.to_ascii_uppercase().as_str() {
            "PORTRAIT" => (w, h),
            _ => (h, w),
        }
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            rtl: true,
            margin: default_margin(),
            font: default_font(),
            paper_size: default_paper_size(),
            orientation: default_orientation(),
            header: None,
            content: Content::default(),
            footer: None,
        }
    }
}

/// Page header block, passed through to the scene unrendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageHeader {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub align: Align,
    #[serde(default = "default_header_font_size")]
    pub font_size: f32,
    #[serde(default = "default_true")]
    pub bold: bool,
    #[serde(default = "default_true")]
    pub show_once: bool,
    #[serde(default = "default_header_padding")]
    pub padding_bottom: f32,
}

/// Page footer block: page-number style only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFooter {
    #[serde(default)]
    pub align: Align,
    #[serde(default = "default_footer_padding")]
    pub vertical_padding: f32,
    #[serde(default = "default_separator")]
    pub separator_text: String,
    /// Current page number only, without the "of N" suffix.
    #[serde(default)]
    pub simple: bool,
}

/// Content block: the table definition plus the chart list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub total_columns: Option<usize>,
    #[serde(default = "default_margin_between")]
    pub margin_between: f32,
    #[serde(default)]
    pub headers: Vec<HeaderCell>,
    #[serde(default)]
    pub data: Vec<DataCell>,
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
}

impl Default for Content {
    fn default() -> Self {
        Self {
            total_columns: None,
            margin_between: default_margin_between(),
            headers: Vec::new(),
            data: Vec::new(),
            charts: Vec::new(),
        }
    }
}

/// One table header cell. `text` may be a `{field}` reference resolved
/// against the document model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCell {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_span")]
    pub col_span: u32,
    #[serde(default = "default_span")]
    pub row_span: u32,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_border")]
    pub border_size: f32,
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default)]
    pub align: Align,
    #[serde(default = "default_header_cell_font_size")]
    pub font_size: f32,
    #[serde(default = "default_true")]
    pub bold: bool,
}

/// One table column definition. `field` binds against the record set;
/// `row_span` is the column's span instruction list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCell {
    pub field: String,
    #[serde(default)]
    pub format: String,
    #[serde(default = "default_row_span")]
    pub row_span: Vec<String>,
    /// Column sort key; required and unique per rendering pass.
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub ranking_flag: bool,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_border")]
    pub border_size: f32,
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default)]
    pub align: Align,
    #[serde(default = "default_cell_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default = "default_true")]
    pub rtl: bool,
    #[serde(default = "default_true")]
    pub repeated: bool,
}

/// One chart definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(default, rename = "type")]
    pub kind: ChartKind,
    #[serde(default)]
    pub x_field: String,
    #[serde(default)]
    pub y_field: String,
    #[serde(default)]
    pub legend_field: String,
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_true")]
    pub show_legend: bool,
    #[serde(default)]
    pub legend_align: LegendAlign,
    #[serde(default)]
    pub legend_orientation: LegendOrientation,
    #[serde(default = "default_font")]
    pub font_name: String,
    #[serde(default = "default_title_font_size")]
    pub title_font_size: f32,
    #[serde(default = "default_label_font_size")]
    pub label_font_size: f32,
    #[serde(default = "default_small_font_size")]
    pub legend_font_size: f32,
    #[serde(default = "default_small_font_size")]
    pub value_font_size: f32,
    #[serde(default = "default_small_font_size")]
    pub axis_font_size: f32,
    #[serde(default = "default_true")]
    pub show_value_labels: bool,
    #[serde(default)]
    pub value_format: String,
    #[serde(default)]
    pub rotate_labels: bool,
    #[serde(default)]
    pub show_x_grid: bool,
    #[serde(default)]
    pub show_y_grid: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
    #[default]
    Center,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendAlign {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendOrientation {
    #[default]
    Horizontal,
    Vertical,
}

fn default_true() -> bool {
    true
}
fn default_margin() -> f32 {
    10.0
}
fn default_font() -> String {
    "sans-serif".to_string()
}
fn default_paper_size() -> String {
    "A4".to_string()
}
fn default_orientation() -> String {
    "landscape".to_string()
}
fn default_header_font_size() -> f32 {
    20.0
}
fn default_header_padding() -> f32 {
    5.0
}
fn default_footer_padding() -> f32 {
    10.0
}
fn default_separator() -> String {
    "/".to_string()
}
fn default_margin_between() -> f32 {
    5.0
}
fn default_span() -> u32 {
    1
}
fn default_background() -> String {
    "ffffff".to_string()
}
fn default_border() -> f32 {
    1.0
}
fn default_padding() -> f32 {
    3.0
}
fn default_header_cell_font_size() -> f32 {
    16.0
}
fn default_cell_font_size() -> f32 {
    14.0
}
fn default_title_font_size() -> f32 {
    14.0
}
fn default_label_font_size() -> f32 {
    12.0
}
fn default_small_font_size() -> f32 {
    10.0
}
fn default_row_span() -> Vec<String> {
    vec!["1".to_string()]
}
