use serde::Serialize;

use crate::template::{Align, ChartKind, LegendAlign, LegendOrientation, PageFooter, PageHeader};

// =============================================================================
// Table descriptors
// =============================================================================

/// One fully-bound table cell. Rows covered by a span emitted above them
/// get no descriptor at all; the consumer advances its own cursor.
#[derive(Debug, Clone, Serialize)]
pub struct CellDesc {
    pub row: usize,
    pub col: usize,
    pub text: String,
    pub row_span: usize,
    pub col_span: u32,
    /// Color token, `#RRGGBB` or `RRGGBB`.
    pub background: String,
    pub text_color: String,
    pub align: Align,
    pub font_size: f32,
    pub bold: bool,
    pub rtl: bool,
    pub repeated: bool,
    pub border_size: f32,
    pub padding: f32,
}

// =============================================================================
// Chart descriptors
// =============================================================================

/// Marks of one chart, shaped by kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartBody {
    Bar {
        bars: Vec<BarMark>,
    },
    Line {
        /// Consecutive integer x positions paired with scaled values.
        points: Vec<(f64, f64)>,
        color: String,
        line_width: f64,
        marker_size: f64,
        value_labels: Vec<ValueLabel>,
    },
    Pie {
        slices: Vec<PieSlice>,
        donut_fraction: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct BarMark {
    pub value: f64,
    pub color: String,
    /// Bar width as a fraction of the category slot.
    pub width: f64,
    pub value_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieSlice {
    pub value: f64,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisTick {
    pub position: f64,
    pub label: String,
}

/// Axis and grid policy for one chart.
#[derive(Debug, Clone, Serialize)]
pub struct AxisPolicy {
    pub ticks: Vec<AxisTick>,
    pub show_x_grid: bool,
    pub show_y_grid: bool,
    /// Tick label rotation in degrees; 0 when rotation is off.
    pub label_rotation: f64,
    /// Fractional padding applied above/below the value range.
    pub margin_top: f64,
    pub margin_bottom: f64,
    /// Pie charts draw neither axes nor grid.
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendBlock {
    pub visible: bool,
    pub entries: Vec<LegendEntry>,
    pub align: LegendAlign,
    pub orientation: LegendOrientation,
    pub font_size: f32,
}

/// Canvas slot of one chart inside the chart grid.
#[derive(Debug, Clone, Serialize)]
pub struct ChartCanvas {
    pub width: u32,
    pub height: u32,
    pub row: usize,
    pub col: usize,
    pub full_width: bool,
}

/// One laid-out chart, ready for a drawing backend.
#[derive(Debug, Clone, Serialize)]
pub struct ChartScene {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    /// Includes the magnitude unit suffix when the series was rescaled.
    pub y_label: String,
    pub unit: String,
    pub font_name: String,
    pub title_font_size: f32,
    pub label_font_size: f32,
    pub value_font_size: f32,
    pub axis_font_size: f32,
    pub body: ChartBody,
    pub axis: AxisPolicy,
    pub legend: LegendBlock,
    pub canvas: ChartCanvas,
}

// =============================================================================
// Document composition
// =============================================================================

/// Page-level settings passed through from the template.
#[derive(Debug, Clone, Serialize)]
pub struct PageSetup {
    pub rtl: bool,
    pub margin: f32,
    pub font: String,
    pub paper_size: String,
    pub orientation: String,
    pub paper_width_mm: f32,
    pub paper_height_mm: f32,
}

/// The composed report: everything a drawing collaborator needs, and
/// nothing it has to compute.
#[derive(Debug, Clone, Serialize)]
pub struct ReportScene {
    pub page: PageSetup,
    pub page_header: Option<PageHeader>,
    pub page_footer: Option<PageFooter>,
    /// Vertical spacing between the table and the chart grid.
    pub content_spacing: f32,
    pub total_columns: usize,
    pub header_cells: Vec<CellDesc>,
    pub body_cells: Vec<CellDesc>,
    pub charts: Vec<ChartScene>,
}
