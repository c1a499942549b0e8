//! Chart dispatch: one laid-out chart scene per chart spec.
//!
//! The dispatcher resolves x/y/legend fields against the record set,
//! rescales the value series, then shapes the marks by chart kind. It
//! never fails: unresolved labels become a fixed "unknown" label,
//! non-numeric values coerce to zero, and an empty record set produces
//! an empty chart.

use crate::formatter::format_number;
use crate::ir::{
    AxisPolicy, AxisTick, BarMark, ChartBody, ChartCanvas, ChartScene, LegendBlock, LegendEntry,
    PieSlice, ValueLabel,
};
use crate::palette::SeriesPalette;
use crate::record::FieldLookup;
use crate::resolve::{trim_braces, UNKNOWN_LABEL};
use crate::scale::scale_series;
use crate::template::{ChartKind, ChartSpec};

/// Single-series line color.
const LINE_COLOR: &str = "#0000FF";

const FULL_SIZE: (u32, u32) = (1100, 300);
const PAIRED_SIZE: (u32, u32) = (500, 300);
const PIE_SIZE: (u32, u32) = (600, 300);

const BAR_WIDTH: f64 = 0.5;
const LINE_WIDTH: f64 = 2.0;
const MARKER_SIZE: f64 = 6.0;
const DONUT_FRACTION: f64 = 0.5;
const LABEL_ROTATION: f64 = -45.0;

/// Dispatch every chart spec against the record collection.
///
/// A single chart takes the full content width. Several charts are laid
/// out pairwise in a two-column grid; a trailing odd chart spans the full
/// width of its row.
pub fn dispatch_charts<R: FieldLookup>(specs: &[ChartSpec], records: &[R]) -> Vec<ChartScene> {
    let palette = SeriesPalette::category20();
    let count = specs.len();
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let full_width = count == 1 || (i == count - 1 && count % 2 == 1);
            build_chart(spec, records, &palette, full_width, i / 2, i % 2)
        })
        .collect()
}

fn build_chart<R: FieldLookup>(
    spec: &ChartSpec,
    records: &[R],
    palette: &SeriesPalette,
    full_width: bool,
    row: usize,
    col: usize,
) -> ChartScene {
    let x_key = trim_braces(&spec.x_field);
    let y_key = trim_braces(&spec.y_field);
    let legend_key = trim_braces(&spec.legend_field);

    let labels: Vec<String> = records
        .iter()
        .map(|r| resolve_label(r, x_key))
        .collect();

    let legend_texts: Vec<String> = if legend_key == x_key {
        labels.clone()
    } else {
        records.iter().map(|r| resolve_label(r, legend_key)).collect()
    };

    let raw: Vec<f64> = records
        .iter()
        .map(|r| r.get(y_key).and_then(|v| v.as_number()).unwrap_or(0.0))
        .collect();

    let scaled = scale_series(&raw);
    let y_label = if scaled.unit.is_empty() {
        spec.y_label.clone()
    } else {
        format!("{} ({})", spec.y_label, scaled.unit)
    };
    let values = scaled.values;
    let has_negative = values.iter().any(|v| *v < 0.0);

    let ticks: Vec<AxisTick> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| AxisTick {
            position: i as f64,
            label: label.clone(),
        })
        .collect();

    let series_axis = AxisPolicy {
        ticks,
        show_x_grid: spec.show_x_grid,
        show_y_grid: spec.show_y_grid,
        label_rotation: if spec.rotate_labels { LABEL_ROTATION } else { 0.0 },
        margin_top: 0.3,
        margin_bottom: if has_negative { 0.3 } else { 0.0 },
        hidden: false,
    };

    let series_legend: Vec<LegendEntry> = legend_texts
        .iter()
        .enumerate()
        .map(|(i, text)| LegendEntry {
            label: text.clone(),
            color: palette.color(i).to_string(),
        })
        .collect();

    let (body, entries, axis, size) = match spec.kind {
        ChartKind::Bar => {
            let bars: Vec<BarMark> = values
                .iter()
                .enumerate()
                .map(|(i, &value)| BarMark {
                    value,
                    color: palette.color(i).to_string(),
                    width: BAR_WIDTH,
                    value_label: spec
                        .show_value_labels
                        .then(|| format_number(value, &spec.value_format)),
                })
                .collect();
            let size = if full_width { FULL_SIZE } else { PAIRED_SIZE };
            (ChartBody::Bar { bars }, series_legend, series_axis, size)
        }
        ChartKind::Line => {
            // One connected series over consecutive integer positions;
            // the resolved labels become the tick text.
            let points: Vec<(f64, f64)> = values
                .iter()
                .enumerate()
                .map(|(i, &value)| (i as f64, value))
                .collect();
            let value_labels = if spec.show_value_labels {
                points
                    .iter()
                    .map(|&(x, y)| ValueLabel {
                        x,
                        y,
                        text: format_number(y, &spec.value_format),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            let body = ChartBody::Line {
                points,
                color: LINE_COLOR.to_string(),
                line_width: LINE_WIDTH,
                marker_size: MARKER_SIZE,
                value_labels,
            };
            let size = if full_width { FULL_SIZE } else { PAIRED_SIZE };
            (body, series_legend, series_axis, size)
        }
        ChartKind::Pie => {
            // Only strictly positive values become slices; the legend
            // keeps step with what actually got drawn.
            let mut slices = Vec::new();
            let mut entries = Vec::new();
            for (i, &value) in values.iter().enumerate() {
                if value > 0.0 {
                    slices.push(PieSlice {
                        value,
                        label: labels[i].clone(),
                        color: palette.color(i).to_string(),
                    });
                    entries.push(LegendEntry {
                        label: legend_texts[i].clone(),
                        color: palette.color(i).to_string(),
                    });
                }
            }
            let body = ChartBody::Pie {
                slices,
                donut_fraction: DONUT_FRACTION,
            };
            let axis = AxisPolicy {
                ticks: Vec::new(),
                show_x_grid: false,
                show_y_grid: false,
                label_rotation: 0.0,
                margin_top: 0.0,
                margin_bottom: 0.0,
                hidden: true,
            };
            (body, entries, axis, PIE_SIZE)
        }
    };

    ChartScene {
        kind: spec.kind,
        title: spec.title.clone(),
        x_label: spec.x_label.clone(),
        y_label,
        unit: scaled.unit,
        font_name: spec.font_name.clone(),
        title_font_size: spec.title_font_size,
        label_font_size: spec.label_font_size,
        value_font_size: spec.value_font_size,
        axis_font_size: spec.axis_font_size,
        body,
        axis,
        legend: LegendBlock {
            visible: spec.show_legend,
            entries,
            align: spec.legend_align,
            orientation: spec.legend_orientation,
            font_size: spec.legend_font_size,
        },
        canvas: ChartCanvas {
            width: size.0,
            height: size.1,
            row,
            col,
            full_width,
        },
    }
}

fn resolve_label<R: FieldLookup>(record: &R, key: &str) -> String {
    record
        .get(key)
        .and_then(|v| v.text())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}
