//! Table binding: one cell descriptor per emitted (row, column) pair.

use std::collections::HashMap;

use crate::formatter::format_cell;
use crate::ir::CellDesc;
use crate::record::FieldLookup;
use crate::resolve::{resolve, FieldRef, PLACEHOLDER};
use crate::span::{SpanDecision, SpanPlanner};
use crate::template::{DataCell, HeaderCell};

/// Text color for cells whose raw value is a negative number.
pub const NEGATIVE_TEXT_COLOR: &str = "#FF1744";
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Caller-supplied rank coloring: zero-based column index to a function
/// from the displayed rank to a color token. `None` (or an empty token)
/// keeps the column's configured background.
pub type RankingFn = Box<dyn Fn(i64) -> Option<String>>;
pub type RankingPolicy = HashMap<usize, RankingFn>;

/// Bind header cells. `{field}` text resolves against the document model;
/// literals pass through.
pub fn bind_header_cells<R: FieldLookup>(cells: &[HeaderCell], model: Option<&R>) -> Vec<CellDesc> {
    cells
        .iter()
        .enumerate()
        .map(|(col, cell)| {
            let text = match (FieldRef::parse(&cell.text), model) {
                (FieldRef::Literal(text), _) => text,
                (FieldRef::Field(name), Some(model)) => model
                    .get(&name)
                    .and_then(|v| v.text())
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                (FieldRef::Field(_), None) => PLACEHOLDER.to_string(),
            };
            CellDesc {
                row: 0,
                col,
                text,
                row_span: cell.row_span as usize,
                col_span: cell.col_span,
                background: cell.background.clone(),
                text_color: DEFAULT_TEXT_COLOR.to_string(),
                align: cell.align,
                font_size: cell.font_size,
                bold: cell.bold,
                rtl: true,
                repeated: true,
                border_size: cell.border_size,
                padding: cell.padding,
            }
        })
        .collect()
}

/// Bind data cells in row-major order, skipping slots covered by spans.
///
/// Columns are sorted by their `order` key before binding; the zero-based
/// index into the sorted list is the column index the ranking policy sees.
/// Span state is allocated here, once per call, so independent renders
/// can never interleave their span accounting.
pub fn bind_data_cells<R: FieldLookup>(
    cells: &[DataCell],
    records: &[R],
    ranking: &RankingPolicy,
) -> Vec<CellDesc> {
    let mut sorted: Vec<&DataCell> = cells.iter().collect();
    sorted.sort_by_key(|c| c.order.unwrap_or(i32::MAX));

    let total_rows = records.len();
    let mut planners: Vec<SpanPlanner> = sorted
        .iter()
        .map(|c| SpanPlanner::new(&c.row_span))
        .collect();

    let mut out = Vec::new();
    for (row, record) in records.iter().enumerate() {
        for (col, cell) in sorted.iter().enumerate() {
            let span = match planners[col].next(total_rows, row) {
                SpanDecision::Covered => continue,
                SpanDecision::Emit(span) => span,
            };

            let raw = resolve(record, &FieldRef::parse(&cell.field));
            let text = format_cell(&raw, &cell.format);
            let background = ranking_background(&text, cell, col, ranking);
            let text_color = if raw.as_number().map_or(false, |n| n < 0.0) {
                NEGATIVE_TEXT_COLOR.to_string()
            } else {
                DEFAULT_TEXT_COLOR.to_string()
            };

            out.push(CellDesc {
                row,
                col,
                text,
                row_span: span,
                col_span: 1,
                background,
                text_color,
                align: cell.align,
                font_size: cell.font_size,
                bold: cell.bold,
                rtl: cell.rtl,
                repeated: cell.repeated,
                border_size: cell.border_size,
                padding: cell.padding,
            });
        }
    }
    out
}

fn ranking_background(
    text: &str,
    cell: &DataCell,
    col: usize,
    ranking: &RankingPolicy,
) -> String {
    if cell.ranking_flag {
        if let Some(method) = ranking.get(&col) {
            if let Ok(rank) = text.trim().parse::<i64>() {
                if let Some(color) = method(rank) {
                    if !color.is_empty() {
                        return color;
                    }
                }
            }
        }
    }
    cell.background.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, RecordSet};
    use serde_json::json;

    fn make_records(value: serde_json::Value) -> Vec<Record> {
        RecordSet::from_json(&value).unwrap().items
    }

    fn make_cell(value: serde_json::Value) -> DataCell {
        serde_json::from_value(value).unwrap()
    }

    fn no_ranking() -> RankingPolicy {
        RankingPolicy::new()
    }

    #[test]
    fn test_row_major_emission_sorted_by_order() {
        let records = make_records(json!([
            {"Name": "a", "Value": 1},
            {"Name": "b", "Value": 2}
        ]));
        let cells = vec![
            make_cell(json!({"field": "{Value}", "order": 1})),
            make_cell(json!({"field": "{Name}", "order": 0})),
        ];
        let out = bind_data_cells(&cells, &records, &no_ranking());
        assert_eq!(out.len(), 4);
        // Column 0 is the order-0 cell regardless of declaration order.
        assert_eq!(out[0].text, "a");
        assert_eq!(out[1].text, "1");
        assert_eq!(out[2].row, 1);
        assert_eq!(out[2].text, "b");
    }

    #[test]
    fn test_spanned_rows_are_skipped() {
        let records = make_records(json!([
            {"Name": "a"}, {"Name": "b"}, {"Name": "c"}
        ]));
        let cells = vec![make_cell(
            json!({"field": "{Name}", "order": 0, "rowSpan": ["2"]}),
        )];
        let out = bind_data_cells(&cells, &records, &no_ranking());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].row, 0);
        assert_eq!(out[0].row_span, 2);
        assert_eq!(out[1].row, 2);
        assert_eq!(out[1].row_span, 1);
    }

    #[test]
    fn test_span_coverage_matches_row_count() {
        let records = make_records(json!([
            {"V": 1}, {"V": 2}, {"V": 3}, {"V": 4}, {"V": 5},
            {"V": 6}, {"V": 7}, {"V": 8}, {"V": 9}, {"V": 10}
        ]));
        let cells = vec![make_cell(
            json!({"field": "{V}", "order": 0, "rowSpan": ["2", "all"]}),
        )];
        let out = bind_data_cells(&cells, &records, &no_ranking());
        let spans: Vec<usize> = out.iter().map(|c| c.row_span).collect();
        assert_eq!(spans, vec![2, 8]);
        assert_eq!(spans.iter().sum::<usize>(), records.len());
    }

    #[test]
    fn test_ranking_color_for_integer_text() {
        let records = make_records(json!([{"Rank": 1}, {"Rank": 7}]));
        let cells = vec![make_cell(
            json!({"field": "{Rank}", "order": 0, "rankingFlag": true}),
        )];
        let mut ranking = RankingPolicy::new();
        ranking.insert(
            0,
            Box::new(|rank| {
                if rank <= 3 {
                    Some("#92D050".to_string())
                } else {
                    Some("#FF8989".to_string())
                }
            }),
        );
        let out = bind_data_cells(&cells, &records, &ranking);
        assert_eq!(out[0].background, "#92D050");
        assert_eq!(out[1].background, "#FF8989");
    }

    #[test]
    fn test_ranking_skipped_for_non_integer_text() {
        let records = make_records(json!([{"Rank": "first"}]));
        let cells = vec![make_cell(json!({
            "field": "{Rank}", "order": 0, "rankingFlag": true, "background": "E6B8B7"
        }))];
        let mut ranking = RankingPolicy::new();
        ranking.insert(0, Box::new(|_| Some("#92D050".to_string())));
        let out = bind_data_cells(&cells, &records, &ranking);
        assert_eq!(out[0].background, "E6B8B7");
    }

    #[test]
    fn test_negative_value_text_color() {
        let records = make_records(json!([{"Delta": -42}, {"Delta": 42}]));
        let cells = vec![make_cell(json!({"field": "{Delta}", "order": 0}))];
        let out = bind_data_cells(&cells, &records, &no_ranking());
        assert_eq!(out[0].text_color, NEGATIVE_TEXT_COLOR);
        assert_eq!(out[1].text_color, DEFAULT_TEXT_COLOR);
    }

    #[test]
    fn test_format_applied_to_numeric_cells() {
        let records = make_records(json!([{"Share": 12.345}]));
        let cells = vec![make_cell(json!({
            "field": "{Share}", "order": 0, "format": "0.0'%'"
        }))];
        let out = bind_data_cells(&cells, &records, &no_ranking());
        assert_eq!(out[0].text, "12.3%");
    }

    #[test]
    fn test_unresolved_field_renders_placeholder() {
        let records = make_records(json!([{"Name": "a"}]));
        let cells = vec![make_cell(json!({"field": "{Gone}", "order": 0}))];
        let out = bind_data_cells(&cells, &records, &no_ranking());
        assert_eq!(out[0].text, PLACEHOLDER);
    }

    #[test]
    fn test_planner_state_does_not_leak_between_calls() {
        let records = make_records(json!([{"V": 1}, {"V": 2}, {"V": 3}]));
        let cells = vec![make_cell(
            json!({"field": "{V}", "order": 0, "rowSpan": ["3"]}),
        )];
        let first = bind_data_cells(&cells, &records, &no_ranking());
        let second = bind_data_cells(&cells, &records, &no_ranking());
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].row_span, 3);
        assert_eq!(second[0].row_span, 3);
    }

    #[test]
    fn test_header_cells_resolve_against_model() {
        let model = make_records(json!([{"Title": "Q3 Summary"}])).remove(0);
        let headers: Vec<HeaderCell> = vec![
            serde_json::from_value(json!({"text": "{Title}", "colSpan": 2})).unwrap(),
            serde_json::from_value(json!({"text": "Branch"})).unwrap(),
            serde_json::from_value(json!({"text": "{Nope}"})).unwrap(),
        ];
        let out = bind_header_cells(&headers, Some(&model));
        assert_eq!(out[0].text, "Q3 Summary");
        assert_eq!(out[0].col_span, 2);
        assert_eq!(out[1].text, "Branch");
        assert_eq!(out[2].text, PLACEHOLDER);
    }
}
