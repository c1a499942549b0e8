//! Report composition: validate, then bind the table and dispatch the
//! charts into one `ReportScene`.
//!
//! Composition is a single synchronous pass. All mutable bookkeeping
//! (the span planners) is created inside the pass, so concurrent or
//! back-to-back calls never share state.

use std::collections::HashSet;

use crate::chart::dispatch_charts;
use crate::ir::{PageSetup, ReportScene};
use crate::record::{DocumentSource, Record, RecordSet};
use crate::table::{bind_data_cells, bind_header_cells, RankingPolicy};
use crate::template::Template;
use crate::validate::validate;

/// Compose a report scene, or refuse with the full batch of validation
/// errors. Rendering never proceeds past a non-empty batch.
pub fn compose(
    template: &Template,
    model: Option<&Record>,
    records: &RecordSet,
    ranking: &RankingPolicy,
) -> Result<ReportScene, Vec<String>> {
    let model_fields: HashSet<String> = model.map(|m| m.field_names()).unwrap_or_default();
    let record_fields = records.field_set();

    let errors = validate(template, &model_fields, &record_fields, records.len());
    if !errors.is_empty() {
        log::warn!(
            "Refusing to compose report: {} validation error(s)",
            errors.len()
        );
        return Err(errors);
    }

    log::debug!(
        "Composing report: {} records, {} columns, {} charts",
        records.len(),
        template.content.data.len(),
        template.content.charts.len()
    );

    let (paper_width_mm, paper_height_mm) = template.paper_dimensions();
    Ok(ReportScene {
        page: PageSetup {
            rtl: template.rtl,
            margin: template.margin,
            font: template.font.clone(),
            paper_size: template.paper_size.clone(),
            orientation: template.orientation.clone(),
            paper_width_mm,
            paper_height_mm,
        },
        page_header: template.header.clone(),
        page_footer: template.footer.clone(),
        content_spacing: template.content.margin_between,
        total_columns: template
            .content
            .total_columns
            .unwrap_or(template.content.data.len()),
        header_cells: bind_header_cells(&template.content.headers, model),
        body_cells: bind_data_cells(&template.content.data, &records.items, ranking),
        charts: dispatch_charts(&template.content.charts, &records.items),
    })
}

/// Convenience wrapper for a parsed `DocumentSource`.
pub fn compose_source(
    template: &Template,
    source: &DocumentSource,
    ranking: &RankingPolicy,
) -> Result<ReportScene, Vec<String>> {
    compose(template, source.model.as_ref(), &source.records, ranking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_template() -> Template {
        Template::from_json(
            r#"{"content": {
                "totalColumns": 2,
                "headers": [{"text": "{Title}"}, {"text": "Score"}],
                "data": [
                    {"field": "{Name}", "order": 0},
                    {"field": "{Score}", "order": 1}
                ],
                "charts": [{"xField": "{Name}", "yField": "{Score}", "legendField": "{Name}"}]
            }}"#,
        )
        .unwrap()
    }

    fn make_source() -> DocumentSource {
        DocumentSource::from_json(
            &json!({
                "Title": "Standings",
                "records": [
                    {"Name": "a", "Score": 10},
                    {"Name": "b", "Score": -4}
                ]
            }),
            "records",
        )
        .unwrap()
    }

    #[test]
    fn test_compose_produces_full_scene() {
        let scene =
            compose_source(&make_template(), &make_source(), &RankingPolicy::new()).unwrap();
        assert_eq!(scene.total_columns, 2);
        assert_eq!(scene.header_cells.len(), 2);
        assert_eq!(scene.header_cells[0].text, "Standings");
        assert_eq!(scene.body_cells.len(), 4);
        assert_eq!(scene.charts.len(), 1);
        assert_eq!(scene.page.paper_width_mm, 297.0);
    }

    #[test]
    fn test_compose_refuses_on_dangling_reference() {
        let template = Template::from_json(
            r#"{"content": {
                "totalColumns": 1,
                "headers": [{"text": "h"}],
                "data": [{"field": "{Ghost}", "order": 0}]
            }}"#,
        )
        .unwrap();
        let errors =
            compose_source(&template, &make_source(), &RankingPolicy::new()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Ghost")));
    }

    #[test]
    fn test_compose_refuses_empty_records() {
        let source = DocumentSource::from_json(&json!([]), "records").unwrap();
        let errors = compose(
            &make_template(),
            None,
            &source.records,
            &RankingPolicy::new(),
        )
        .unwrap_err();
        assert!(errors.iter().any(|e| e.contains("No records")));
    }
}
