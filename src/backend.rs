//! Thin chart-drawing backend: executes a `ChartScene` into PNG bytes.
//!
//! All layout, scaling and color decisions were made by the dispatcher;
//! this module only turns descriptors into plotters calls. Bar and line
//! charts go through the chart builder, pie charts are drawn as filled
//! sectors directly on the drawing area.

use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::ir::{AxisTick, BarMark, ChartBody, ChartScene, PieSlice, ValueLabel};

/// Render one chart scene to PNG bytes at its canvas size.
pub fn render_chart_png(scene: &ChartScene) -> Result<Vec<u8>> {
    let width = scene.canvas.width;
    let height = scene.canvas.height;
    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill chart background")?;

        match &scene.body {
            ChartBody::Bar { bars } => draw_bars(&root, scene, bars)?,
            ChartBody::Line {
                points,
                color,
                line_width,
                marker_size,
                value_labels,
            } => draw_line(&root, scene, points, color, *line_width, *marker_size, value_labels)?,
            ChartBody::Pie {
                slices,
                donut_fraction,
            } => draw_pie(&root, scene, slices, *donut_fraction)?,
        }

        if scene.legend.visible && !scene.legend.entries.is_empty() {
            draw_legend(&root, scene)?;
        }

        root.present().context("Failed to finalize chart surface")?;
    }

    encode_png(&buffer, width, height)
}

fn draw_bars(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    scene: &ChartScene,
    bars: &[BarMark],
) -> Result<()> {
    if bars.is_empty() {
        return draw_title_only(root, scene);
    }

    let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
    let (y_lo, y_hi) = value_range(
        &values,
        scene.axis.margin_bottom,
        scene.axis.margin_top,
        true,
    );
    let n = bars.len() as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(
            scene.title.clone(),
            (scene.font_name.as_str(), scene.title_font_size as f64),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n - 0.5), y_lo..y_hi)
        .context("Failed to build bar chart axes")?;

    configure_mesh(&mut chart, scene)?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let half = bar.width / 2.0;
            let x = i as f64;
            let (y0, y1) = if bar.value >= 0.0 {
                (0.0, bar.value)
            } else {
                (bar.value, 0.0)
            };
            Rectangle::new(
                [(x - half, y0), (x + half, y1)],
                parse_color(&bar.color).filled(),
            )
        }))
        .context("Failed to draw bars")?;

    let label_style =
        TextStyle::from((scene.font_name.as_str(), scene.value_font_size as f64)).color(&BLACK);
    chart
        .draw_series(bars.iter().enumerate().filter_map(|(i, bar)| {
            bar.value_label.as_ref().map(|label| {
                Text::new(label.clone(), (i as f64, bar.value), label_style.clone())
            })
        }))
        .context("Failed to draw bar value labels")?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_line(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    scene: &ChartScene,
    points: &[(f64, f64)],
    color: &str,
    line_width: f64,
    marker_size: f64,
    value_labels: &[ValueLabel],
) -> Result<()> {
    if points.is_empty() {
        return draw_title_only(root, scene);
    }

    let values: Vec<f64> = points.iter().map(|p| p.1).collect();
    let (y_lo, y_hi) = value_range(
        &values,
        scene.axis.margin_bottom,
        scene.axis.margin_top,
        false,
    );
    let n = points.len() as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(
            scene.title.clone(),
            (scene.font_name.as_str(), scene.title_font_size as f64),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n - 0.5), y_lo..y_hi)
        .context("Failed to build line chart axes")?;

    configure_mesh(&mut chart, scene)?;

    let line_color = parse_color(color);
    chart
        .draw_series(LineSeries::new(
            points.iter().copied(),
            ShapeStyle::from(&line_color).stroke_width(line_width as u32),
        ))
        .context("Failed to draw line series")?;
    chart
        .draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, marker_size as i32, line_color.filled())),
        )
        .context("Failed to draw line markers")?;

    let label_style =
        TextStyle::from((scene.font_name.as_str(), scene.value_font_size as f64)).color(&BLACK);
    chart
        .draw_series(value_labels.iter().map(|label| {
            Text::new(label.text.clone(), (label.x, label.y), label_style.clone())
        }))
        .context("Failed to draw line value labels")?;

    Ok(())
}

fn draw_pie(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    scene: &ChartScene,
    slices: &[PieSlice],
    donut_fraction: f64,
) -> Result<()> {
    draw_title_only(root, scene)?;

    let total: f64 = slices.iter().map(|s| s.value).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let width = scene.canvas.width as i32;
    let height = scene.canvas.height as i32;
    let center = (width / 2, height / 2);
    let radius = f64::from(height) * 0.38;
    let label_style = TextStyle::from((scene.font_name.as_str(), scene.label_font_size as f64))
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    let mut angle = -std::f64::consts::FRAC_PI_2;
    for slice in slices {
        let sweep = slice.value / total * std::f64::consts::TAU;
        let steps = ((sweep / 0.02).ceil() as usize).max(2);
        let mut polygon = vec![center];
        for step in 0..=steps {
            let a = angle + sweep * step as f64 / steps as f64;
            polygon.push((
                center.0 + (radius * a.cos()).round() as i32,
                center.1 + (radius * a.sin()).round() as i32,
            ));
        }
        root.draw(&Polygon::new(polygon, parse_color(&slice.color).filled()))
            .context("Failed to draw pie slice")?;

        // Separation stroke between slices.
        let edge = (
            center.0 + (radius * angle.cos()).round() as i32,
            center.1 + (radius * angle.sin()).round() as i32,
        );
        root.draw(&PathElement::new(vec![center, edge], WHITE.stroke_width(2)))
            .context("Failed to draw slice separator")?;

        let mid = angle + sweep / 2.0;
        let label_at = (
            center.0 + (radius * 1.25 * mid.cos()).round() as i32,
            center.1 + (radius * 1.25 * mid.sin()).round() as i32,
        );
        root.draw(&Text::new(slice.label.clone(), label_at, label_style.clone()))
            .context("Failed to draw slice label")?;

        angle += sweep;
    }

    root.draw(&Circle::new(
        center,
        (radius * donut_fraction).round() as i32,
        WHITE.filled(),
    ))
    .context("Failed to draw donut hole")?;

    Ok(())
}

fn configure_mesh(
    chart: &mut ChartContext<
        '_,
        BitMapBackend<'_>,
        Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>,
    >,
    scene: &ChartScene,
) -> Result<()> {
    let ticks = scene.axis.ticks.clone();
    let mut label_style =
        TextStyle::from((scene.font_name.as_str(), scene.axis_font_size as f64)).color(&BLACK);
    if scene.axis.label_rotation != 0.0 {
        // Quarter-turn is the only rotation the raster backend offers.
        label_style = label_style.transform(FontTransform::Rotate90);
    }

    let mut mesh = chart.configure_mesh();
    if !scene.axis.show_x_grid {
        mesh.disable_x_mesh();
    }
    if !scene.axis.show_y_grid {
        mesh.disable_y_mesh();
    }
    mesh.x_desc(scene.x_label.clone())
        .y_desc(scene.y_label.clone())
        .x_labels(ticks.len().max(2))
        .x_label_formatter(&|x| tick_label(&ticks, *x))
        .label_style(label_style)
        .draw()
        .context("Failed to draw chart mesh")?;
    Ok(())
}

fn tick_label(ticks: &[AxisTick], x: f64) -> String {
    ticks
        .iter()
        .find(|t| (t.position - x).abs() < 0.25)
        .map(|t| t.label.clone())
        .unwrap_or_default()
}

fn draw_title_only(root: &DrawingArea<BitMapBackend<'_>, Shift>, scene: &ChartScene) -> Result<()> {
    if scene.title.is_empty() {
        return Ok(());
    }
    let style = TextStyle::from((scene.font_name.as_str(), scene.title_font_size as f64))
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    root.draw(&Text::new(
        scene.title.clone(),
        (scene.canvas.width as i32 / 2, 8),
        style,
    ))
    .context("Failed to draw chart title")?;
    Ok(())
}

fn draw_legend(root: &DrawingArea<BitMapBackend<'_>, Shift>, scene: &ChartScene) -> Result<()> {
    let width = scene.canvas.width as i32;
    let height = scene.canvas.height as i32;
    let font_size = f64::from(scene.legend.font_size);
    let style = TextStyle::from((scene.font_name.as_str(), font_size)).color(&BLACK);

    let horizontal = matches!(
        scene.legend.orientation,
        crate::template::LegendOrientation::Horizontal
    );
    let mut x = 12i32;
    let mut y = if horizontal { height - 16 } else { 24 };
    if !horizontal {
        x = width - 120;
    }

    for entry in &scene.legend.entries {
        root.draw(&Rectangle::new(
            [(x, y), (x + 10, y + 10)],
            parse_color(&entry.color).filled(),
        ))
        .context("Failed to draw legend swatch")?;
        root.draw(&Text::new(entry.label.clone(), (x + 14, y), style.clone()))
            .context("Failed to draw legend label")?;

        if horizontal {
            x += 24 + entry.label.chars().count() as i32 * (font_size as i32) / 2;
            if x > width - 60 {
                break;
            }
        } else {
            y += font_size as i32 + 6;
            if y > height - 16 {
                break;
            }
        }
    }
    Ok(())
}

/// Compute the drawn value range with fractional margins; bar charts
/// always include zero so bars have a baseline.
fn value_range(values: &[f64], margin_bottom: f64, margin_top: f64, include_zero: bool) -> (f64, f64) {
    let mut lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    let span = if (hi - lo).abs() < f64::EPSILON {
        1.0
    } else {
        hi - lo
    };
    (lo - margin_bottom * span, hi + margin_top * span)
}

/// Parse a `#RRGGBB` (or bare `RRGGBB`) token; black on anything else.
fn parse_color(token: &str) -> RGBColor {
    let hex = token.trim_start_matches('#');
    if hex.len() == 6 {
        if let Ok(bits) = u32::from_str_radix(hex, 16) {
            return RGBColor(
                ((bits >> 16) & 0xFF) as u8,
                ((bits >> 8) & 0xFF) as u8,
                (bits & 0xFF) as u8,
            );
        }
    }
    BLACK
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(buffer, width, height, image::ColorType::Rgb8)
        .context("Failed to encode chart PNG")?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::dispatch_charts;
    use crate::record::RecordSet;
    use serde_json::json;

    fn is_valid_png(bytes: &[u8]) -> bool {
        bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
    }

    fn make_scene(spec: serde_json::Value, records: serde_json::Value) -> ChartScene {
        let records = RecordSet::from_json(&records).unwrap();
        let spec: crate::template::ChartSpec = serde_json::from_value(spec).unwrap();
        dispatch_charts(&[spec], &records.items).remove(0)
    }

    #[test]
    fn test_render_bar_chart() {
        let scene = make_scene(
            json!({"xField": "{Name}", "yField": "{Value}", "legendField": "{Name}"}),
            json!([{"Name": "a", "Value": 3}, {"Name": "b", "Value": -1}]),
        );
        let png = render_chart_png(&scene).unwrap();
        assert!(is_valid_png(&png));
    }

    #[test]
    fn test_render_line_chart() {
        let scene = make_scene(
            json!({"type": "line", "xField": "{Name}", "yField": "{Value}"}),
            json!([{"Name": "a", "Value": 1}, {"Name": "b", "Value": 2}]),
        );
        let png = render_chart_png(&scene).unwrap();
        assert!(is_valid_png(&png));
    }

    #[test]
    fn test_render_pie_chart() {
        let scene = make_scene(
            json!({"type": "pie", "xField": "{Name}", "yField": "{Value}", "legendField": "{Name}"}),
            json!([{"Name": "a", "Value": 5}, {"Name": "b", "Value": 3}]),
        );
        let png = render_chart_png(&scene).unwrap();
        assert!(is_valid_png(&png));
    }

    #[test]
    fn test_render_empty_chart_does_not_fail() {
        let scene = make_scene(
            json!({"xField": "{Name}", "yField": "{Value}", "title": "empty"}),
            json!([]),
        );
        let png = render_chart_png(&scene).unwrap();
        assert!(is_valid_png(&png));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#FF0000"), RGBColor(255, 0, 0));
        assert_eq!(parse_color("00FF00"), RGBColor(0, 255, 0));
        assert_eq!(parse_color("bogus"), BLACK);
    }
}
