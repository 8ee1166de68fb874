//! District bar chart: four panels on a 2x2 grid.
//!
//! The bitmap is drawn from shapes only. Text needs a font backend, which
//! the SVG rendition gets for free from the viewer, so titles and labels
//! live in the SVG.

use crate::analysis::district::DistrictStats;
use crate::utils::error::{AccessError, Result};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

pub const CHART_PNG_FILE: &str = "daegu_district_analysis.png";
pub const CHART_SVG_FILE: &str = "daegu_district_analysis.svg";

const MARGIN_LEFT: i32 = 60;
const MARGIN_RIGHT: i32 = 20;
const MARGIN_TOP: i32 = 50;
const MARGIN_BOTTOM: i32 = 70;
const GRID_LINES: i32 = 4;

/// Smallest canvas whose 2x2 panels still leave a plot area inside the margins.
pub const MIN_CHART_WIDTH: u32 = 2 * (MARGIN_LEFT + MARGIN_RIGHT + 1) as u32;
pub const MIN_CHART_HEIGHT: u32 = 2 * (MARGIN_TOP + MARGIN_BOTTOM + 1) as u32;

#[derive(Debug, Clone)]
pub struct Panel {
    pub title: String,
    pub y_label: String,
    pub color: RGBColor,
    pub values: Vec<f64>,
}

/// Station count, walkway count, mean score and accessible walkway share per district.
pub fn district_panels(stats: &[DistrictStats]) -> (Vec<String>, Vec<Panel>) {
    let labels = stats.iter().map(|d| d.district.clone()).collect();
    let panel = |title: &str, y_label: &str, color: RGBColor, f: fn(&DistrictStats) -> f64| Panel {
        title: title.to_string(),
        y_label: y_label.to_string(),
        color,
        values: stats.iter().map(f).collect(),
    };

    let panels = vec![
        panel("구별 급속충전기 수", "충전기 수", RED, |d| d.station_count as f64),
        panel("구별 보행로 수", "보행로 수", BLUE, |d| d.walkway_count as f64),
        panel("구별 평균 접근성 점수", "평균 점수", GREEN, |d| {
            d.mean_accessibility_score
        }),
        panel(
            "구별 휠체어 접근 가능 보행로 비율",
            "비율 (%)",
            RGBColor(255, 165, 0),
            |d| d.accessible_walkway_ratio * 100.0,
        ),
    ];
    (labels, panels)
}

fn render_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> AccessError {
    AccessError::render(e.to_string())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    labels: &[String],
    panel: &Panel,
    with_text: bool,
) -> Result<()> {
    let (width, height) = area.dim_in_pixel();
    let (width, height) = (width as i32, height as i32);
    let (left, right) = (MARGIN_LEFT, width - MARGIN_RIGHT);
    let (top, bottom) = (MARGIN_TOP, height - MARGIN_BOTTOM);
    if right <= left || bottom <= top {
        return Err(AccessError::render(format!(
            "panel of {}x{} pixels is too small",
            width, height
        )));
    }

    let max = panel.values.iter().cloned().fold(0.0_f64, f64::max);
    let plot_height = (bottom - top) as f64;

    for i in 1..=GRID_LINES {
        let y = bottom - (bottom - top) * i / GRID_LINES;
        area.draw(&PathElement::new(
            vec![(left, y), (right, y)],
            RGBColor(220, 220, 220).stroke_width(1),
        ))
        .map_err(render_error)?;
    }

    if !panel.values.is_empty() {
        let slot = (right - left) as f64 / panel.values.len() as f64;
        for (i, value) in panel.values.iter().enumerate() {
            let bar_height = if max > 0.0 {
                (value / max * plot_height).round() as i32
            } else {
                0
            };
            let x0 = left + (slot * (i as f64 + 0.15)).round() as i32;
            let x1 = left + (slot * (i as f64 + 0.85)).round() as i32;
            if bar_height > 0 {
                area.draw(&Rectangle::new(
                    [(x0, bottom - bar_height), (x1, bottom)],
                    panel.color.mix(0.7).filled(),
                ))
                .map_err(render_error)?;
            }

            if with_text {
                let center = (x0 + x1) / 2;
                let label = labels.get(i).map(String::as_str).unwrap_or_default();
                area.draw(&Text::new(
                    label.to_string(),
                    (center, bottom + 8),
                    ("sans-serif", 13.0)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(HPos::Center, VPos::Top)),
                ))
                .map_err(render_error)?;
                area.draw(&Text::new(
                    format_value(*value),
                    (center, bottom - bar_height - 4),
                    ("sans-serif", 12.0)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(HPos::Center, VPos::Bottom)),
                ))
                .map_err(render_error)?;
            }
        }
    }

    area.draw(&PathElement::new(
        vec![(left, top), (left, bottom), (right, bottom)],
        BLACK.stroke_width(2),
    ))
    .map_err(render_error)?;

    if with_text {
        area.draw(&Text::new(
            panel.title.clone(),
            (width / 2, 12),
            ("sans-serif", 18.0)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        ))
        .map_err(render_error)?;
        area.draw(&Text::new(
            panel.y_label.clone(),
            (8, top - 22),
            ("sans-serif", 13.0)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Top)),
        ))
        .map_err(render_error)?;
    }
    Ok(())
}

fn draw_panels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    labels: &[String],
    panels: &[Panel],
    with_text: bool,
) -> Result<()> {
    root.fill(&WHITE).map_err(render_error)?;
    for (area, panel) in root.split_evenly((2, 2)).iter().zip(panels) {
        draw_panel(area, labels, panel, with_text)?;
    }
    root.present().map_err(render_error)?;
    Ok(())
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

pub fn render_png(
    path: &Path,
    labels: &[String],
    panels: &[Panel],
    size: (u32, u32),
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_panels(&root, labels, panels, false)?;
    tracing::debug!("🖼️ Chart written to {}", path.display());
    Ok(())
}

pub fn render_svg(labels: &[String], panels: &[Panel], size: (u32, u32)) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_panels(&root, labels, panels, true)?;
    }
    Ok(svg)
}
