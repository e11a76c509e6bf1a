//! Raster charts for the report, drawn with plotters into an RGB buffer and
//! written as PNG files with unique names.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use image::{ImageFormat, RgbImage};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::register_font;
use uuid::Uuid;

use crate::cleanup::TempArtifacts;
use crate::color::{lighten, parse_hex};
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};

pub const BAR_CHART_TITLE: &str = "Faturamento por Categoria (Top 10)";
pub const LINE_CHART_TITLE: &str = "Tendência de Vendas (Semanal)";

/// DejaVu Sans, so chart text never depends on the host's installed fonts.
const CHART_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const CHART_FONT_FAMILY: &str = "sans-serif";

fn render_err(e: impl std::fmt::Display) -> ReportError {
    ReportError::Render(format!("chart: {e}"))
}

/// Register the bundled font under `sans-serif` once per process.
fn ensure_chart_font() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        let ok = register_font(CHART_FONT_FAMILY, FontStyle::Normal, CHART_FONT).is_ok();
        if ok {
            log::debug!("registered bundled chart font ({} bytes)", CHART_FONT.len());
        }
        ok
    });
    if ok {
        Ok(())
    } else {
        Err(render_err("bundled chart font could not be parsed"))
    }
}

/// The categories the bar chart shows: ascending by total, only the
/// `top_n` largest. The largest ends up last, i.e. drawn at the top.
pub fn top_categories(category_totals: &[(String, f64)], top_n: usize) -> Vec<(String, f64)> {
    let mut sorted = category_totals.to_vec();
    // stable sort keeps key order between equal totals
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
    let skip = sorted.len().saturating_sub(top_n);
    sorted.split_off(skip)
}

/// Horizontal bar chart of the top categories. An empty input still
/// produces a chart (title and axes only).
pub fn render_bar_chart(
    category_totals: &[(String, f64)],
    config: &ReportConfig,
    work_dir: &Path,
    temps: &mut TempArtifacts,
) -> Result<PathBuf> {
    ensure_chart_font()?;
    let bars = top_categories(category_totals, config.top_n);
    let color = parse_hex(&config.bar_color)?;
    let (w, h) = config.chart_size;

    let mut buffer = vec![0u8; w as usize * h as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let x_max = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
        let x_min = bars.iter().map(|(_, v)| *v).fold(0.0, f64::min);
        let x_range = if x_max > x_min {
            (x_min * 1.05)..(x_max * 1.05)
        } else {
            0.0..1.0
        };
        let slots = bars.len().max(1) as i32;

        let mut chart = ChartBuilder::on(&root)
            .caption(BAR_CHART_TITLE, (CHART_FONT_FAMILY, 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(label_area_width(&bars))
            .build_cartesian_2d(x_range, (0..slots).into_segmented())
            .map_err(render_err)?;

        let labels: Vec<&str> = bars.iter().map(|(k, _)| k.as_str()).collect();
        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc("Total (R$)")
            .y_labels(labels.len().max(1))
            .y_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => {
                    labels.get(*i as usize).map(|s| s.to_string()).unwrap_or_default()
                }
                _ => String::new(),
            })
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
                let i = i as i32;
                Rectangle::new(
                    [(0.0, SegmentValue::Exact(i)), (*v, SegmentValue::Exact(i + 1))],
                    color.filled(),
                )
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }

    write_png(buffer, (w, h), work_dir, "chart_cat", temps)
}

/// Weekly totals as a marker-connected line over a light grid.
pub fn render_line_chart(
    weekly_totals: &[(NaiveDate, f64)],
    config: &ReportConfig,
    work_dir: &Path,
    temps: &mut TempArtifacts,
) -> Result<PathBuf> {
    ensure_chart_font()?;
    let color = parse_hex(&config.line_color)?;
    let grid = lighten(color, 0.93);
    let (w, h) = config.chart_size;

    let mut buffer = vec![0u8; w as usize * h as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let points: Vec<(i32, f64)> = weekly_totals
            .iter()
            .enumerate()
            .map(|(i, (_, v))| (i as i32, *v))
            .collect();
        let y_max = points.iter().map(|(_, v)| *v).fold(0.0, f64::max);
        let y_min = points.iter().map(|(_, v)| *v).fold(0.0, f64::min);
        let y_range = if y_max > y_min {
            (y_min * 1.1)..(y_max * 1.1)
        } else {
            0.0..1.0
        };
        let last = (points.len() as i32 - 1).max(1);

        let mut chart = ChartBuilder::on(&root)
            .caption(LINE_CHART_TITLE, (CHART_FONT_FAMILY, 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0..last, y_range)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .light_line_style(grid)
            .bold_line_style(grid.mix(0.8))
            .x_labels(weekly_totals.len().clamp(1, 12))
            .x_label_formatter(&|i| {
                weekly_totals
                    .get(*i as usize)
                    .map(|(d, _)| d.format("%d/%m").to_string())
                    .unwrap_or_default()
            })
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(render_err)?;
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }

    write_png(buffer, (w, h), work_dir, "chart_time", temps)
}

/// Wide enough for the longest category name at the label font size.
fn label_area_width(bars: &[(String, f64)]) -> u32 {
    let longest = bars.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0) as u32;
    (longest * 8 + 16).clamp(40, 260)
}

/// Encode the buffer as `<prefix>_<uuid>.png` inside `dir`. The file is
/// created exclusively and registered for cleanup before any byte is written.
fn write_png(
    buffer: Vec<u8>,
    (w, h): (u32, u32),
    dir: &Path,
    prefix: &str,
    temps: &mut TempArtifacts,
) -> Result<PathBuf> {
    let image = RgbImage::from_raw(w, h, buffer)
        .ok_or_else(|| render_err(format!("buffer does not match {w}x{h}")))?;

    let path = dir.join(format!("{prefix}_{}.png", Uuid::new_v4()));
    let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    temps.track(&path);

    let mut writer = BufWriter::new(file);
    image
        .write_to(&mut writer, ImageFormat::Png)
        .map_err(render_err)?;
    writer.flush()?;
    log::debug!("wrote chart {}", path.display());
    Ok(path)
}
