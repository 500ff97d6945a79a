//! SVG canvas surface
//! Draws charts with plotters into in-memory SVG documents, one per canvas id.

use crate::domain::model::{ChartHandle, ChartKind, ChartSpec};
use crate::domain::ports::ChartSurface;
use crate::utils::error::{DashboardError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, TAU};

/// Canvas size used by the dashboard cards.
pub const DEFAULT_CANVAS_SIZE: (u32, u32) = (525, 500);

/// Slice/bar colors, one per aggregated key.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(54, 162, 235),  // Blue
    RGBColor(255, 99, 132),  // Red
    RGBColor(255, 206, 86),  // Yellow
    RGBColor(75, 192, 192),  // Teal
    RGBColor(153, 102, 255), // Purple
    RGBColor(255, 159, 64),  // Orange
    RGBColor(46, 204, 113),  // Green
    RGBColor(233, 30, 99),   // Pink
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

const TITLE_FONT: (&str, i32) = ("sans-serif", 22);
const LABEL_FONT: (&str, i32) = ("sans-serif", 14);

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

#[derive(Debug, Clone)]
struct SvgCanvas {
    width: u32,
    height: u32,
    svg: Option<String>,
    instance_id: Option<u64>,
}

impl SvgCanvas {
    fn new((width, height): (u32, u32)) -> Self {
        Self {
            width,
            height,
            svg: None,
            instance_id: None,
        }
    }
}

/// Named canvases rendered to SVG.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    canvases: HashMap<String, SvgCanvas>,
    canvas_size: (u32, u32),
    next_instance: u64,
}

impl SvgSurface {
    pub fn new<'a>(canvas_size: (u32, u32), canvas_ids: impl IntoIterator<Item = &'a str>) -> Self {
        let canvases = canvas_ids
            .into_iter()
            .map(|id| (id.to_string(), SvgCanvas::new(canvas_size)))
            .collect();

        Self {
            canvases,
            canvas_size,
            next_instance: 0,
        }
    }

    pub fn has_canvas(&self, canvas_id: &str) -> bool {
        self.canvases.contains_key(canvas_id)
    }

    /// Current SVG document on a canvas, if a chart is drawn there.
    pub fn svg(&self, canvas_id: &str) -> Option<&str> {
        self.canvases.get(canvas_id)?.svg.as_deref()
    }

    pub fn instance_id(&self, canvas_id: &str) -> Option<u64> {
        self.canvases.get(canvas_id)?.instance_id
    }

    pub fn canvas_size(&self, canvas_id: &str) -> Option<(u32, u32)> {
        self.canvases.get(canvas_id).map(|c| (c.width, c.height))
    }
}

impl ChartSurface for SvgSurface {
    fn draw(&mut self, canvas_id: &str, spec: &ChartSpec) -> Result<ChartHandle> {
        let size = self.canvas_size;
        let canvas = self.canvases.entry(canvas_id.to_string()).or_insert_with(|| {
            tracing::debug!("Mounting canvas '{}' ({}x{})", canvas_id, size.0, size.1);
            SvgCanvas::new(size)
        });

        if let Some(existing) = canvas.instance_id {
            return Err(DashboardError::ChartError {
                canvas_id: canvas_id.to_string(),
                message: format!("canvas is already in use by chart #{}", existing),
            });
        }

        let svg = render_svg(spec, canvas.width, canvas.height)?;

        self.next_instance += 1;
        canvas.svg = Some(svg);
        canvas.instance_id = Some(self.next_instance);

        Ok(ChartHandle {
            canvas_id: canvas_id.to_string(),
            instance_id: self.next_instance,
            kind: spec.kind,
        })
    }

    fn destroy(&mut self, handle: &ChartHandle) -> Result<()> {
        let canvas =
            self.canvases
                .get_mut(&handle.canvas_id)
                .ok_or_else(|| DashboardError::ChartError {
                    canvas_id: handle.canvas_id.clone(),
                    message: "canvas not found".to_string(),
                })?;

        if canvas.instance_id != Some(handle.instance_id) {
            return Err(DashboardError::ChartError {
                canvas_id: handle.canvas_id.clone(),
                message: format!("chart #{} is not attached here", handle.instance_id),
            });
        }

        canvas.instance_id = None;
        canvas.svg = None;
        Ok(())
    }

    fn detach(&mut self, canvas_id: &str) {
        if self.canvases.remove(canvas_id).is_some() {
            tracing::debug!("Detached canvas '{}'", canvas_id);
        }
    }
}

fn render_error<E: std::fmt::Display>(e: E) -> DashboardError {
    DashboardError::RenderError {
        message: e.to_string(),
    }
}

/// Render a chart into a standalone SVG document.
pub fn render_svg(spec: &ChartSpec, width: u32, height: u32) -> Result<String> {
    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        match spec.kind {
            ChartKind::Bar => draw_bar(&root, spec)?,
            ChartKind::Line => draw_line(&root, spec)?,
            ChartKind::Pie | ChartKind::Doughnut | ChartKind::PolarArea => {
                draw_radial(&root, spec)?
            }
        }

        root.present().map_err(render_error)?;
    }
    Ok(buffer)
}

fn y_upper_bound(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        1.0
    } else {
        max * 1.1
    }
}

fn segment_label(labels: &[String], value: &SegmentValue<i32>) -> String {
    match value {
        SegmentValue::CenterOf(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .cloned()
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn draw_bar(root: &Area<'_>, spec: &ChartSpec) -> Result<()> {
    let segments = spec.values.len().max(1) as i32;
    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, TITLE_FONT)
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d((0..segments).into_segmented(), 0f64..y_upper_bound(&spec.values))
        .map_err(render_error)?;

    let formatter = |v: &SegmentValue<i32>| segment_label(&spec.labels, v);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(segments as usize)
        .x_label_formatter(&formatter)
        .y_desc("Count")
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(spec.values.iter().enumerate().map(|(i, value)| {
            let color = PALETTE[i % PALETTE.len()];
            let i = i as i32;
            Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
                color.mix(0.8).filled(),
            )
        }))
        .map_err(render_error)?;

    Ok(())
}

fn draw_line(root: &Area<'_>, spec: &ChartSpec) -> Result<()> {
    let segments = spec.values.len().max(1) as i32;
    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, TITLE_FONT)
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d((0..segments).into_segmented(), 0f64..y_upper_bound(&spec.values))
        .map_err(render_error)?;

    let formatter = |v: &SegmentValue<i32>| segment_label(&spec.labels, v);
    chart
        .configure_mesh()
        .x_labels(segments as usize)
        .x_label_formatter(&formatter)
        .y_desc("Count")
        .draw()
        .map_err(render_error)?;

    let point = |i: usize, value: f64| (SegmentValue::CenterOf(i as i32), value);
    let color = PALETTE[0];

    chart
        .draw_series(LineSeries::new(
            spec.values.iter().enumerate().map(|(i, v)| point(i, *v)),
            color.stroke_width(2),
        ))
        .map_err(render_error)?;
    chart
        .draw_series(
            spec.values
                .iter()
                .enumerate()
                .map(|(i, v)| Circle::new(point(i, *v), 4, color.filled())),
        )
        .map_err(render_error)?;

    Ok(())
}

/// One slice of a pie, doughnut or polar-area chart, in radians and pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Sector {
    start: f64,
    sweep: f64,
    inner: f64,
    outer: f64,
}

fn sectors(kind: ChartKind, values: &[f64], radius: f64) -> Vec<Sector> {
    let total: f64 = values.iter().sum();
    let max = values.iter().copied().fold(0.0, f64::max);
    if total <= 0.0 || values.is_empty() {
        return Vec::new();
    }

    let mut start = -FRAC_PI_2;
    let mut result = Vec::with_capacity(values.len());

    for value in values {
        let sector = match kind {
            ChartKind::PolarArea => Sector {
                start,
                sweep: TAU / values.len() as f64,
                inner: 0.0,
                outer: radius * value / max,
            },
            ChartKind::Doughnut => Sector {
                start,
                sweep: TAU * value / total,
                inner: radius * 0.5,
                outer: radius,
            },
            _ => Sector {
                start,
                sweep: TAU * value / total,
                inner: 0.0,
                outer: radius,
            },
        };
        start += sector.sweep;
        result.push(sector);
    }

    result
}

fn sector_polygon(center: (i32, i32), sector: &Sector) -> Vec<(i32, i32)> {
    let steps = ((sector.sweep.to_degrees() / 3.0).ceil() as usize).max(2);
    let at = |angle: f64, r: f64| {
        (
            center.0 + (r * angle.cos()).round() as i32,
            center.1 + (r * angle.sin()).round() as i32,
        )
    };

    let mut points: Vec<(i32, i32)> = (0..=steps)
        .map(|k| at(sector.start + sector.sweep * k as f64 / steps as f64, sector.outer))
        .collect();

    if sector.inner <= 0.0 {
        points.push(center);
    } else {
        points.extend(
            (0..=steps)
                .rev()
                .map(|k| at(sector.start + sector.sweep * k as f64 / steps as f64, sector.inner)),
        );
    }

    points
}

fn draw_radial(root: &Area<'_>, spec: &ChartSpec) -> Result<()> {
    let area = root.titled(&spec.title, TITLE_FONT).map_err(render_error)?;
    let (width, height) = area.dim_in_pixel();

    let legend_width = if spec.is_empty() { 0 } else { (width / 4).min(140) };
    let plot_width = width.saturating_sub(legend_width);
    let center = ((plot_width / 2) as i32, (height / 2) as i32);
    let radius = (plot_width.min(height) as f64 / 2.0 - 12.0).max(4.0);

    let slices = sectors(spec.kind, &spec.values, radius);
    if slices.is_empty() {
        area.draw(&Text::new("No data", (center.0 - 25, center.1), LABEL_FONT))
            .map_err(render_error)?;
        return Ok(());
    }

    for (i, slice) in slices.iter().enumerate() {
        if slice.sweep <= 0.0 || slice.outer <= 0.0 {
            continue;
        }
        let color = PALETTE[i % PALETTE.len()];
        area.draw(&Polygon::new(sector_polygon(center, slice), color.mix(0.85).filled()))
            .map_err(render_error)?;
    }

    // 圖例
    let legend_x = plot_width as i32 + 10;
    for (i, label) in spec.labels.iter().enumerate() {
        let y = 10 + i as i32 * 20;
        let color = PALETTE[i % PALETTE.len()];
        area.draw(&Rectangle::new([(legend_x, y), (legend_x + 12, y + 12)], color.filled()))
            .map_err(render_error)?;
        area.draw(&Text::new(label.as_str(), (legend_x + 18, y), LABEL_FONT))
            .map_err(render_error)?;
    }

    Ok(())
}
