// src/plot_framework.rs

use ndarray::Array2;
use plotters::backend::{BitMapBackend, DrawingBackend, SVGBackend};
use plotters::chart::{ChartBuilder, ChartContext};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{BitMapElement, Circle, Polygon, Rectangle, Text};
use plotters::series::LineSeries;
use plotters::style::colors::{BLACK, RED, WHITE};
use plotters::style::{Color, IntoFont, RGBColor};

use std::error::Error;
use std::fmt;
use std::ops::Range;
use std::path::Path;

use crate::constants::{
    BAR_HALF_WIDTH, COLORBAR_GRADIENT_STEPS, COLORBAR_WIDTH, COLOR_BAR_MAIN, COLOR_LINE_MAIN,
    COLOR_POINT_MAIN, FONT_SIZE_AXIS_LABEL, FONT_SIZE_MESSAGE, FONT_SIZE_TICK_LABEL,
    FONT_SIZE_TITLE, LINE_WIDTH_PLOT, POINT_RADIUS_PX, SCATTER_RADIUS_PX, TITLE_LINE_HEIGHT_PX,
    TITLE_WRAP_WIDTH,
};
use crate::data_analysis::axis_scaling::format_g;
use crate::error::{PlotError, Result};

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Calculate plot range with padding.
/// Adds 5% padding, or a fixed padding for very small ranges.
pub fn calculate_range(min_val: f64, max_val: f64) -> (f64, f64) {
    let (min, max) = if min_val <= max_val {
        (min_val, max_val)
    } else {
        (max_val, min_val)
    };
    let range = (max - min).abs();
    let padding = if range < 1e-12 {
        if min == 0.0 {
            0.5
        } else {
            min.abs() * 0.05
        }
    } else {
        range * 0.05
    };
    (min - padding, max + padding)
}

/// Greedy word wrap, used for plot titles.
pub fn wrap_title(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Parses `#rrggbb`.
pub fn parse_hex_color(text: &str) -> Result<RGBColor> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Err(PlotError::InvalidArgument(format!("Invalid color '{text}'")));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| PlotError::InvalidArgument(format!("Invalid color '{text}'")))
    };
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

fn gradient_by_name(name: &str) -> Option<colorous::Gradient> {
    let gradient = match name.to_ascii_lowercase().as_str() {
        "viridis" => colorous::VIRIDIS,
        "inferno" => colorous::INFERNO,
        "magma" => colorous::MAGMA,
        "plasma" => colorous::PLASMA,
        "cividis" => colorous::CIVIDIS,
        "turbo" => colorous::TURBO,
        "cubehelix" => colorous::CUBEHELIX,
        "greys" => colorous::GREYS,
        "blues" => colorous::BLUES,
        "reds" => colorous::REDS,
        "spectral" => colorous::SPECTRAL,
        "rdbu" | "red_blue" => colorous::RED_BLUE,
        _ => return None,
    };
    Some(gradient)
}

/// A named continuous colormap, optionally resampled to a fixed number of colors.
#[derive(Clone)]
pub struct Colormap {
    name: String,
    gradient: colorous::Gradient,
    levels: Option<usize>,
}

impl fmt::Debug for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Colormap")
            .field("name", &self.name)
            .field("levels", &self.levels)
            .finish()
    }
}

impl PartialEq for Colormap {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.levels == other.levels
    }
}

impl Colormap {
    pub fn by_name(name: &str) -> Result<Self> {
        let gradient = gradient_by_name(name)
            .ok_or_else(|| PlotError::InvalidArgument(format!("Unknown colormap '{name}'")))?;
        Ok(Self {
            name: name.to_ascii_lowercase(),
            gradient,
            levels: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn levels(&self) -> Option<usize> {
        self.levels
    }

    /// Same colormap reduced to `levels` discrete colors.
    pub fn resampled(&self, levels: usize) -> Self {
        Self {
            levels: Some(levels.max(1)),
            ..self.clone()
        }
    }

    /// Color at position `t` in [0, 1].
    pub fn eval(&self, t: f64) -> RGBColor {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let t = match self.levels {
            Some(n) if n > 1 => {
                let bin = ((t * n as f64).floor() as usize).min(n - 1);
                bin as f64 / (n - 1) as f64
            }
            Some(_) => 0.0,
            None => t,
        };
        let color = self.gradient.eval_continuous(t);
        RGBColor(color.r, color.g, color.b)
    }
}

/// Label and tick formatting of one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub label: String,
    /// Tick values are multiplied by this before they are printed.
    pub tick_factor: f64,
    /// Labels for the integer positions of a text-valued axis.
    pub categories: Option<Vec<String>>,
}

impl Default for AxisSpec {
    fn default() -> Self {
        Self {
            label: String::new(),
            tick_factor: 1.0,
            categories: None,
        }
    }
}

impl AxisSpec {
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn format_tick(&self, value: f64) -> String {
        match &self.categories {
            Some(categories) => {
                let index = value.round();
                if (value - index).abs() < 1e-9 && index >= 0.0 {
                    categories.get(index as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            }
            None => format_g(value * self.tick_factor),
        }
    }
}

/// Values of a mesh layer, `z` has shape (len y, len x).
#[derive(Debug, Clone, PartialEq)]
pub struct MeshLayer {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Array2<f64>,
    pub rasterized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterLayer {
    pub points: Vec<(f64, f64, f64)>,
    pub rasterized: bool,
}

/// One drawn artist of a canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Line(Vec<(f64, f64)>),
    Points(Vec<(f64, f64)>),
    Bars(Vec<(f64, f64)>),
    Mesh(MeshLayer),
    ColorScatter(ScatterLayer),
}

impl Layer {
    pub fn is_rasterized(&self) -> bool {
        match self {
            Layer::Mesh(mesh) => mesh.rasterized,
            Layer::ColorScatter(scatter) => scatter.rasterized,
            _ => false,
        }
    }

    pub fn uses_colorbar(&self) -> bool {
        matches!(self, Layer::Mesh(_) | Layer::ColorScatter(_))
    }

    /// Values mapped through the colorbar.
    pub fn color_values(&self) -> Vec<f64> {
        match self {
            Layer::Mesh(mesh) => mesh.z.iter().copied().collect(),
            Layer::ColorScatter(scatter) => scatter.points.iter().map(|p| p.2).collect(),
            _ => Vec::new(),
        }
    }

    fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut b = Bounds::default();
        match self {
            Layer::Line(points) | Layer::Points(points) => {
                points.iter().for_each(|&(x, y)| b.add(x, y));
            }
            Layer::Bars(bars) => {
                for &(x, y) in bars {
                    b.add(x - BAR_HALF_WIDTH, 0.0);
                    b.add(x + BAR_HALF_WIDTH, y);
                }
            }
            Layer::Mesh(mesh) => {
                let xe = cell_edges(&mesh.x);
                let ye = cell_edges(&mesh.y);
                if let (Some(x0), Some(x1), Some(y0), Some(y1)) =
                    (xe.first(), xe.last(), ye.first(), ye.last())
                {
                    b.add(*x0, *y0);
                    b.add(*x1, *y1);
                }
            }
            Layer::ColorScatter(scatter) => {
                scatter.points.iter().for_each(|&(x, y, _)| b.add(x, y));
            }
        }
        b.get()
    }
}

#[derive(Default)]
struct Bounds(Option<(f64, f64, f64, f64)>);

impl Bounds {
    fn add(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.0 = Some(match self.0 {
            Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
            None => (x, x, y, y),
        });
    }

    fn get(&self) -> Option<(f64, f64, f64, f64)> {
        self.0
    }
}

/// Edges of the cells centered on `centers` (sorted ascending).
pub fn cell_edges(centers: &[f64]) -> Vec<f64> {
    match centers.len() {
        0 => Vec::new(),
        1 => vec![centers[0] - 0.5, centers[0] + 0.5],
        n => {
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centers[0] - (centers[1] - centers[0]) / 2.0);
            for w in centers.windows(2) {
                edges.push((w[0] + w[1]) / 2.0);
            }
            edges.push(centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0);
            edges
        }
    }
}

/// The drawing target of one plot: title, axes and drawn layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub title: String,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub layers: Vec<Layer>,
    pub size: (u32, u32),
}

impl Canvas {
    pub fn new(size: (u32, u32)) -> Self {
        Self {
            title: String::new(),
            x_axis: AxisSpec::default(),
            y_axis: AxisSpec::default(),
            layers: Vec::new(),
            size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn is_rasterized(&self) -> bool {
        self.layers.iter().any(Layer::is_rasterized)
    }

    /// Axis ranges covering every layer. Text-valued axes span their categories.
    pub fn data_ranges(&self) -> (Range<f64>, Range<f64>) {
        let mut b = Bounds::default();
        for (x0, x1, y0, y1) in self.layers.iter().filter_map(Layer::bounds) {
            b.add(x0, y0);
            b.add(x1, y1);
        }
        let (x0, x1, y0, y1) = b.get().unwrap_or((0.0, 1.0, 0.0, 1.0));
        let only_mesh = !self.layers.is_empty()
            && self.layers.iter().all(|l| matches!(l, Layer::Mesh(_)));

        let axis_range = |axis: &AxisSpec, lo: f64, hi: f64| -> Range<f64> {
            if let Some(categories) = &axis.categories {
                return -0.5..(categories.len().max(1) as f64 - 0.5);
            }
            if only_mesh && hi > lo {
                return lo..hi;
            }
            let (lo, hi) = calculate_range(lo, hi);
            lo..hi
        };
        (axis_range(&self.x_axis, x0, x1), axis_range(&self.y_axis, y0, y1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorbarExtend {
    #[default]
    Neither,
    Min,
    Max,
    Both,
}

/// Color scale shown next to a 2D canvas. It also defines how values of the
/// canvas' mesh and scatter layers are colored.
#[derive(Debug, Clone, PartialEq)]
pub struct Colorbar {
    pub axis: AxisSpec,
    pub vmin: f64,
    pub vmax: f64,
    pub colormap: Colormap,
    /// Explicit ticks, used for text-valued data.
    pub ticks: Option<Vec<(f64, String)>>,
    pub extend: ColorbarExtend,
    pub color_over: Option<RGBColor>,
    pub color_under: Option<RGBColor>,
}

impl Colorbar {
    pub fn new(colormap: Colormap, vmin: f64, vmax: f64) -> Self {
        Self {
            axis: AxisSpec::default(),
            vmin,
            vmax,
            colormap,
            ticks: None,
            extend: ColorbarExtend::Neither,
            color_over: None,
            color_under: None,
        }
    }

    /// Sets the limits to the finite extent of `values`.
    pub fn autoscale(&mut self, values: &[f64]) {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo <= hi {
            self.vmin = lo;
            self.vmax = hi;
        }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span.abs() < f64::EPSILON {
            0.0
        } else {
            (value - self.vmin) / span
        }
    }

    /// `None` for NaN, which stays transparent.
    pub fn color_for(&self, value: f64) -> Option<RGBColor> {
        if value.is_nan() {
            return None;
        }
        if value > self.vmax {
            return Some(self.color_over.unwrap_or_else(|| self.colormap.eval(1.0)));
        }
        if value < self.vmin {
            return Some(self.color_under.unwrap_or_else(|| self.colormap.eval(0.0)));
        }
        Some(self.colormap.eval(self.normalize(value)))
    }
}

/// Which layers a drawing pass emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawMode {
    All,
    VectorOnly,
    RasterOnly,
}

impl DrawMode {
    fn includes(&self, layer: &Layer) -> bool {
        match self {
            DrawMode::All => true,
            DrawMode::VectorOnly => !layer.is_rasterized(),
            DrawMode::RasterOnly => layer.is_rasterized(),
        }
    }
}

/// Draw a "Data Unavailable" message on a plot area.
pub fn draw_unavailable_message<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    reason: &str,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    const CHAR_WIDTH_RATIO: f32 = 0.6;

    let (width, height) = area.dim_in_pixel();
    let message = format!("Data Unavailable: {reason}");
    let estimated_text_width =
        (message.len() as f32 * FONT_SIZE_MESSAGE as f32 * CHAR_WIDTH_RATIO) as i32;
    let center_x = width as i32 / 2 - estimated_text_width / 2;
    let center_y = height as i32 / 2 - FONT_SIZE_MESSAGE / 2;

    let text_style = ("sans-serif", FONT_SIZE_MESSAGE).into_font().color(&RED);
    area.draw(&Text::new(message, (center_x, center_y), text_style))?;
    Ok(())
}

/// Splits off the title band and the colorbar column.
fn layout<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    canvas: &Canvas,
    with_colorbar: bool,
) -> (DrawingArea<DB, Shift>, Option<DrawingArea<DB, Shift>>) {
    let title_lines = wrap_title(&canvas.title, TITLE_WRAP_WIDTH).len() as u32;
    let top = (10 + title_lines * TITLE_LINE_HEIGHT_PX) as i32;
    let body = root.margin(top, 5, 5, 5);
    if with_colorbar {
        let (width, _) = body.dim_in_pixel();
        let (main, side) = body.split_horizontally(width.saturating_sub(COLORBAR_WIDTH) as i32);
        (main, Some(side))
    } else {
        (body, None)
    }
}

fn draw_title<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    for (i, line) in wrap_title(title, TITLE_WRAP_WIDTH).iter().enumerate() {
        root.draw(&Text::new(
            line.as_str(),
            (10, 10 + (i as u32 * TITLE_LINE_HEIGHT_PX) as i32),
            ("sans-serif", FONT_SIZE_TITLE).into_font().color(&BLACK),
        ))?;
    }
    Ok(())
}

fn build_chart<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    canvas: &Canvas,
) -> std::result::Result<Chart<'a, DB>, Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let (x_range, y_range) = canvas.data_ranges();
    let chart = ChartBuilder::on(area)
        .margin(5)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;
    Ok(chart)
}

fn draw_axes<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    canvas: &Canvas,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let x_labels = canvas.x_axis.categories.as_ref().map_or(10, |c| c.len() + 1);
    let y_labels = canvas.y_axis.categories.as_ref().map_or(10, |c| c.len() + 1);
    chart
        .configure_mesh()
        .x_desc(canvas.x_axis.label.as_str())
        .y_desc(canvas.y_axis.label.as_str())
        .x_labels(x_labels)
        .y_labels(y_labels)
        .x_label_formatter(&|x| canvas.x_axis.format_tick(*x))
        .y_label_formatter(&|y| canvas.y_axis.format_tick(*y))
        .light_line_style(WHITE.mix(0.7))
        .label_style(("sans-serif", FONT_SIZE_TICK_LABEL))
        .axis_desc_style(("sans-serif", FONT_SIZE_AXIS_LABEL))
        .draw()?;
    Ok(())
}

fn draw_layers<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    canvas: &Canvas,
    colorbar: Option<&Colorbar>,
    mode: DrawMode,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    for layer in canvas.layers.iter().filter(|l| mode.includes(l)) {
        match layer {
            Layer::Line(points) => {
                chart.draw_series(LineSeries::new(
                    points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()),
                    COLOR_LINE_MAIN.stroke_width(LINE_WIDTH_PLOT),
                ))?;
            }
            Layer::Points(points) => {
                chart.draw_series(
                    points
                        .iter()
                        .filter(|(x, y)| x.is_finite() && y.is_finite())
                        .map(|&p| Circle::new(p, POINT_RADIUS_PX, COLOR_POINT_MAIN.filled())),
                )?;
            }
            Layer::Bars(bars) => {
                chart.draw_series(bars.iter().filter(|(_, y)| y.is_finite()).map(|&(x, y)| {
                    Rectangle::new(
                        [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, y)],
                        COLOR_BAR_MAIN.filled(),
                    )
                }))?;
            }
            Layer::Mesh(mesh) => {
                let fallback;
                let colorbar = match colorbar {
                    Some(cb) => cb,
                    None => {
                        fallback = default_colorbar_for(layer);
                        &fallback
                    }
                };
                let xe = cell_edges(&mesh.x);
                let ye = cell_edges(&mesh.y);
                let mut cells = Vec::with_capacity(mesh.z.len());
                for ((row, col), &value) in mesh.z.indexed_iter() {
                    if let Some(color) = colorbar.color_for(value) {
                        cells.push(Rectangle::new(
                            [(xe[col], ye[row]), (xe[col + 1], ye[row + 1])],
                            color.filled(),
                        ));
                    }
                }
                chart.draw_series(cells)?;
            }
            Layer::ColorScatter(scatter) => {
                let fallback;
                let colorbar = match colorbar {
                    Some(cb) => cb,
                    None => {
                        fallback = default_colorbar_for(layer);
                        &fallback
                    }
                };
                chart.draw_series(scatter.points.iter().filter_map(|&(x, y, z)| {
                    colorbar
                        .color_for(z)
                        .map(|color| Circle::new((x, y), SCATTER_RADIUS_PX, color.filled()))
                }))?;
            }
        }
    }
    Ok(())
}

fn default_colorbar_for(layer: &Layer) -> Colorbar {
    let colormap = Colormap::by_name(crate::constants::DEFAULT_COLORMAP).unwrap_or(Colormap {
        name: "viridis".to_string(),
        gradient: colorous::VIRIDIS,
        levels: None,
    });
    let mut colorbar = Colorbar::new(colormap, 0.0, 1.0);
    colorbar.autoscale(&layer.color_values());
    colorbar
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    colorbar: &Colorbar,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let (lo, hi) = if colorbar.vmax > colorbar.vmin {
        (colorbar.vmin, colorbar.vmax)
    } else {
        (colorbar.vmin - 0.5, colorbar.vmin + 0.5)
    };
    let has_ticks = colorbar.ticks.is_some();

    let mut chart = ChartBuilder::on(area)
        .margin_top(25)
        .margin_bottom(55)
        .margin_left(5)
        .margin_right(5)
        .y_label_area_size(0)
        .right_y_label_area_size(95)
        .build_cartesian_2d(0.0..1.0, lo..hi)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc(colorbar.axis.label.as_str())
        .y_labels(if has_ticks { 0 } else { 8 })
        .y_label_formatter(&|v| colorbar.axis.format_tick(*v))
        .label_style(("sans-serif", FONT_SIZE_TICK_LABEL))
        .axis_desc_style(("sans-serif", FONT_SIZE_AXIS_LABEL))
        .draw()?;

    let step = (hi - lo) / COLORBAR_GRADIENT_STEPS as f64;
    chart.draw_series((0..COLORBAR_GRADIENT_STEPS).map(|i| {
        let y0 = lo + i as f64 * step;
        let t = (i as f64 + 0.5) / COLORBAR_GRADIENT_STEPS as f64;
        Rectangle::new([(0.0, y0), (1.0, y0 + step)], colorbar.colormap.eval(t).filled())
    }))?;

    let offset = area.get_base_pixel();
    if let Some(ticks) = &colorbar.ticks {
        for (position, label) in ticks {
            let (px, py) = chart.backend_coord(&(1.0, *position));
            area.draw(&Text::new(
                label.as_str(),
                (px - offset.0 + 6, py - offset.1 - FONT_SIZE_TICK_LABEL / 2),
                ("sans-serif", FONT_SIZE_TICK_LABEL).into_font().color(&BLACK),
            ))?;
        }
    }

    // Triangles marking values beyond the color range
    let (left, top) = chart.backend_coord(&(0.0, hi));
    let (right, bottom) = chart.backend_coord(&(1.0, lo));
    let (left, right) = (left - offset.0, right - offset.0);
    let (top, bottom) = (top - offset.1, bottom - offset.1);
    let tip = (right - left) / 2;
    if matches!(colorbar.extend, ColorbarExtend::Max | ColorbarExtend::Both) {
        let color = colorbar.color_over.unwrap_or_else(|| colorbar.colormap.eval(1.0));
        area.draw(&Polygon::new(
            vec![(left, top), (right, top), (left + tip, top - 18)],
            color.filled(),
        ))?;
    }
    if matches!(colorbar.extend, ColorbarExtend::Min | ColorbarExtend::Both) {
        let color = colorbar.color_under.unwrap_or_else(|| colorbar.colormap.eval(0.0));
        area.draw(&Polygon::new(
            vec![(left, bottom), (right, bottom), (left + tip, bottom + 18)],
            color.filled(),
        ))?;
    }
    Ok(())
}

/// Draws a canvas and its colorbar onto any plotters backend.
pub fn draw_canvas<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    canvas: &Canvas,
    colorbar: Option<&Colorbar>,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    draw_canvas_pass(root, canvas, colorbar, DrawMode::All).map(|_| ())
}

/// Returns the pixel rectangle of the plotting area.
fn draw_canvas_pass<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    canvas: &Canvas,
    colorbar: Option<&Colorbar>,
    mode: DrawMode,
) -> std::result::Result<(Range<i32>, Range<i32>), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    if mode != DrawMode::RasterOnly {
        root.fill(&WHITE)?;
        draw_title(root, &canvas.title)?;
    }
    let (main, side) = layout(root, canvas, colorbar.is_some());

    if canvas.is_empty() {
        if mode != DrawMode::RasterOnly {
            draw_unavailable_message(&main, "No data points")?;
        }
        return Ok((0..0, 0..0));
    }

    let mut chart = build_chart(&main, canvas)?;
    if mode != DrawMode::RasterOnly {
        draw_axes(&mut chart, canvas)?;
    }
    draw_layers(&mut chart, canvas, colorbar, mode)?;

    if mode != DrawMode::RasterOnly {
        if let (Some(area), Some(cb)) = (side, colorbar) {
            draw_colorbar(&area, cb)?;
        }
    }
    Ok(chart.plotting_area().get_pixel_range())
}

fn render_error(path: &Path, err: Box<dyn Error>) -> PlotError {
    PlotError::Render(format!("'{}': {err}", path.display()))
}

pub fn save_png(path: &Path, canvas: &Canvas, colorbar: Option<&Colorbar>) -> Result<()> {
    let root = BitMapBackend::new(path, canvas.size).into_drawing_area();
    draw_canvas(&root, canvas, colorbar).map_err(|e| render_error(path, e))?;
    root.present().map_err(|e| render_error(path, Box::new(e)))?;
    log::info!("  Plot saved as '{}'.", path.display());
    Ok(())
}

/// Writes an SVG. Rasterized layers are drawn to a bitmap first and embedded
/// as an image, everything else stays vector.
pub fn save_svg(path: &Path, canvas: &Canvas, colorbar: Option<&Colorbar>) -> Result<()> {
    let (width, height) = canvas.size;
    let raster = if canvas.is_rasterized() {
        let mut buffer = vec![255u8; (width * height * 3) as usize];
        let pixel_range = {
            let area = BitMapBackend::with_buffer(&mut buffer, canvas.size).into_drawing_area();
            let range = draw_canvas_pass(&area, canvas, colorbar, DrawMode::RasterOnly)
                .map_err(|e| render_error(path, e))?;
            area.present().map_err(|e| render_error(path, Box::new(e)))?;
            range
        };
        Some(crop_rgb(&buffer, width, pixel_range))
    } else {
        None
    };

    let root = SVGBackend::new(path, canvas.size).into_drawing_area();
    let mode = if raster.is_some() {
        DrawMode::VectorOnly
    } else {
        DrawMode::All
    };
    draw_canvas_pass(&root, canvas, colorbar, mode).map_err(|e| render_error(path, e))?;
    if let Some((origin, size, pixels)) = raster {
        let element: Option<BitMapElement<'_, (i32, i32)>> =
            BitMapElement::with_owned_buffer(origin, size, pixels);
        if let Some(element) = element {
            root.draw(&element).map_err(|e| render_error(path, Box::new(e)))?;
        }
    }
    root.present().map_err(|e| render_error(path, Box::new(e)))?;
    log::info!("  Plot saved as '{}'.", path.display());
    Ok(())
}

/// Cuts the plotting area out of an RGB buffer.
fn crop_rgb(
    buffer: &[u8],
    width: u32,
    (xr, yr): (Range<i32>, Range<i32>),
) -> ((i32, i32), (u32, u32), Vec<u8>) {
    let w = (xr.end - xr.start).max(0) as usize;
    let h = (yr.end - yr.start).max(0) as usize;
    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in yr.start..yr.end {
        let start = (row as usize * width as usize + xr.start as usize) * 3;
        pixels.extend_from_slice(&buffer[start..start + w * 3]);
    }
    ((xr.start, yr.start), (w as u32, h as u32), pixels)
}


// src/plot_framework.rs
