// src/constants.rs

use plotters::style::colors::full_palette::BLUE_700;
use plotters::style::RGBColor;

// Plot dimensions for a newly created canvas.
pub const PLOT_WIDTH: u32 = 1280;
pub const PLOT_HEIGHT: u32 = 960;

// Width in pixels reserved on the right of a canvas for its colorbar.
pub const COLORBAR_WIDTH: u32 = 150;
// Number of gradient steps drawn inside a colorbar.
pub const COLORBAR_GRADIENT_STEPS: usize = 256;

// Font sizes
pub const FONT_SIZE_TITLE: i32 = 22;
pub const FONT_SIZE_AXIS_LABEL: i32 = 18;
pub const FONT_SIZE_TICK_LABEL: i32 = 14;
pub const FONT_SIZE_MESSAGE: i32 = 20;

// Title is wrapped like a paragraph at this many columns.
pub const TITLE_WRAP_WIDTH: usize = 70;
pub const TITLE_LINE_HEIGHT_PX: u32 = 28;

// Colormap used when neither the call nor the settings name one.
pub const DEFAULT_COLORMAP: &str = "viridis";

// Above this many points scatter plots and meshes are rasterized in vector output.
pub const DEFAULT_RASTERIZE_THRESHOLD: usize = 5000;

// Percentiles clipped on (top, bottom) by the automatic color scale.
pub const DEFAULT_CUTOFF_PERCENTILE: (f64, f64) = (50.0, 50.0);
pub const DEFAULT_COLOR_OVER: &str = "#ff00ff";
pub const DEFAULT_COLOR_UNDER: &str = "#00ffff";

// Relative tolerance used when comparing setpoints (numpy.allclose defaults).
pub const SETPOINT_RTOL: f64 = 1e-5;
pub const SETPOINT_ATOL: f64 = 1e-8;

// Units that get an SI prefix instead of a power-of-ten factor when rescaled.
pub const SI_UNITS_FOR_RESCALING: [&str; 17] = [
    "V", "A", "s", "Hz", "W", "T", "F", "H", "J", "C", "N", "Pa", "S", "Ω", "Ohm", "m", "g",
];

// --- Plot Color Assignments ---
pub const COLOR_LINE_MAIN: &RGBColor = &BLUE_700;
pub const COLOR_POINT_MAIN: &RGBColor = &BLUE_700;
pub const COLOR_BAR_MAIN: &RGBColor = &BLUE_700;

// Stroke widths and marker sizes
pub const LINE_WIDTH_PLOT: u32 = 2;
pub const POINT_RADIUS_PX: u32 = 4;
pub const SCATTER_RADIUS_PX: u32 = 5;

// Half width of a bar around its categorical position.
pub const BAR_HALF_WIDTH: f64 = 0.4;

// Extension metadata reported by the documentation hook.
pub const DOC_EXTENSION_VERSION: &str = "0.1";

// Names used in run directories.
pub const RUN_FILE_PREFIX: &str = "run_";
pub const RUN_FILE_EXTENSION: &str = "csv";

// src/constants.rs
