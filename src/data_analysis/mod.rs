// src/data_analysis/mod.rs

pub mod axis_scaling;
pub mod color_scale;
pub mod complex_split;
pub mod grid;
pub mod plot_type;

// src/data_analysis/mod.rs
