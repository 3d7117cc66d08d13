// src/plot_functions/mod.rs

pub mod plot_1d;
pub mod plot_2d;
pub mod plot_dataset;
pub mod save_images;

pub use plot_dataset::{plot_by_id, plot_dataset, PlotOptions};
pub use save_images::{plot_and_save_image, save_canvases};

// src/plot_functions/mod.rs
