// src/data_input/mod.rs

pub mod dataset;
pub mod plot_record;
pub mod run_file;

// src/data_input/mod.rs
