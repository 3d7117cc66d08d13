// src/lib.rs - Library interface for internal module access

pub mod config;
pub mod constants;
pub mod data_analysis;
pub mod data_input;
pub mod doc_attrs;
pub mod error;
pub mod plot_framework;
pub mod plot_functions;

pub use error::{PlotError, Result};

// Crate version, as shown by the command line tool.
pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
