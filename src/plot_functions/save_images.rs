// src/plot_functions/save_images.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PlotSettings;
use crate::data_input::dataset::Dataset;
use crate::error::Result;
use crate::plot_framework::{save_png, save_svg, Canvas, Colorbar};
use crate::plot_functions::plot_dataset::{plot_dataset, PlotOptions};

/// Vector images keep the `pdf` slot of the storage layout but are written
/// as SVG.
pub const VECTOR_DIR: &str = "pdf";
pub const VECTOR_EXT: &str = "svg";
pub const PNG_DIR: &str = "png";
pub const PNG_EXT: &str = "png";

/// `{root}/{exp}/{sample}`, the directory images of a dataset are stored under.
pub fn storage_dir(root: &Path, dataset: &Dataset) -> PathBuf {
    root.join(&dataset.exp_name).join(&dataset.sample_name)
}

/// `{storage}/{dir}/{run_id}_{index}.{ext}`
pub fn image_path(storage: &Path, dir: &str, ext: &str, run_id: u64, index: usize) -> PathBuf {
    storage.join(dir).join(format!("{run_id}_{index}.{ext}"))
}

/// Everything [`plot_and_save_image`] produced.
#[derive(Debug)]
pub struct SavedImages {
    pub canvases: Vec<Canvas>,
    pub colorbars: Vec<Option<Colorbar>>,
    pub files: Vec<PathBuf>,
}

/// Writes already plotted canvases of `dataset` below `settings.mainfolder`
/// and returns the written files.
///
/// Both format directories are created even when only one format is written.
pub fn save_canvases(
    dataset: &Dataset,
    canvases: &[Canvas],
    colorbars: &[Option<Colorbar>],
    save_vector: bool,
    save_png_image: bool,
    settings: &PlotSettings,
) -> Result<Vec<PathBuf>> {
    let storage = storage_dir(&settings.mainfolder, dataset);
    fs::create_dir_all(storage.join(PNG_DIR))?;
    fs::create_dir_all(storage.join(VECTOR_DIR))?;

    let mut files = Vec::new();
    for (index, (canvas, colorbar)) in canvases.iter().zip(colorbars).enumerate() {
        if save_vector {
            let path = image_path(&storage, VECTOR_DIR, VECTOR_EXT, dataset.run_id, index);
            save_svg(&path, canvas, colorbar.as_ref())?;
            files.push(path);
        }
        if save_png_image {
            let path = image_path(&storage, PNG_DIR, PNG_EXT, dataset.run_id, index);
            save_png(&path, canvas, colorbar.as_ref())?;
            files.push(path);
        }
    }
    log::debug!("Saved {} images of run {}", files.len(), dataset.run_id);
    Ok(files)
}

/// Plots `dataset` with default options and saves every canvas as a vector
/// image and/or PNG.
pub fn plot_and_save_image(
    dataset: &Dataset,
    save_vector: bool,
    save_png_image: bool,
    settings: &PlotSettings,
) -> Result<SavedImages> {
    let (canvases, colorbars) = plot_dataset(dataset, None, None, &PlotOptions::default(), settings)?;
    let files = save_canvases(dataset, &canvases, &colorbars, save_vector, save_png_image, settings)?;
    Ok(SavedImages {
        canvases,
        colorbars,
        files,
    })
}


// src/plot_functions/save_images.rs
