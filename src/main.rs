// src/main.rs

use clap::{Parser, Subcommand};
use env_logger::Env;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use instrplot::config::PlotSettings;
use instrplot::crate_version;
use instrplot::data_analysis::complex_split::{ComplexPlotType, PhaseUnit};
use instrplot::data_input::dataset::DatasetSource;
use instrplot::data_input::run_file::RunDirectory;
use instrplot::doc_attrs::attr_hook::{
    setup, AttrGetterTable, ParameterAttrHook, DEFAULT_INSTRUMENT_BASE,
};
use instrplot::doc_attrs::class_model::ClassRegistry;
use instrplot::plot_functions::{plot_dataset, save_canvases, PlotOptions};

#[derive(Parser)]
#[command(name = "instrplot")]
#[command(about = "Plot measurement runs and document instrument driver attributes")]
#[command(version = crate_version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plot a run and save its images
    Plot {
        /// Run id to load
        run_id: u64,

        /// Directory holding run_<id>.csv files
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,

        /// JSON settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Image root, overrides the settings' mainfolder
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip the PNG images
        #[arg(long)]
        no_png: bool,

        /// Skip the SVG images
        #[arg(long)]
        no_vector: bool,

        /// Keep raw tick values and units
        #[arg(long)]
        no_rescale: bool,

        /// Clip color scale outliers of 2D plots
        #[arg(long)]
        auto_color_scale: bool,

        /// Percentage that may be clipped from the top and the bottom
        #[arg(long, num_args = 2, value_names = ["TOP", "BOTTOM"])]
        cutoff_percentile: Option<Vec<f64>>,

        /// real_and_imag or mag_and_phase
        #[arg(long, default_value = "real_and_imag")]
        complex_plot_type: String,

        /// radians or degrees
        #[arg(long, default_value = "radians")]
        complex_plot_phase: String,

        /// Dependent parameters to plot (all when omitted)
        #[arg(long = "parameter")]
        parameters: Vec<String>,

        #[arg(long)]
        colormap: Option<String>,

        /// Force rasterization of 2D layers on or off
        #[arg(long)]
        rasterized: Option<bool>,
    },

    /// Resolve one attribute of an instrument class
    DocAttr {
        /// Class that owns the attribute
        class: String,

        attribute: String,

        /// Python files or directories to scan
        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,

        /// Value used when nothing else is found
        #[arg(long)]
        default: Option<String>,

        #[arg(long, default_value = DEFAULT_INSTRUMENT_BASE)]
        instrument_base: String,
    },

    /// List all constructor-assigned attributes of a class as JSON
    DocAttrs {
        class: String,

        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Plot {
            run_id,
            data_dir,
            settings,
            output,
            no_png,
            no_vector,
            no_rescale,
            auto_color_scale,
            cutoff_percentile,
            complex_plot_type,
            complex_plot_phase,
            parameters,
            colormap,
            rasterized,
        } => {
            let mut settings = PlotSettings::load(settings.as_deref())?;
            if let Some(output) = output {
                settings.mainfolder = output;
            }
            let options = PlotOptions {
                rescale_axes: !no_rescale,
                auto_color_scale: auto_color_scale.then_some(true),
                cutoff_percentile: cutoff_percentile.map(|c| (c[0], c[1])),
                complex_plot_type: complex_plot_type.parse::<ComplexPlotType>()?,
                complex_plot_phase: complex_plot_phase.parse::<PhaseUnit>()?,
                parameters: (!parameters.is_empty()).then_some(parameters),
                colormap,
                rasterized,
                canvas_size: None,
            };

            let source = RunDirectory::new(data_dir);
            let dataset = source.load_by_run_id(run_id)?;
            log::info!("Plotting {}", dataset.plot_title());
            let (canvases, colorbars) = plot_dataset(&dataset, None, None, &options, &settings)?;
            let files = save_canvases(&dataset, &canvases, &colorbars, !no_vector, !no_png, &settings)?;
            log::info!("Wrote {} images for run {run_id}", files.len());
        }

        Commands::DocAttr {
            class,
            attribute,
            sources,
            default,
            instrument_base,
        } => {
            let registry = ClassRegistry::from_paths(&sources)?;
            let hook = ParameterAttrHook::new(registry).with_instrument_base(instrument_base);
            let mut table = AttrGetterTable::default();
            let metadata = setup(&mut table, hook);
            log::debug!("Attribute hook registered: {}", serde_json::to_string(&metadata)?);
            println!("{}", table.get_attr(&class, &attribute, default.as_deref()));
        }

        Commands::DocAttrs { class, sources } => {
            let registry = ClassRegistry::from_paths(&sources)?;
            if !registry.contains(&class) {
                log::warn!("Class {class} not found in the given sources");
            }
            let hook = ParameterAttrHook::new(registry);
            let attributes: BTreeMap<String, String> = hook
                .constructor_attributes(&class)
                .into_iter()
                .map(|(name, placeholder)| (name, placeholder.to_string()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&attributes)?);
        }
    }

    Ok(())
}
