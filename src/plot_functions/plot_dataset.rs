// src/plot_functions/plot_dataset.rs

use crate::config::PlotSettings;
use crate::constants::TITLE_WRAP_WIDTH;
use crate::data_analysis::axis_scaling::make_rescaled_ticks_and_units;
use crate::data_analysis::color_scale::auto_color_scale_from_settings;
use crate::data_analysis::complex_split::{split_complex, ComplexPlotType, PhaseUnit};
use crate::data_input::dataset::{Dataset, DatasetSource};
use crate::data_input::plot_record::{PlotGroup, PlotRecord};
use crate::error::{PlotError, Result};
use crate::plot_framework::{wrap_title, AxisSpec, Canvas, Colorbar};
use crate::plot_functions::plot_1d::plot_1d;
use crate::plot_functions::plot_2d::{plot_2d, Render2dOptions};

/// Per-call plotting options. Everything left `None` falls back to the settings.
#[derive(Debug, Clone)]
pub struct PlotOptions {
    /// Rescale ticks and units of SI-unit axes, e.g. `0.00000005 V` to `50 nV`.
    pub rescale_axes: bool,
    pub auto_color_scale: Option<bool>,
    /// Maximal percentage clipped from (top, bottom) by the auto color scale.
    pub cutoff_percentile: Option<(f64, f64)>,
    pub complex_plot_type: ComplexPlotType,
    pub complex_plot_phase: PhaseUnit,
    /// Names of the dependent parameters to plot. `None` plots all.
    pub parameters: Option<Vec<String>>,
    pub colormap: Option<String>,
    pub rasterized: Option<bool>,
    /// Size of newly created canvases. Conflicts with supplied canvases.
    pub canvas_size: Option<(u32, u32)>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            rescale_axes: true,
            auto_color_scale: None,
            cutoff_percentile: None,
            complex_plot_type: ComplexPlotType::RealAndImag,
            complex_plot_phase: PhaseUnit::Radians,
            parameters: None,
            colormap: None,
            rasterized: None,
            canvas_size: None,
        }
    }
}

/// Canvases and their colorbars, index-aligned. 1D plots have no colorbar.
pub type CanvasesAndColorbars = (Vec<Canvas>, Vec<Option<Colorbar>>);

fn filter_parameters(
    dataset: &Dataset,
    groups: Vec<PlotGroup>,
    parameters: &[String],
) -> Result<Vec<PlotGroup>> {
    let dependents: Vec<&str> = dataset.dependent_parameters().map(|p| p.name.as_str()).collect();
    if let Some(unknown) = parameters.iter().find(|p| !dependents.contains(&p.as_str())) {
        return Err(PlotError::InvalidArgument(format!(
            "Invalid parameter(s) given. Received {parameters:?} (unknown '{unknown}') \
             but can only accept elements from {dependents:?}."
        )));
    }
    log::debug!("Plotting data for {parameters:?}.");
    Ok(groups
        .into_iter()
        .filter(|group| {
            group
                .last()
                .is_some_and(|dep| parameters.iter().any(|p| *p == dep.name))
        })
        .collect())
}

fn set_data_axes_labels(canvas: &mut Canvas, group: &PlotGroup, colorbar: Option<&mut Colorbar>) {
    canvas.x_axis.label = group[0].axis_label();
    canvas.y_axis.label = group[1].axis_label();
    if let (Some(cb), Some(z)) = (colorbar, group.get(2)) {
        cb.axis.label = z.axis_label();
    }
}

fn rescale_axis(axis: &mut AxisSpec, record: &PlotRecord, settings: &PlotSettings) {
    if record.data.is_text() {
        return;
    }
    let rescaled = make_rescaled_ticks_and_units(record, settings);
    axis.tick_factor = rescaled.factor;
    axis.label = rescaled.label;
}

fn rescale_ticks_and_units(
    canvas: &mut Canvas,
    group: &PlotGroup,
    colorbar: Option<&mut Colorbar>,
    settings: &PlotSettings,
) {
    rescale_axis(&mut canvas.x_axis, &group[0], settings);
    rescale_axis(&mut canvas.y_axis, &group[1], settings);
    if let (Some(cb), Some(z)) = (colorbar, group.get(2)) {
        rescale_axis(&mut cb.axis, z, settings);
    }
}

/// Constructs one canvas per plot group of `dataset`.
///
/// Groups with one setpoint become line, point or bar plots, groups with two
/// setpoints heatmaps or color scatters. Larger groups are skipped with a
/// warning and keep an empty canvas. Supplied canvases and colorbars are
/// reused in order; the returned lists always have the same length.
pub fn plot_dataset(
    dataset: &Dataset,
    canvases: Option<Vec<Canvas>>,
    colorbars: Option<Vec<Option<Colorbar>>>,
    options: &PlotOptions,
    settings: &PlotSettings,
) -> Result<CanvasesAndColorbars> {
    let title = dataset.plot_title();

    let groups = dataset.plot_groups()?;
    let groups = match &options.parameters {
        Some(parameters) => filter_parameters(dataset, groups, parameters)?,
        None => {
            log::debug!("No data specified - plotting all.");
            groups
        }
    };
    let groups = split_complex(&groups, options.complex_plot_type, options.complex_plot_phase);
    let nplots = groups.len();

    let mut canvases = match canvases {
        Some(canvases) => {
            if let Some(size) = options.canvas_size {
                return Err(PlotError::InvalidArgument(format!(
                    "You cannot provide arguments for the canvas creation if you supply \
                     your own canvases. Provided canvas size: {size:?}"
                )));
            }
            if canvases.len() != nplots {
                return Err(PlotError::InvalidArgument(match &options.parameters {
                    Some(parameters) => format!(
                        "Trying to plot {} parameters but received {} canvases.",
                        parameters.len(),
                        canvases.len()
                    ),
                    None => format!(
                        "Trying to make {nplots} plots, but received {} canvases.",
                        canvases.len()
                    ),
                }));
            }
            canvases
        }
        None => {
            let size = options.canvas_size.unwrap_or(settings.canvas_size);
            (0..nplots).map(|_| Canvas::new(size)).collect()
        }
    };

    let colorbars = match colorbars {
        Some(colorbars) if colorbars.len() != canvases.len() => {
            return Err(PlotError::InvalidArgument(format!(
                "Received {} colorbars for {} canvases.",
                colorbars.len(),
                canvases.len()
            )));
        }
        Some(colorbars) => colorbars,
        None => vec![None; canvases.len()],
    };

    let render_options = Render2dOptions {
        colormap: options.colormap.as_deref(),
        rasterized: options.rasterized,
    };
    let wrapped_title = wrap_title(&title, TITLE_WRAP_WIDTH).join("\n");
    let mut new_colorbars: Vec<Option<Colorbar>> = Vec::with_capacity(nplots);

    for ((group, canvas), colorbar) in groups.iter().zip(canvases.iter_mut()).zip(colorbars) {
        match group.as_slice() {
            [x, y] => {
                log::debug!("Doing a 1D plot of '{}' vs '{}'", y.name, x.name);
                plot_1d(x, y, canvas)?;
                set_data_axes_labels(canvas, group, None);
                if options.rescale_axes {
                    rescale_ticks_and_units(canvas, group, None, settings);
                }
                new_colorbars.push(None);
                canvas.title = wrapped_title.clone();
            }
            [x, y, z] => {
                log::debug!("Doing a 2D plot of '{}' vs ('{}', '{}')", z.name, x.name, y.name);
                let (_, mut colorbar) = plot_2d([x, y, z], canvas, colorbar, render_options, settings)?;
                set_data_axes_labels(canvas, group, Some(&mut colorbar));
                if options.rescale_axes {
                    rescale_ticks_and_units(canvas, group, Some(&mut colorbar), settings);
                }
                if !z.data.is_text() {
                    let values = canvas
                        .layers
                        .last()
                        .map(|layer| layer.color_values())
                        .unwrap_or_default();
                    auto_color_scale_from_settings(
                        Some(&mut colorbar),
                        options.auto_color_scale,
                        &values,
                        options.cutoff_percentile,
                        settings,
                    )?;
                }
                new_colorbars.push(Some(colorbar));
                canvas.title = wrapped_title.clone();
            }
            _ => {
                let name = group.last().map(|r| r.name.as_str()).unwrap_or("");
                log::warn!(
                    "Multi-dimensional data encountered. parameter {name} depends on {} \
                     parameters, cannot plot that.",
                    group.len().saturating_sub(1)
                );
                new_colorbars.push(None);
            }
        }
    }

    if canvases.len() != new_colorbars.len() {
        return Err(PlotError::Internal(
            "Non equal number of canvases. Perhaps colorbar is missing from one of the cases above"
                .to_string(),
        ));
    }
    Ok((canvases, new_colorbars))
}

/// Loads run `run_id` from `source` and plots it with [`plot_dataset`].
pub fn plot_by_id(
    source: &dyn DatasetSource,
    run_id: u64,
    canvases: Option<Vec<Canvas>>,
    colorbars: Option<Vec<Option<Colorbar>>>,
    options: &PlotOptions,
    settings: &PlotSettings,
) -> Result<CanvasesAndColorbars> {
    let dataset = source.load_by_run_id(run_id)?;
    plot_dataset(&dataset, canvases, colorbars, options, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_input::dataset::ParamSpec;
    use crate::data_input::plot_record::RecordData;
    use crate::plot_framework::Layer;
    use num_complex::Complex64;

    fn spec(name: &str, unit: &str, deps: &[&str]) -> ParamSpec {
        ParamSpec {
            name: name.to_string(),
            label: String::new(),
            unit: unit.to_string(),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn dataset() -> Dataset {
        let mut ds = Dataset {
            run_id: 12,
            exp_name: "gate_sweep".into(),
            sample_name: "device_a".into(),
            parameters: vec![
                spec("gate", "V", &[]),
                spec("bias", "V", &[]),
                spec("current", "A", &["gate"]),
                spec("conductance", "S", &["gate", "bias"]),
            ],
            ..Default::default()
        };
        ds.columns.insert("gate".into(), RecordData::numeric(vec![0.0, 0.0, 5e-8, 5e-8]));
        ds.columns.insert("bias".into(), RecordData::numeric(vec![0.0, 1.0, 0.0, 1.0]));
        ds.columns.insert("current".into(), RecordData::numeric(vec![1e-9, 2e-9, 3e-9, 4e-9]));
        ds.columns.insert("conductance".into(), RecordData::numeric(vec![1.0, 2.0, 3.0, 4.0]));
        ds
    }

    #[test]
    fn test_one_canvas_per_dependent() {
        let (canvases, colorbars) =
            plot_dataset(&dataset(), None, None, &PlotOptions::default(), &PlotSettings::default()).unwrap();
        assert_eq!(canvases.len(), 2);
        assert_eq!(colorbars.len(), 2);
        assert!(colorbars[0].is_none());
        assert!(colorbars[1].is_some());
        assert_eq!(canvases[0].title, "Run #12, Experiment gate_sweep (device_a)");
    }

    #[test]
    fn test_axes_are_rescaled() {
        let (canvases, colorbars) =
            plot_dataset(&dataset(), None, None, &PlotOptions::default(), &PlotSettings::default()).unwrap();
        assert_eq!(canvases[0].x_axis.label, "gate (nV)");
        assert_eq!(canvases[0].x_axis.format_tick(5e-8), "50");
        assert_eq!(canvases[0].y_axis.label, "current (nA)");
        let cb = colorbars[1].as_ref().unwrap();
        assert_eq!(cb.axis.label, "conductance (S)");
    }

    #[test]
    fn test_rescaling_can_be_disabled() {
        let options = PlotOptions {
            rescale_axes: false,
            ..Default::default()
        };
        let (canvases, _) = plot_dataset(&dataset(), None, None, &options, &PlotSettings::default()).unwrap();
        assert_eq!(canvases[0].x_axis.label, "gate (V)");
        assert_eq!(canvases[0].x_axis.tick_factor, 1.0);
    }

    #[test]
    fn test_parameter_filter() {
        let options = PlotOptions {
            parameters: Some(vec!["conductance".into()]),
            ..Default::default()
        };
        let (canvases, colorbars) = plot_dataset(&dataset(), None, None, &options, &PlotSettings::default()).unwrap();
        assert_eq!(canvases.len(), 1);
        assert!(colorbars[0].is_some());

        let options = PlotOptions {
            parameters: Some(vec!["gate".into()]),
            ..Default::default()
        };
        let result = plot_dataset(&dataset(), None, None, &options, &PlotSettings::default());
        assert!(matches!(result, Err(PlotError::InvalidArgument(_))));
    }

    #[test]
    fn test_canvas_count_must_match() {
        let canvases = vec![Canvas::new((100, 100))];
        let result = plot_dataset(&dataset(), Some(canvases), None, &PlotOptions::default(), &PlotSettings::default());
        assert!(matches!(result, Err(PlotError::InvalidArgument(_))));
    }

    #[test]
    fn test_canvases_and_creation_options_conflict() {
        let canvases = vec![Canvas::new((100, 100)), Canvas::new((100, 100))];
        let options = PlotOptions {
            canvas_size: Some((200, 200)),
            ..Default::default()
        };
        let result = plot_dataset(&dataset(), Some(canvases), None, &options, &PlotSettings::default());
        assert!(matches!(result, Err(PlotError::InvalidArgument(_))));
    }

    #[test]
    fn test_supplied_canvases_are_filled() {
        let canvases = vec![Canvas::new((320, 240)), Canvas::new((320, 240))];
        let colorbars = vec![None, None];
        let (canvases, _) =
            plot_dataset(&dataset(), Some(canvases), Some(colorbars), &PlotOptions::default(), &PlotSettings::default())
                .unwrap();
        assert_eq!(canvases[1].size, (320, 240));
        assert!(matches!(canvases[1].layers[0], Layer::Mesh(_)));

        let result = plot_dataset(
            &dataset(),
            None,
            Some(vec![None]),
            &PlotOptions::default(),
            &PlotSettings::default(),
        );
        assert!(matches!(result, Err(PlotError::InvalidArgument(_))));
    }

    #[test]
    fn test_complex_dependent_gives_two_plots() {
        let mut ds = Dataset {
            run_id: 1,
            exp_name: "e".into(),
            sample_name: "s".into(),
            parameters: vec![spec("f", "Hz", &[]), spec("s21", "", &["f"])],
            ..Default::default()
        };
        ds.columns.insert("f".into(), RecordData::numeric(vec![1.0, 2.0, 3.0]));
        ds.columns.insert(
            "s21".into(),
            RecordData::complex(vec![
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 1.0),
                Complex64::new(-1.0, 0.0),
            ]),
        );
        let options = PlotOptions {
            complex_plot_type: ComplexPlotType::MagAndPhase,
            ..Default::default()
        };
        let (canvases, colorbars) = plot_dataset(&ds, None, None, &options, &PlotSettings::default()).unwrap();
        assert_eq!(canvases.len(), 2);
        assert_eq!(colorbars, vec![None, None]);
        assert!(canvases[1].y_axis.label.ends_with("(rad)"));
    }

    #[test]
    fn test_three_setpoints_are_skipped() {
        let mut ds = Dataset {
            run_id: 2,
            parameters: vec![
                spec("a", "", &[]),
                spec("b", "", &[]),
                spec("c", "", &[]),
                spec("d", "", &["a", "b", "c"]),
            ],
            ..Default::default()
        };
        for name in ["a", "b", "c", "d"] {
            ds.columns.insert(name.into(), RecordData::numeric(vec![1.0, 2.0]));
        }
        let (canvases, colorbars) =
            plot_dataset(&ds, None, None, &PlotOptions::default(), &PlotSettings::default()).unwrap();
        assert_eq!(canvases.len(), 1);
        assert!(canvases[0].is_empty());
        assert_eq!(colorbars, vec![None]);
    }

    #[test]
    fn test_auto_color_scale_per_call() {
        let mut ds = dataset();
        ds.columns.insert("conductance".into(), RecordData::numeric(vec![1.0, 2.0, 3.0, 400.0]));
        let options = PlotOptions {
            auto_color_scale: Some(true),
            parameters: Some(vec!["conductance".into()]),
            ..Default::default()
        };
        let (_, colorbars) = plot_dataset(&ds, None, None, &options, &PlotSettings::default()).unwrap();
        let cb = colorbars[0].as_ref().unwrap();
        assert!(cb.vmax < 400.0);
        assert!(cb.color_over.is_some());
    }
}

// src/plot_functions/plot_dataset.rs
