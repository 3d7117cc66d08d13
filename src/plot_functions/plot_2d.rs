// src/plot_functions/plot_2d.rs

use ndarray::Array2;

use crate::config::PlotSettings;
use crate::data_analysis::grid::{clip_nan_from_shaped_data, reshape_2d_data, AxisValues};
use crate::data_analysis::plot_type::{get_2d_plottype, PlotType};
use crate::data_input::plot_record::PlotRecord;
use crate::error::{PlotError, Result};
use crate::plot_framework::{
    AxisSpec, Canvas, Colorbar, ColorbarExtend, Colormap, Layer, MeshLayer, ScatterLayer,
};

/// Rendering choices shared by the mesh and scatter paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct Render2dOptions<'a> {
    /// Overrides both the settings' default and the colormap of a reused colorbar.
    pub colormap: Option<&'a str>,
    /// Overrides the point-count threshold.
    pub rasterized: Option<bool>,
}

fn shaped_values(values: &AxisValues, shape: &[usize]) -> Result<Array2<f64>> {
    Array2::from_shape_vec((shape[0], shape[1]), values.values.clone())
        .map_err(|e| PlotError::Internal(format!("Cannot lay out gridded data: {e}")))
}

/// Puts the three records on a rectilinear grid: `(x centers, y centers, z)`
/// with `z` of shape (len y, len x).
fn grid_layout(
    records: [&PlotRecord; 3],
    values: [&AxisValues; 3],
) -> Result<(Vec<f64>, Vec<f64>, Array2<f64>)> {
    let [x, y, z] = records;
    let [xs, ys, zs] = values;

    let shape = z.data.shape();
    let all_2d = shape.len() == 2 && records.iter().all(|r| r.data.shape() == shape);
    if z.shape.is_some() && all_2d {
        let xg = shaped_values(xs, &shape)?;
        let yg = shaped_values(ys, &shape)?;
        let zg = shaped_values(zs, &shape)?;
        return Ok(clip_nan_from_shaped_data(&xg, &yg, &zg));
    }

    log::debug!(
        "Reshaping {} points of '{}' vs ('{}', '{}') onto a grid",
        zs.values.len(),
        z.name,
        x.name,
        y.name
    );
    Ok(reshape_2d_data(&xs.values, &ys.values, &zs.values))
}

/// Starts from the reused colorbar, if any, with everything data-dependent reset.
fn prepare_colorbar(
    colorbar: Option<Colorbar>,
    colormap: Option<&str>,
    settings: &PlotSettings,
) -> Result<Colorbar> {
    let base = match (colormap, &colorbar) {
        (Some(name), _) => Colormap::by_name(name)?,
        (None, Some(existing)) => Colormap::by_name(existing.colormap.name())?,
        (None, None) => Colormap::by_name(&settings.default_colormap)?,
    };
    Ok(match colorbar {
        Some(mut existing) => {
            existing.axis = AxisSpec::default();
            existing.colormap = base;
            existing.ticks = None;
            existing.extend = ColorbarExtend::Neither;
            existing.color_over = None;
            existing.color_under = None;
            existing
        }
        None => Colorbar::new(base, 0.0, 1.0),
    })
}

/// Draws a dependent record against two setpoints and returns the plot type
/// together with the colorbar describing it.
///
/// Grid-like data (or any data carrying grid shape metadata) becomes a mesh,
/// everything else a color-coded scatter. A supplied colorbar is reused.
pub fn plot_2d(
    records: [&PlotRecord; 3],
    canvas: &mut Canvas,
    colorbar: Option<Colorbar>,
    options: Render2dOptions<'_>,
    settings: &PlotSettings,
) -> Result<(PlotType, Colorbar)> {
    let [x, y, z] = records;
    let xs = AxisValues::from_record_data(&x.data);
    let ys = AxisValues::from_record_data(&y.data);
    let zs = AxisValues::from_record_data(&z.data);

    let plottype = if z.shape.is_some() {
        PlotType::Grid2D
    } else {
        get_2d_plottype(&xs.values, &ys.values)
    };
    log::debug!("Determined plottype: {plottype}");

    let layer = if plottype.is_mesh() {
        let (gx, gy, gz) = grid_layout(records, [&xs, &ys, &zs])?;
        let num_points = gx.len() * gy.len();
        Layer::Mesh(MeshLayer {
            x: gx,
            y: gy,
            z: gz,
            rasterized: options
                .rasterized
                .unwrap_or(num_points > settings.rasterize_threshold),
        })
    } else {
        let points: Vec<(f64, f64, f64)> = xs
            .values
            .iter()
            .zip(&ys.values)
            .zip(&zs.values)
            .map(|((&a, &b), &c)| (a, b, c))
            .collect();
        let rasterized = options
            .rasterized
            .unwrap_or(points.len() > settings.rasterize_threshold);
        Layer::ColorScatter(ScatterLayer { points, rasterized })
    };

    let mut colorbar = prepare_colorbar(colorbar, options.colormap, settings)?;
    colorbar.autoscale(&layer.color_values());

    if let Some(categories) = &zs.categories {
        let n = categories.len();
        colorbar.colormap = colorbar.colormap.resampled(n);
        colorbar.vmin = 0.0;
        colorbar.vmax = n.saturating_sub(1) as f64;
        let f = n.saturating_sub(1) as f64 / n.max(1) as f64;
        colorbar.ticks = Some(
            categories
                .iter()
                .enumerate()
                .map(|(i, label)| ((i as f64 + 0.5) * f, label.clone()))
                .collect(),
        );
    }

    if xs.is_categorical() {
        canvas.x_axis.categories = xs.categories;
    }
    if ys.is_categorical() {
        canvas.y_axis.categories = ys.categories;
    }
    canvas.layers.push(layer);
    Ok((plottype, colorbar))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_input::plot_record::RecordData;
    use ndarray::array;

    fn record(name: &str, values: Vec<f64>) -> PlotRecord {
        PlotRecord::new(name, "", "", RecordData::numeric(values))
    }

    fn plot(
        x: &PlotRecord,
        y: &PlotRecord,
        z: &PlotRecord,
        colorbar: Option<Colorbar>,
    ) -> (Canvas, PlotType, Colorbar) {
        let mut canvas = Canvas::new((400, 300));
        let (plottype, cb) = plot_2d(
            [x, y, z],
            &mut canvas,
            colorbar,
            Render2dOptions::default(),
            &PlotSettings::default(),
        )
        .unwrap();
        (canvas, plottype, cb)
    }

    #[test]
    fn test_full_grid_becomes_mesh() {
        let x = record("x", vec![0.0, 0.0, 1.0, 1.0]);
        let y = record("y", vec![0.0, 1.0, 0.0, 1.0]);
        let z = record("z", vec![1.0, 2.0, 3.0, 4.0]);
        let (canvas, plottype, cb) = plot(&x, &y, &z, None);
        assert_eq!(plottype, PlotType::Equidistant2D);
        match &canvas.layers[0] {
            Layer::Mesh(mesh) => {
                assert_eq!(mesh.x, vec![0.0, 1.0]);
                assert_eq!(mesh.y, vec![0.0, 1.0]);
                assert_eq!(mesh.z, array![[1.0, 3.0], [2.0, 4.0]]);
                assert!(!mesh.rasterized);
            }
            other => panic!("expected a mesh, got {other:?}"),
        }
        assert_eq!((cb.vmin, cb.vmax), (1.0, 4.0));
        assert_eq!(cb.colormap.name(), "viridis");
    }

    #[test]
    fn test_scattered_points_become_scatter() {
        let x = record("x", vec![0.0, 0.3, 1.7]);
        let y = record("y", vec![0.5, 1.1, 0.2]);
        let z = record("z", vec![1.0, 2.0, 3.0]);
        let (canvas, plottype, _) = plot(&x, &y, &z, None);
        assert_eq!(plottype, PlotType::Unknown2D);
        assert!(matches!(canvas.layers[0], Layer::ColorScatter(_)));
    }

    #[test]
    fn test_rasterized_above_threshold() {
        let n = 80;
        let mut xv = Vec::new();
        let mut yv = Vec::new();
        for i in 0..n {
            for j in 0..n {
                xv.push(i as f64);
                yv.push(j as f64);
            }
        }
        let zv: Vec<f64> = (0..n * n).map(|v| v as f64).collect();
        let (canvas, _, _) = plot(&record("x", xv), &record("y", yv), &record("z", zv), None);
        assert!(canvas.is_rasterized());
    }

    #[test]
    fn test_shaped_data_clips_unmeasured_rows() {
        let nan = f64::NAN;
        let x = record("x", vec![0.0, 0.0, 1.0, 1.0, nan, nan]).with_shape(vec![3, 2]);
        let y = record("y", vec![0.0, 1.0, 0.0, 1.0, nan, nan]).with_shape(vec![3, 2]);
        let z = record("z", vec![1.0, 2.0, 3.0, 4.0, nan, nan]).with_shape(vec![3, 2]);
        let [x, y, z] = [x, y, z].map(|mut r| {
            r.data = r.data.reshaped_padded(&[3, 2]).unwrap();
            r
        });
        let (canvas, plottype, _) = plot(&x, &y, &z, None);
        assert_eq!(plottype, PlotType::Grid2D);
        match &canvas.layers[0] {
            Layer::Mesh(mesh) => {
                assert_eq!(mesh.x, vec![0.0, 1.0]);
                assert_eq!(mesh.z.dim(), (2, 2));
            }
            other => panic!("expected a mesh, got {other:?}"),
        }
    }

    #[test]
    fn test_text_values_get_categorical_colorbar() {
        let x = record("x", vec![0.0, 0.0, 1.0, 1.0]);
        let y = record("y", vec![0.0, 1.0, 0.0, 1.0]);
        let z = PlotRecord::new("state", "", "", RecordData::text(vec!["a", "b", "c", "a"]));
        let (_, _, cb) = plot(&x, &y, &z, None);
        assert_eq!(cb.colormap.levels(), Some(3));
        assert_eq!((cb.vmin, cb.vmax), (0.0, 2.0));
        let ticks = cb.ticks.unwrap();
        let positions: Vec<f64> = ticks.iter().map(|t| t.0).collect();
        let expected = [0.5 * 2.0 / 3.0, 1.5 * 2.0 / 3.0, 2.5 * 2.0 / 3.0];
        for (p, e) in positions.iter().zip(expected) {
            assert!((p - e).abs() < 1e-12);
        }
        assert_eq!(ticks[1].1, "b");
    }

    #[test]
    fn test_reused_colorbar_keeps_colormap() {
        let x = record("x", vec![0.0, 0.0, 1.0, 1.0]);
        let y = record("y", vec![0.0, 1.0, 0.0, 1.0]);
        let z = record("z", vec![5.0, 6.0, 7.0, 8.0]);
        let mut existing = Colorbar::new(Colormap::by_name("magma").unwrap(), -1.0, 1.0);
        existing.extend = ColorbarExtend::Both;
        let (_, _, cb) = plot(&x, &y, &z, Some(existing));
        assert_eq!(cb.colormap.name(), "magma");
        assert_eq!(cb.extend, ColorbarExtend::Neither);
        assert_eq!((cb.vmin, cb.vmax), (5.0, 8.0));
    }

    #[test]
    fn test_unknown_colormap_is_rejected() {
        let x = record("x", vec![0.0, 1.0]);
        let y = record("y", vec![0.0, 1.0]);
        let z = record("z", vec![0.0, 1.0]);
        let mut canvas = Canvas::new((400, 300));
        let options = Render2dOptions {
            colormap: Some("no_such_map"),
            rasterized: None,
        };
        let result = plot_2d([&x, &y, &z], &mut canvas, None, options, &PlotSettings::default());
        assert!(matches!(result, Err(PlotError::InvalidArgument(_))));
    }
}

// src/plot_functions/plot_2d.rs
