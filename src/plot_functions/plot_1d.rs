// src/plot_functions/plot_1d.rs

use crate::data_analysis::grid::AxisValues;
use crate::data_analysis::plot_type::{get_1d_plottype, PlotType};
use crate::data_input::plot_record::PlotRecord;
use crate::error::{PlotError, Result};
use crate::plot_framework::{Canvas, Layer};

/// Draws one dependent record against its single setpoint.
///
/// Line plots are sorted by x first. Text-valued axes are placed at integer
/// positions and labelled with their strings.
pub fn plot_1d(x: &PlotRecord, y: &PlotRecord, canvas: &mut Canvas) -> Result<PlotType> {
    let plottype = get_1d_plottype(&x.data, &y.data);
    log::debug!("Determined plottype: {plottype}");

    let xs = AxisValues::from_record_data(&x.data);
    let ys = AxisValues::from_record_data(&y.data);
    let mut points: Vec<(f64, f64)> = xs.values.iter().copied().zip(ys.values.iter().copied()).collect();

    let layer = match plottype {
        PlotType::Line1D => {
            // NaN sorts last, like an unmeasured tail
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            Layer::Line(points)
        }
        PlotType::Point1D => Layer::Points(points),
        PlotType::Bar1D => Layer::Bars(points),
        other => {
            return Err(PlotError::Internal(format!(
                "Unknown plottype {other} for 1D data. Something is way wrong."
            )))
        }
    };

    if xs.is_categorical() {
        canvas.x_axis.categories = xs.categories;
    }
    if ys.is_categorical() {
        canvas.y_axis.categories = ys.categories;
    }
    canvas.layers.push(layer);
    Ok(plottype)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_input::plot_record::RecordData;

    fn record(name: &str, data: RecordData) -> PlotRecord {
        PlotRecord::new(name, "", "", data)
    }

    #[test]
    fn test_line_is_sorted_by_x() {
        let x = record("x", RecordData::numeric(vec![2.0, 0.0, 1.0]));
        let y = record("y", RecordData::numeric(vec![20.0, 0.0, 10.0]));
        let mut canvas = Canvas::new((400, 300));
        assert_eq!(plot_1d(&x, &y, &mut canvas).unwrap(), PlotType::Line1D);
        assert_eq!(
            canvas.layers,
            vec![Layer::Line(vec![(0.0, 0.0), (1.0, 10.0), (2.0, 20.0)])]
        );
    }

    #[test]
    fn test_distinct_text_setpoints_give_labelled_bars() {
        let x = record("state", RecordData::text(vec!["ramp", "hold", "off"]));
        let y = record("y", RecordData::numeric(vec![1.0, 2.0, 3.0]));
        let mut canvas = Canvas::new((400, 300));
        assert_eq!(plot_1d(&x, &y, &mut canvas).unwrap(), PlotType::Bar1D);
        assert_eq!(
            canvas.x_axis.categories,
            Some(vec!["hold".to_string(), "off".to_string(), "ramp".to_string()])
        );
        assert_eq!(
            canvas.layers,
            vec![Layer::Bars(vec![(2.0, 1.0), (0.0, 2.0), (1.0, 3.0)])]
        );
    }

    #[test]
    fn test_repeated_text_setpoints_give_points() {
        let x = record("state", RecordData::text(vec!["on", "off", "on"]));
        let y = record("y", RecordData::numeric(vec![1.0, 2.0, 3.0]));
        let mut canvas = Canvas::new((400, 300));
        assert_eq!(plot_1d(&x, &y, &mut canvas).unwrap(), PlotType::Point1D);
        assert_eq!(
            canvas.x_axis.categories,
            Some(vec!["off".to_string(), "on".to_string()])
        );
        assert_eq!(
            canvas.layers,
            vec![Layer::Points(vec![(1.0, 1.0), (0.0, 2.0), (1.0, 3.0)])]
        );
    }

    #[test]
    fn test_text_readings_give_labelled_points() {
        let x = record("x", RecordData::numeric(vec![0.0, 1.0, 2.0]));
        let y = record("mode", RecordData::text(vec!["dc", "ac", "dc"]));
        let mut canvas = Canvas::new((400, 300));
        assert_eq!(plot_1d(&x, &y, &mut canvas).unwrap(), PlotType::Point1D);
        assert_eq!(
            canvas.y_axis.categories,
            Some(vec!["ac".to_string(), "dc".to_string()])
        );
    }

    #[test]
    fn test_constant_x_gives_points() {
        let x = record("x", RecordData::numeric(vec![1.0, 1.0]));
        let y = record("y", RecordData::numeric(vec![3.0, 2.0]));
        let mut canvas = Canvas::new((400, 300));
        assert_eq!(plot_1d(&x, &y, &mut canvas).unwrap(), PlotType::Point1D);
        assert!(matches!(canvas.layers[0], Layer::Points(_)));
    }
}

// src/plot_functions/plot_1d.rs
