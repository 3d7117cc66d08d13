// src/data_analysis/plot_type.rs

use std::collections::HashSet;
use std::fmt;

use crate::data_analysis::grid::{all_the_same, is_equidistant, pairs_are_unique, unique_sorted};
use crate::data_input::plot_record::RecordData;

/// How a plot group is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotType {
    Line1D,
    Point1D,
    Bar1D,
    Grid2D,
    Equidistant2D,
    Point2D,
    Unknown2D,
}

impl PlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotType::Line1D => "1D_line",
            PlotType::Point1D => "1D_point",
            PlotType::Bar1D => "1D_bar",
            PlotType::Grid2D => "2D_grid",
            PlotType::Equidistant2D => "2D_equidistant",
            PlotType::Point2D => "2D_point",
            PlotType::Unknown2D => "2D_unknown",
        }
    }

    /// Drawn as a mesh rather than as colored points.
    pub fn is_mesh(&self) -> bool {
        matches!(self, PlotType::Grid2D | PlotType::Equidistant2D)
    }
}

impl fmt::Display for PlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text setpoints give bars when every label is distinct and points when
/// labels repeat. Any text dependent gives points.
pub fn get_1d_plottype(x: &RecordData, y: &RecordData) -> PlotType {
    if y.is_text() {
        return PlotType::Point1D;
    }
    let values = match x {
        RecordData::Text(labels) => {
            let unique: HashSet<&String> = labels.iter().collect();
            return if unique.len() == labels.len() {
                PlotType::Bar1D
            } else {
                PlotType::Point1D
            };
        }
        RecordData::Numeric(a) => a.iter().copied().collect::<Vec<f64>>(),
        RecordData::Complex(a) => a.iter().map(|c| c.re).collect(),
    };
    if values.len() < 2 || all_the_same(&values) {
        PlotType::Point1D
    } else {
        PlotType::Line1D
    }
}

/// Classifies two flattened setpoint columns.
///
/// NaN setpoints are ignored. A constant independent gives `2D_point`. A
/// complete grid gives `2D_equidistant` or `2D_grid`; a grid that only lacks
/// the cells of an interrupted outer sweep is still `2D_grid`.
pub fn get_2d_plottype(x: &[f64], y: &[f64]) -> PlotType {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .unzip();

    if xs.is_empty() {
        return PlotType::Unknown2D;
    }
    if all_the_same(&xs) || all_the_same(&ys) {
        return PlotType::Point2D;
    }
    if !pairs_are_unique(&xs, &ys) {
        return PlotType::Unknown2D;
    }

    let ux = unique_sorted(&xs);
    let uy = unique_sorted(&ys);
    let n = xs.len();

    if ux.len() * uy.len() == n {
        if is_equidistant(&ux) && is_equidistant(&uy) {
            PlotType::Equidistant2D
        } else {
            PlotType::Grid2D
        }
    } else if is_interrupted_sweep(&xs, uy.len()) || is_interrupted_sweep(&ys, ux.len()) {
        PlotType::Grid2D
    } else {
        PlotType::Unknown2D
    }
}

/// Every outer value but the last one carries the full inner sweep.
fn is_interrupted_sweep(outer: &[f64], inner_len: usize) -> bool {
    let mut runs: Vec<(f64, usize)> = Vec::new();
    for &value in outer {
        match runs.last_mut() {
            Some((last, count)) if *last == value => *count += 1,
            _ => runs.push((value, 1)),
        }
    }
    // each outer value must form a single contiguous run
    if unique_sorted(outer).len() != runs.len() {
        return false;
    }
    match runs.split_last() {
        Some((last, complete)) => {
            complete.iter().all(|(_, count)| *count == inner_len) && last.1 <= inner_len
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for &xv in xs {
            for &yv in ys {
                x.push(xv);
                y.push(yv);
            }
        }
        (x, y)
    }

    #[test]
    fn test_1d_types() {
        let numbers = RecordData::numeric(vec![0.0, 1.0, 2.0]);
        let constant = RecordData::numeric(vec![1.0, 1.0, 1.0]);
        let text = RecordData::text(vec!["a", "b", "c"]);
        let repeated = RecordData::text(vec!["on", "off", "on"]);
        assert_eq!(get_1d_plottype(&numbers, &numbers), PlotType::Line1D);
        assert_eq!(get_1d_plottype(&constant, &numbers), PlotType::Point1D);
        assert_eq!(get_1d_plottype(&text, &numbers), PlotType::Bar1D);
        assert_eq!(get_1d_plottype(&repeated, &numbers), PlotType::Point1D);
        assert_eq!(get_1d_plottype(&text, &text), PlotType::Point1D);
        assert_eq!(get_1d_plottype(&numbers, &text), PlotType::Point1D);
    }

    #[test]
    fn test_equidistant_grid() {
        let (x, y) = grid(&[0.0, 1.0, 2.0, 3.0], &[0.0, 0.5, 1.0, 1.5]);
        assert_eq!(get_2d_plottype(&x, &y), PlotType::Equidistant2D);
    }

    #[test]
    fn test_uneven_grid() {
        let (x, y) = grid(&[0.0, 1.0, 5.0], &[0.0, 0.5, 1.0]);
        assert_eq!(get_2d_plottype(&x, &y), PlotType::Grid2D);
    }

    #[test]
    fn test_interrupted_sweep_is_grid() {
        let (mut x, mut y) = grid(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]);
        x.truncate(7);
        y.truncate(7);
        assert_eq!(get_2d_plottype(&x, &y), PlotType::Grid2D);
    }

    #[test]
    fn test_constant_axis_is_point() {
        let x = vec![1.0; 4];
        let y = vec![0.0, 1.0, 2.0, 3.0];
        assert_eq!(get_2d_plottype(&x, &y), PlotType::Point2D);
    }

    #[test]
    fn test_scattered_points_are_unknown() {
        let x = vec![0.1, 0.7, 0.3, 0.9, 0.5];
        let y = vec![0.2, 0.4, 0.8, 0.1, 0.6];
        assert_eq!(get_2d_plottype(&x, &y), PlotType::Unknown2D);
    }

    #[test]
    fn test_duplicates_are_unknown() {
        let (mut x, mut y) = grid(&[0.0, 1.0], &[0.0, 1.0]);
        x.push(0.0);
        y.push(0.0);
        assert_eq!(get_2d_plottype(&x, &y), PlotType::Unknown2D);
    }

    #[test]
    fn test_names() {
        assert_eq!(PlotType::Equidistant2D.to_string(), "2D_equidistant");
        assert_eq!(PlotType::Bar1D.as_str(), "1D_bar");
        assert!(PlotType::Grid2D.is_mesh());
        assert!(!PlotType::Point2D.is_mesh());
    }
}

// src/data_analysis/plot_type.rs
