// src/data_analysis/grid.rs

// Helpers that put scattered 2D setpoints onto a rectilinear grid.

use ndarray::{Array2, Axis};
use std::collections::HashSet;

use crate::constants::{SETPOINT_ATOL, SETPOINT_RTOL};
use crate::data_input::plot_record::RecordData;

/// Numeric positions of one axis. Text data is mapped to integer positions
/// (index into its sorted unique values), which are kept as `categories`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisValues {
    pub values: Vec<f64>,
    pub categories: Option<Vec<String>>,
}

impl AxisValues {
    pub fn from_record_data(data: &RecordData) -> Self {
        match data {
            RecordData::Numeric(values) => AxisValues {
                values: values.iter().copied().collect(),
                categories: None,
            },
            RecordData::Text(values) => {
                let strings: Vec<String> = values.iter().cloned().collect();
                let (ints, categories) = strings_as_ints(&strings);
                AxisValues {
                    values: ints,
                    categories: Some(categories),
                }
            }
            RecordData::Complex(values) => {
                log::warn!("Complex values reached an axis; plotting their real part");
                AxisValues {
                    values: values.iter().map(|c| c.re).collect(),
                    categories: None,
                }
            }
        }
    }

    pub fn is_categorical(&self) -> bool {
        self.categories.is_some()
    }
}

/// Maps each string to the index of its value in the sorted unique strings.
pub fn strings_as_ints(values: &[String]) -> (Vec<f64>, Vec<String>) {
    let mut unique: Vec<String> = values.to_vec();
    unique.sort();
    unique.dedup();
    let ints = values
        .iter()
        .map(|v| unique.binary_search(v).unwrap_or(0) as f64)
        .collect();
    (ints, unique)
}

/// Sorted unique non-NaN values.
pub fn unique_sorted(values: &[f64]) -> Vec<f64> {
    let mut unique: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    unique.sort_by(|a, b| a.total_cmp(b));
    unique.dedup();
    unique
}

pub fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= SETPOINT_ATOL + SETPOINT_RTOL * b.abs()
}

/// True when every non-NaN value equals the first one (within tolerance).
pub fn all_the_same(values: &[f64]) -> bool {
    let mut finite = values.iter().copied().filter(|v| !v.is_nan());
    match finite.next() {
        Some(first) => finite.all(|v| is_close(v, first)),
        None => true,
    }
}

/// True when consecutive sorted values are evenly spaced.
pub fn is_equidistant(sorted: &[f64]) -> bool {
    if sorted.len() < 3 {
        return true;
    }
    let step = sorted[1] - sorted[0];
    sorted.windows(2).all(|w| is_close(w[1] - w[0], step))
}

/// Lays `z` out on the grid spanned by the unique values of `x` and `y`.
///
/// Returns (unique x, unique y, z with shape (len y, len x)). Cells without a
/// measurement are NaN; points with NaN setpoints are dropped.
pub fn reshape_2d_data(x: &[f64], y: &[f64], z: &[f64]) -> (Vec<f64>, Vec<f64>, Array2<f64>) {
    let x_row = unique_sorted(x);
    let y_row = unique_sorted(y);
    let mut z_grid = Array2::<f64>::from_elem((y_row.len(), x_row.len()), f64::NAN);

    log::debug!("Sorting 2D data onto a {}x{} grid", x_row.len(), y_row.len());
    for ((&xv, &yv), &zv) in x.iter().zip(y).zip(z) {
        if xv.is_nan() || yv.is_nan() {
            continue;
        }
        let xi = x_row.binary_search_by(|p| p.total_cmp(&xv));
        let yi = y_row.binary_search_by(|p| p.total_cmp(&yv));
        if let (Ok(xi), Ok(yi)) = (xi, yi) {
            z_grid[[yi, xi]] = zv;
        }
    }
    (x_row, y_row, z_grid)
}

fn nan_max(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.filter(|v| !v.is_nan()).fold(None, |acc, v| match acc {
        Some(m) if m >= v => Some(m),
        _ => Some(v),
    })
}

/// Checks that shaped setpoints form a rectilinear grid apart from NaNs:
/// every row of `x` equals its first column, every column of `y` its first row.
pub fn on_rectilinear_grid_except_nan(x: &Array2<f64>, y: &Array2<f64>) -> bool {
    if x.ncols() == 0 || y.nrows() == 0 {
        return false;
    }
    let x_first_col = x.column(0).to_owned().insert_axis(Axis(1));
    let y_first_row = y.row(0).to_owned().insert_axis(Axis(0));
    let x_diff = (x - &x_first_col).mapv(f64::abs);
    let y_diff = (y - &y_first_row).mapv(f64::abs);
    nan_max(x_diff.iter().copied()) == Some(0.0) && nan_max(y_diff.iter().copied()) == Some(0.0)
}

/// Removes the rows and columns of a shaped sweep that were never measured.
///
/// Rows whose first-column x setpoint is NaN and columns whose first-row y
/// setpoint is NaN are clipped. When the setpoints are not rectilinear the
/// data is flattened, NaN points dropped, and reshaped like unshaped data.
pub fn clip_nan_from_shaped_data(
    x: &Array2<f64>,
    y: &Array2<f64>,
    z: &Array2<f64>,
) -> (Vec<f64>, Vec<f64>, Array2<f64>) {
    if on_rectilinear_grid_except_nan(x, y) {
        let keep_rows: Vec<usize> = (0..x.nrows()).filter(|&i| !x[[i, 0]].is_nan()).collect();
        let keep_cols: Vec<usize> = (0..y.ncols()).filter(|&j| !y[[0, j]].is_nan()).collect();

        let x_to_plot: Vec<f64> = keep_rows.iter().map(|&i| x[[i, 0]]).collect();
        let y_to_plot: Vec<f64> = keep_cols.iter().map(|&j| y[[0, j]]).collect();
        let z_to_plot = z
            .select(Axis(0), &keep_rows)
            .select(Axis(1), &keep_cols)
            .reversed_axes();
        (x_to_plot, y_to_plot, z_to_plot)
    } else {
        let mut xs = Vec::with_capacity(x.len());
        let mut ys = Vec::with_capacity(y.len());
        let mut zs = Vec::with_capacity(z.len());
        for ((&xv, &yv), &zv) in x.iter().zip(y.iter()).zip(z.iter()) {
            if !xv.is_nan() && !yv.is_nan() {
                xs.push(xv);
                ys.push(yv);
                zs.push(zv);
            }
        }
        reshape_2d_data(&xs, &ys, &zs)
    }
}

/// True when no (x, y) pair occurs twice.
pub fn pairs_are_unique(x: &[f64], y: &[f64]) -> bool {
    let mut seen = HashSet::with_capacity(x.len());
    x.iter()
        .zip(y)
        .all(|(xv, yv)| seen.insert((xv.to_bits(), yv.to_bits())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_strings_as_ints_uses_sorted_unique_values() {
        let values: Vec<String> = ["b", "a", "c", "a"].iter().map(|s| s.to_string()).collect();
        let (ints, unique) = strings_as_ints(&values);
        assert_eq!(ints, vec![1.0, 0.0, 2.0, 0.0]);
        assert_eq!(unique, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reshape_fills_grid_and_marks_missing_cells() {
        let x = [0.0, 1.0, 0.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0, 1.0, 2.0];
        let z = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (xr, yr, zg) = reshape_2d_data(&x, &y, &z);
        assert_eq!(xr, vec![0.0, 1.0]);
        assert_eq!(yr, vec![0.0, 1.0, 2.0]);
        assert_eq!(zg.dim(), (3, 2));
        assert_eq!(zg[[1, 1]], 4.0);
        assert_eq!(zg[[2, 0]], 5.0);
        assert!(zg[[2, 1]].is_nan());
    }

    #[test]
    fn test_equidistant() {
        assert!(is_equidistant(&[0.0, 0.1, 0.2, 0.3]));
        assert!(!is_equidistant(&[0.0, 0.1, 0.5, 0.6]));
        assert!(is_equidistant(&[1.0]));
    }

    #[test]
    fn test_clip_removes_unmeasured_row() {
        let nan = f64::NAN;
        // x is the outer (row) setpoint, y the inner one
        let x = array![
            [0.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 1.0],
            [2.0, 2.0, 2.0, 2.0],
            [nan, nan, nan, nan]
        ];
        let y = array![
            [0.0, 1.0, 2.0, 3.0],
            [0.0, 1.0, 2.0, 3.0],
            [0.0, 1.0, 2.0, 3.0],
            [nan, nan, nan, nan]
        ];
        let z = Array2::from_shape_fn((4, 4), |(i, j)| (i * 4 + j) as f64);
        let (xp, yp, zp) = clip_nan_from_shaped_data(&x, &y, &z);
        assert_eq!(xp, vec![0.0, 1.0, 2.0]);
        assert_eq!(yp, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(zp.dim(), (4, 3));
        // transposed: z_plot[j, i] == z[i, j]
        assert_eq!(zp[[3, 2]], z[[2, 3]]);
    }

    #[test]
    fn test_clip_falls_back_for_non_rectilinear_setpoints() {
        let nan = f64::NAN;
        let x = array![[0.0, 0.1], [1.0, nan]];
        let y = array![[0.0, 1.0], [0.0, nan]];
        let z = array![[1.0, 2.0], [3.0, nan]];
        let (xp, yp, zp) = clip_nan_from_shaped_data(&x, &y, &z);
        assert_eq!(xp, vec![0.0, 0.1, 1.0]);
        assert_eq!(yp, vec![0.0, 1.0]);
        assert_eq!(zp.dim(), (2, 3));
    }

    #[test]
    fn test_pairs_are_unique() {
        assert!(pairs_are_unique(&[0.0, 0.0, 1.0], &[0.0, 1.0, 0.0]));
        assert!(!pairs_are_unique(&[0.0, 0.0], &[1.0, 1.0]));
    }
}

// src/data_analysis/grid.rs
