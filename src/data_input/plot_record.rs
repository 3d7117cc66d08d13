// src/data_input/plot_record.rs

use ndarray::{Array1, ArrayD, IxDyn};
use num_complex::Complex64;

use crate::error::{PlotError, Result};

/// Sample values of one record. NaN marks a point that was not measured.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordData {
    Numeric(ArrayD<f64>),
    Complex(ArrayD<Complex64>),
    Text(ArrayD<String>),
}

impl RecordData {
    pub fn numeric(values: Vec<f64>) -> Self {
        RecordData::Numeric(Array1::from_vec(values).into_dyn())
    }

    pub fn complex(values: Vec<Complex64>) -> Self {
        RecordData::Complex(Array1::from_vec(values).into_dyn())
    }

    pub fn text<S: Into<String>>(values: Vec<S>) -> Self {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        RecordData::Text(Array1::from_vec(values).into_dyn())
    }

    pub fn len(&self) -> usize {
        match self {
            RecordData::Numeric(a) => a.len(),
            RecordData::Complex(a) => a.len(),
            RecordData::Text(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ndim(&self) -> usize {
        match self {
            RecordData::Numeric(a) => a.ndim(),
            RecordData::Complex(a) => a.ndim(),
            RecordData::Text(a) => a.ndim(),
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            RecordData::Numeric(a) => a.shape().to_vec(),
            RecordData::Complex(a) => a.shape().to_vec(),
            RecordData::Text(a) => a.shape().to_vec(),
        }
    }

    /// Categorical (string-valued) data.
    pub fn is_text(&self) -> bool {
        matches!(self, RecordData::Text(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, RecordData::Complex(_))
    }

    /// Values in logical (row-major) order.
    pub fn flat_numeric(&self) -> Option<Vec<f64>> {
        match self {
            RecordData::Numeric(a) => Some(a.iter().copied().collect()),
            _ => None,
        }
    }

    pub fn flat_text(&self) -> Option<Vec<String>> {
        match self {
            RecordData::Text(a) => Some(a.iter().cloned().collect()),
            _ => None,
        }
    }

    /// Returns the same data laid out with `shape`. Cells beyond the available
    /// samples are padded with NaN (numeric/complex) or an empty string (text).
    /// More samples than cells is an error.
    pub fn reshaped_padded(&self, shape: &[usize]) -> Result<Self> {
        let cells: usize = shape.iter().product();
        if self.len() > cells {
            return Err(PlotError::DataSource(format!(
                "{} samples do not fit the grid shape {:?}",
                self.len(),
                shape
            )));
        }
        Ok(match self {
            RecordData::Numeric(a) => RecordData::Numeric(padded(a, shape, f64::NAN)),
            RecordData::Complex(a) => {
                RecordData::Complex(padded(a, shape, Complex64::new(f64::NAN, f64::NAN)))
            }
            RecordData::Text(a) => RecordData::Text(padded(a, shape, String::new())),
        })
    }
}

fn padded<T: Clone>(values: &ArrayD<T>, shape: &[usize], fill: T) -> ArrayD<T> {
    let mut out = ArrayD::from_elem(IxDyn(shape), fill);
    for (slot, value) in out.iter_mut().zip(values.iter()) {
        *slot = value.clone();
    }
    out
}

/// One named, labelled, unit-tagged array of samples for an independent or
/// dependent variable.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRecord {
    pub name: String,
    pub label: String,
    pub unit: String,
    pub data: RecordData,
    /// Grid dimensions when the measurement was taken on a known grid.
    pub shape: Option<Vec<usize>>,
}

impl PlotRecord {
    pub fn new(name: &str, label: &str, unit: &str, data: RecordData) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            unit: unit.to_string(),
            data,
            shape: None,
        }
    }

    pub fn with_shape(mut self, shape: Vec<usize>) -> Self {
        self.shape = Some(shape);
        self
    }

    /// The label, or the name when no label was given.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// `"<label> (<unit>)"`, without parentheses when the unit is empty.
    pub fn axis_label(&self) -> String {
        make_axis_label(self.display_label(), &self.unit)
    }
}

pub fn make_axis_label(label: &str, unit: &str) -> String {
    if unit.is_empty() {
        label.to_string()
    } else {
        format!("{label} ({unit})")
    }
}

/// Records of one measurement sweep: independents first, dependent last.
pub type PlotGroup = Vec<PlotRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_label_falls_back_to_name() {
        let rec = PlotRecord::new("v_gate", "", "V", RecordData::numeric(vec![0.0]));
        assert_eq!(rec.axis_label(), "v_gate (V)");
        let rec = PlotRecord::new("count", "Counts", "", RecordData::numeric(vec![0.0]));
        assert_eq!(rec.axis_label(), "Counts");
    }

    #[test]
    fn test_reshape_pads_missing_cells_with_nan() {
        let data = RecordData::numeric(vec![1.0, 2.0, 3.0]);
        let reshaped = data.reshaped_padded(&[2, 2]).unwrap();
        assert_eq!(reshaped.shape(), vec![2, 2]);
        let flat = reshaped.flat_numeric().unwrap();
        assert_eq!(&flat[..3], &[1.0, 2.0, 3.0]);
        assert!(flat[3].is_nan());
    }

    #[test]
    fn test_reshape_rejects_surplus_samples() {
        let data = RecordData::numeric(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(matches!(data.reshaped_padded(&[2, 2]), Err(PlotError::DataSource(_))));
        assert_eq!(data.reshaped_padded(&[2, 3]).unwrap().shape(), vec![2, 3]);
    }
}

// src/data_input/plot_record.rs
