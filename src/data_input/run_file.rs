// src/data_input/run_file.rs

use csv::{ReaderBuilder, StringRecord, Trim};
use num_complex::Complex64;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::constants::{RUN_FILE_EXTENSION, RUN_FILE_PREFIX};
use crate::data_input::dataset::{Dataset, DatasetSource, ParamSpec};
use crate::data_input::plot_record::RecordData;
use crate::error::{PlotError, Result};

// Metadata keys recognised in the preamble before the column header row.
const KEY_RUN_ID: &str = "run_id";
const KEY_EXP_NAME: &str = "exp_name";
const KEY_SAMPLE_NAME: &str = "sample_name";
const KEY_PARAMETER: &str = "parameter";
const KEY_SHAPE: &str = "shape";

/// A directory of `run_<id>.csv` files.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    pub root: PathBuf,
}

impl RunDirectory {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn run_path(&self, run_id: u64) -> PathBuf {
        self.root
            .join(format!("{RUN_FILE_PREFIX}{run_id}.{RUN_FILE_EXTENSION}"))
    }
}

impl DatasetSource for RunDirectory {
    fn load_by_run_id(&self, run_id: u64) -> Result<Dataset> {
        let path = self.run_path(run_id);
        let dataset = parse_run_file(&path)?;
        if dataset.run_id != run_id {
            log::warn!(
                "'{}' declares run_id {} but was loaded as run {}",
                path.display(),
                dataset.run_id,
                run_id
            );
        }
        Ok(dataset)
    }
}

/// Parses a run file from disk. See [`parse_run_text`] for the layout.
pub fn parse_run_file(path: &Path) -> Result<Dataset> {
    let mut text = String::new();
    File::open(path)
        .map_err(|e| PlotError::DataSource(format!("Cannot open '{}': {e}", path.display())))?
        .read_to_string(&mut text)?;
    parse_run_text(&text)
}

/// Parses a run file.
///
/// The preamble holds metadata rows:
/// ```text
/// run_id,7
/// exp_name,dc_sweep
/// sample_name,chip_a
/// parameter,<name>,<label>,<unit>,<depends_on separated by ';'>
/// shape,<dependent name>,<n>x<m>
/// ```
/// The first row whose first field is not a metadata key is the column header
/// (parameter names); all following rows are data.
pub fn parse_run_text(text: &str) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut dataset = Dataset::default();
    let mut header: Option<StringRecord> = None;
    let mut raw_columns: Vec<Vec<String>> = Vec::new();

    for (line_idx, record_result) in reader.records().enumerate() {
        let record = record_result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        if let Some(header_record) = &header {
            // Data row
            for (col_idx, column) in raw_columns.iter_mut().enumerate() {
                column.push(record.get(col_idx).unwrap_or("").to_string());
            }
            if record.len() > header_record.len() {
                log::warn!(
                    "Row {} has {} fields, header has {}; extra fields ignored",
                    line_idx + 1,
                    record.len(),
                    header_record.len()
                );
            }
            continue;
        }

        let key = record.get(0).unwrap_or("").to_string();
        match key.as_str() {
            KEY_RUN_ID => {
                let value = record.get(1).unwrap_or("");
                dataset.run_id = value.parse().map_err(|_| {
                    PlotError::DataSource(format!("Invalid run_id '{value}'"))
                })?;
            }
            KEY_EXP_NAME => dataset.exp_name = record.get(1).unwrap_or("").to_string(),
            KEY_SAMPLE_NAME => dataset.sample_name = record.get(1).unwrap_or("").to_string(),
            KEY_PARAMETER => dataset.parameters.push(parse_parameter_row(&record)?),
            KEY_SHAPE => {
                let (name, shape) = parse_shape_row(&record)?;
                dataset.shapes.insert(name, shape);
            }
            _ => {
                raw_columns = vec![Vec::new(); record.len()];
                header = Some(record);
            }
        }
    }

    let header = header.ok_or_else(|| {
        PlotError::DataSource("Could not find the column header row".to_string())
    })?;

    for (name, raw) in header.iter().zip(raw_columns) {
        if dataset.param(name).is_none() {
            log::debug!("Column '{name}' has no parameter row; treating it as independent");
            dataset.parameters.push(ParamSpec {
                name: name.to_string(),
                label: String::new(),
                unit: String::new(),
                depends_on: Vec::new(),
            });
        }
        dataset.columns.insert(name.to_string(), parse_column(&raw));
    }

    log::info!(
        "Loaded run {} ({} parameters, {} columns)",
        dataset.run_id,
        dataset.parameters.len(),
        dataset.columns.len()
    );
    Ok(dataset)
}

fn parse_parameter_row(record: &StringRecord) -> Result<ParamSpec> {
    let name = record.get(1).unwrap_or("");
    if name.is_empty() {
        return Err(PlotError::DataSource(
            "Parameter row without a name".to_string(),
        ));
    }
    let depends_on = record
        .get(4)
        .unwrap_or("")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Ok(ParamSpec {
        name: name.to_string(),
        label: record.get(2).unwrap_or("").to_string(),
        unit: record.get(3).unwrap_or("").to_string(),
        depends_on,
    })
}

fn parse_shape_row(record: &StringRecord) -> Result<(String, Vec<usize>)> {
    let name = record.get(1).unwrap_or("").to_string();
    let dims = record.get(2).unwrap_or("");
    let shape: std::result::Result<Vec<usize>, _> =
        dims.split('x').map(|d| d.trim().parse::<usize>()).collect();
    match shape {
        Ok(shape) if !name.is_empty() && !shape.is_empty() => Ok((name, shape)),
        _ => Err(PlotError::DataSource(format!(
            "Invalid shape row for '{name}': '{dims}'"
        ))),
    }
}

/// Types a column: all floats (empty cells become NaN), else all complex,
/// else text.
fn parse_column(raw: &[String]) -> RecordData {
    let filled: Vec<&String> = raw.iter().filter(|v| !v.is_empty()).collect();

    if filled.iter().all(|v| v.parse::<f64>().is_ok()) {
        let values = raw
            .iter()
            .map(|v| v.parse::<f64>().unwrap_or(f64::NAN))
            .collect();
        return RecordData::numeric(values);
    }

    if filled.iter().all(|v| parse_complex(v).is_some()) {
        let values = raw
            .iter()
            .map(|v| parse_complex(v).unwrap_or(Complex64::new(f64::NAN, f64::NAN)))
            .collect();
        return RecordData::complex(values);
    }

    RecordData::text(raw.to_vec())
}

fn parse_complex(value: &str) -> Option<Complex64> {
    // Python-style "(3+4j)" is accepted as well as "3+4j".
    let stripped = value.trim_start_matches('(').trim_end_matches(')');
    stripped.parse::<Complex64>().ok()
}


// src/data_input/run_file.rs
