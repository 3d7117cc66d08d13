// src/data_analysis/complex_split.rs

use ndarray::ArrayD;
use num_complex::Complex64;
use std::fmt;
use std::str::FromStr;

use crate::data_input::plot_record::{PlotGroup, PlotRecord, RecordData};
use crate::error::{PlotError, Result};

/// How a complex-valued record is turned into two real-valued ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComplexPlotType {
    #[default]
    RealAndImag,
    MagAndPhase,
}

impl FromStr for ComplexPlotType {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "real_and_imag" => Ok(ComplexPlotType::RealAndImag),
            "mag_and_phase" => Ok(ComplexPlotType::MagAndPhase),
            other => Err(PlotError::InvalidArgument(format!(
                "Invalid complex plot type given. Received {other} but can only accept \
                 \"real_and_imag\" or \"mag_and_phase\"."
            ))),
        }
    }
}

impl fmt::Display for ComplexPlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplexPlotType::RealAndImag => write!(f, "real_and_imag"),
            ComplexPlotType::MagAndPhase => write!(f, "mag_and_phase"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseUnit {
    #[default]
    Radians,
    Degrees,
}

impl PhaseUnit {
    pub fn unit(&self) -> &'static str {
        match self {
            PhaseUnit::Radians => "rad",
            PhaseUnit::Degrees => "deg",
        }
    }
}

impl FromStr for PhaseUnit {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "radians" => Ok(PhaseUnit::Radians),
            "degrees" => Ok(PhaseUnit::Degrees),
            other => Err(PlotError::InvalidArgument(format!(
                "Invalid complex plot phase given. Received {other} but can only accept \
                 \"degrees\" or \"radians\"."
            ))),
        }
    }
}

/// Replaces complex-valued records by pairs of real-valued ones.
///
/// A complex independent (any position but the last) is expanded in place,
/// so its group grows by one record. A complex dependent (the last record)
/// splits the whole group in two: both copies keep the already processed
/// independents, one ends with the first component and one with the second.
pub fn split_complex(
    groups: &[PlotGroup],
    conversion: ComplexPlotType,
    phase: PhaseUnit,
) -> Vec<PlotGroup> {
    let mut new_data: Vec<PlotGroup> = Vec::with_capacity(groups.len());

    for group in groups {
        let mut new_group: PlotGroup = Vec::with_capacity(group.len() + 1);
        let mut split_groups: Option<(PlotGroup, PlotGroup)> = None;

        for (index, record) in group.iter().enumerate() {
            if !record.data.is_complex() {
                new_group.push(record.clone());
                continue;
            }
            let (first, second) = convert_complex_to_real(record, conversion, phase);
            if index < group.len() - 1 {
                // complex setpoints
                new_group.push(first);
                new_group.push(second);
            } else {
                let mut first_group = new_group.clone();
                let mut second_group = new_group.clone();
                first_group.push(first);
                second_group.push(second);
                split_groups = Some((first_group, second_group));
            }
        }

        match split_groups {
            Some((first_group, second_group)) => {
                new_data.push(first_group);
                new_data.push(second_group);
            }
            None => new_data.push(new_group),
        }
    }

    new_data
}

/// Same as [`split_complex`] with the conversion and phase unit given by name.
pub fn split_complex_by_name(
    groups: &[PlotGroup],
    conversion: &str,
    phase: &str,
) -> Result<Vec<PlotGroup>> {
    let conversion: ComplexPlotType = conversion.parse()?;
    let phase: PhaseUnit = phase.parse()?;
    Ok(split_complex(groups, conversion, phase))
}

fn map_complex(values: &ArrayD<Complex64>, f: impl Fn(&Complex64) -> f64) -> RecordData {
    RecordData::Numeric(values.map(f))
}

/// Turns one complex record into two real ones. Non-complex input is returned
/// twice unchanged.
pub fn convert_complex_to_real(
    record: &PlotRecord,
    conversion: ComplexPlotType,
    phase: PhaseUnit,
) -> (PlotRecord, PlotRecord) {
    let values = match &record.data {
        RecordData::Complex(values) => values,
        _ => return (record.clone(), record.clone()),
    };

    let (data, suffixes, units) = match conversion {
        ComplexPlotType::RealAndImag => (
            (map_complex(values, |c| c.re), map_complex(values, |c| c.im)),
            (("real", "[real]"), ("imag", "[imag]")),
            (record.unit.clone(), record.unit.clone()),
        ),
        ComplexPlotType::MagAndPhase => {
            let degrees = phase == PhaseUnit::Degrees;
            (
                (
                    map_complex(values, |c| c.norm()),
                    map_complex(values, move |c| {
                        let angle = c.arg();
                        if degrees {
                            angle.to_degrees()
                        } else {
                            angle
                        }
                    }),
                ),
                (("mag", "[mag]"), ("phase", "[phase]")),
                (record.unit.clone(), phase.unit().to_string()),
            )
        }
    };

    let first = PlotRecord {
        name: format!("{}_{}", record.name, (suffixes.0).0),
        label: format!("{} {}", record.label, (suffixes.0).1),
        unit: units.0,
        data: data.0,
        shape: record.shape.clone(),
    };
    let second = PlotRecord {
        name: format!("{}_{}", record.name, (suffixes.1).0),
        label: format!("{} {}", record.label, (suffixes.1).1),
        unit: units.1,
        data: data.1,
        shape: record.shape.clone(),
    };
    (first, second)
}


// src/data_analysis/complex_split.rs
