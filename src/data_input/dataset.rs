// src/data_input/dataset.rs

use std::collections::HashMap;

use crate::data_input::plot_record::{PlotGroup, PlotRecord, RecordData};
use crate::error::{PlotError, Result};

/// Declaration of one measured parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub label: String,
    pub unit: String,
    /// Names of the independent parameters this one was swept against.
    /// Empty for independent parameters.
    pub depends_on: Vec<String>,
}

impl ParamSpec {
    pub fn is_dependent(&self) -> bool {
        !self.depends_on.is_empty()
    }
}

/// A finished measurement run together with its column data.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub run_id: u64,
    pub exp_name: String,
    pub sample_name: String,
    pub parameters: Vec<ParamSpec>,
    pub columns: HashMap<String, RecordData>,
    /// Grid dimensions per dependent parameter, when the sweep was gridded.
    pub shapes: HashMap<String, Vec<usize>>,
}

impl Dataset {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn dependent_parameters(&self) -> impl Iterator<Item = &ParamSpec> {
        self.parameters.iter().filter(|p| p.is_dependent())
    }

    /// Title shown above every plot of this run.
    pub fn plot_title(&self) -> String {
        format!(
            "Run #{}, Experiment {} ({})",
            self.run_id, self.exp_name, self.sample_name
        )
    }

    fn record_for(&self, spec: &ParamSpec) -> Result<PlotRecord> {
        let data = self.columns.get(&spec.name).ok_or_else(|| {
            PlotError::DataSource(format!(
                "Run {} declares parameter '{}' but has no data for it",
                self.run_id, spec.name
            ))
        })?;
        Ok(PlotRecord::new(&spec.name, &spec.label, &spec.unit, data.clone()))
    }

    /// Builds one group per dependent parameter: its independents in declared
    /// order followed by the dependent itself.
    ///
    /// When the dependent has grid metadata every record of the group is laid
    /// out on that grid, with unmeasured cells padded as NaN.
    pub fn plot_groups(&self) -> Result<Vec<PlotGroup>> {
        let mut groups = Vec::new();
        for dep in self.dependent_parameters() {
            let mut group: PlotGroup = Vec::with_capacity(dep.depends_on.len() + 1);
            for indep_name in &dep.depends_on {
                let indep = self.param(indep_name).ok_or_else(|| {
                    PlotError::DataSource(format!(
                        "Parameter '{}' depends on unknown parameter '{}'",
                        dep.name, indep_name
                    ))
                })?;
                group.push(self.record_for(indep)?);
            }
            group.push(self.record_for(dep)?);

            let expected = group.last().map(|r| r.data.len()).unwrap_or(0);
            if group.iter().any(|r| r.data.len() != expected) {
                return Err(PlotError::DataSource(format!(
                    "Records of '{}' do not share a common point count",
                    dep.name
                )));
            }

            if let Some(shape) = self.shapes.get(&dep.name) {
                for record in group.iter_mut() {
                    record.data = record.data.reshaped_padded(shape)?;
                    record.shape = Some(shape.clone());
                }
            }
            groups.push(group);
        }
        log::debug!("Run {} yielded {} plot groups", self.run_id, groups.len());
        Ok(groups)
    }
}

/// Anything that can hand out a dataset for a run id.
pub trait DatasetSource {
    fn load_by_run_id(&self, run_id: u64) -> Result<Dataset>;
}


// src/data_input/dataset.rs
