use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QpcrError;

/// One detector's result set: target-gene name -> computed quantities.
pub type QuantificationRecord = BTreeMap<String, TargetGene>;

/// Per-target-gene quantities as computed by the remote service. Field
/// names follow the service's JSON. `RQ`/`RQErr` drive the chart; the
/// intermediate delta-Ct values come along for export and debugging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetGene {
    #[serde(rename = "RQ", default)]
    pub rq: f64,
    #[serde(rename = "RQErr", default)]
    pub rq_err: f64,
    #[serde(rename = "Mean", default)]
    pub mean: f64,
    #[serde(rename = "StdDev", default)]
    pub std_dev: f64,
    #[serde(rename = "DCt", default)]
    pub d_ct: f64,
    #[serde(rename = "DdCt", default)]
    pub dd_ct: f64,
    #[serde(rename = "DdCtErr", default)]
    pub dd_ct_err: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndogenousControl {
    #[serde(rename = "Values", default)]
    pub values: Vec<f64>,
    #[serde(rename = "Mean", default)]
    pub mean: f64,
    #[serde(rename = "StdDev", default)]
    pub std_dev: f64,
}

/// The computed result set fetched from the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResults {
    #[serde(rename = "Detectors", default)]
    pub detectors: BTreeMap<String, QuantificationRecord>,
    #[serde(rename = "EndogenousControls", default)]
    pub endogenous_controls: BTreeMap<String, EndogenousControl>,
}

impl ExperimentResults {
    pub fn record(&self, detector: &str) -> Result<&QuantificationRecord, QpcrError> {
        self.detectors
            .get(detector)
            .ok_or_else(|| QpcrError::UnknownDetector(detector.to_string()))
    }
}

/// A submitted experiment. `results` stays `None` until the fetch stage
/// completes; the stages only ever append.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub reference: String,
    pub submitted_at: String,
    pub expires_at: Option<String>,
    pub results: Option<ExperimentResults>,
}

impl Experiment {
    pub fn new(experiment_id: String, reference: String, expires_at: Option<String>) -> Self {
        Self {
            experiment_id,
            reference,
            submitted_at: chrono::Utc::now().to_rfc3339(),
            expires_at,
            results: None,
        }
    }

    pub fn results(&self) -> Result<&ExperimentResults, QpcrError> {
        self.results.as_ref().ok_or(QpcrError::ResultsNotFetched)
    }
}
