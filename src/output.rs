use std::io::{self, Write};

use serde::Serialize;

use crate::api::RateLimitStatus;
use crate::chart::ChartPoint;
use crate::domain::Detector;
use crate::experiment::Experiment;

/// `detectors` command result.
#[derive(Debug, Clone, Serialize)]
pub struct DetectorsReport {
    pub detectors: Vec<Detector>,
    pub suggested_reference: Option<String>,
}

/// `run` command result: the experiment plus chart points per detector.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub experiment: Experiment,
    pub charts: Vec<DetectorChart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectorChart {
    pub detector: String,
    pub points: Vec<ChartPoint>,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_detectors(report: &DetectorsReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_run(report: &RunReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_rate_limit(status: &RateLimitStatus) -> io::Result<()> {
        Self::print_json(status)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
