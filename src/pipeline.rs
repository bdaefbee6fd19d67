use std::fmt;

use tracing::{debug, warn};

use crate::api::QpcrApi;
use crate::domain::{FormatTag, RawExport};
use crate::error::QpcrError;
use crate::experiment::Experiment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Submit,
    Fetch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Submit => write!(f, "submit"),
            Stage::Fetch => write!(f, "fetch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Submitting,
    AwaitingResult,
    Complete,
    RateLimited {
        stage: Stage,
        retry_after: Option<String>,
    },
    Failed {
        stage: Stage,
        status: Option<u16>,
        message: String,
    },
}

/// Rate-limit signal for the current attempt. Scoped to one pipeline and
/// cleared by every fresh `submit` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitState {
    pub exceeded: bool,
    pub retry_after: Option<String>,
}

/// Outcome of a submission attempt that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Preconditions not met (empty export or reference); nothing was sent.
    Suppressed,
    Completed(Experiment),
}

/// Drives one experiment through submit -> fetch. Stages are strictly
/// sequential: the fetch request is only issued once the submit stage has
/// yielded an experiment identifier. One attempt at a time per instance;
/// a fresh `submit` always starts over from `Idle`.
pub struct Pipeline<C: QpcrApi> {
    api: C,
    tag: FormatTag,
    state: PipelineState,
    rate_limit: RateLimitState,
    experiment: Option<Experiment>,
}

impl<C: QpcrApi> Pipeline<C> {
    pub fn new(api: C, tag: FormatTag) -> Self {
        Self {
            api,
            tag,
            state: PipelineState::Idle,
            rate_limit: RateLimitState::default(),
            experiment: None,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn rate_limit(&self) -> &RateLimitState {
        &self.rate_limit
    }

    /// The experiment from the last attempt, if the submit stage succeeded.
    /// Its `results` stay `None` when the fetch stage did not complete.
    pub fn experiment(&self) -> Option<&Experiment> {
        self.experiment.as_ref()
    }

    pub fn submit(
        &mut self,
        raw: &RawExport,
        reference: &str,
    ) -> Result<Submission, QpcrError> {
        self.state = PipelineState::Idle;
        self.rate_limit = RateLimitState::default();
        self.experiment = None;

        if raw.is_empty() || reference.is_empty() {
            return Ok(Submission::Suppressed);
        }

        self.state = PipelineState::Submitting;
        let receipt = match self.api.submit_experiment(self.tag, raw, reference) {
            Ok(receipt) => receipt,
            Err(err) => return Err(self.fail(Stage::Submit, err)),
        };
        debug!(experiment_id = %receipt.experiment_id, "experiment accepted");

        let mut experiment = Experiment::new(
            receipt.experiment_id.clone(),
            reference.to_string(),
            receipt.expires_at,
        );
        self.experiment = Some(experiment.clone());
        self.state = PipelineState::AwaitingResult;

        let results = match self.api.fetch_results(&receipt.experiment_id) {
            Ok(results) => results,
            Err(err) => return Err(self.fail(Stage::Fetch, err)),
        };
        debug!(
            detectors = results.detectors.len(),
            "experiment results fetched"
        );

        experiment.results = Some(results);
        self.experiment = Some(experiment.clone());
        self.state = PipelineState::Complete;
        Ok(Submission::Completed(experiment))
    }

    fn fail(&mut self, stage: Stage, err: QpcrError) -> QpcrError {
        warn!(stage = %stage, error = %err, "submission attempt failed");
        match &err {
            QpcrError::RateLimited { retry_after } => {
                self.rate_limit = RateLimitState {
                    exceeded: true,
                    retry_after: retry_after.clone(),
                };
                self.state = PipelineState::RateLimited {
                    stage,
                    retry_after: retry_after.clone(),
                };
            }
            QpcrError::ApiStatus { status, message } => {
                self.state = PipelineState::Failed {
                    stage,
                    status: Some(*status),
                    message: message.clone(),
                };
            }
            other => {
                self.state = PipelineState::Failed {
                    stage,
                    status: None,
                    message: other.to_string(),
                };
            }
        }
        err
    }
}
