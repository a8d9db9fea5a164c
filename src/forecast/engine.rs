use async_trait::async_trait;
use std::{io, path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{ModelPrediction, PredictionInput, PredictionSource};

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("external predictor disabled")]
    Disabled,

    #[error("no predictor scripts configured")]
    NoCandidates,

    #[error("script not found: {}", .0.display())]
    ScriptMissing(PathBuf),

    #[error("failed to spawn interpreter {interpreter}: {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for predictor process: {0}")]
    Wait(#[source] io::Error),

    #[error("predictor timed out after {0:?}")]
    Timeout(Duration),

    #[error("chain deadline of {0:?} reached before this attempt")]
    DeadlineExceeded(Duration),

    #[error("predictor exited with status {code:?}: {detail}")]
    NonZeroExit { code: Option<i32>, detail: String },

    #[error("malformed predictor output: {0}")]
    MalformedOutput(String),

    #[error("predictor reported error: {0}")]
    Reported(String),

    #[error("all predictor candidates failed: {}", describe_attempts(.0))]
    Exhausted(Vec<AttemptFailure>),
}

/// One failed step of a fallback chain.
#[derive(Debug)]
pub struct AttemptFailure {
    pub candidate: String,
    pub error: PredictorError,
}

fn describe_attempts(attempts: &[AttemptFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.candidate, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsagePredictor: Send + Sync {
    /// Label used in logs and aggregated failures
    fn label(&self) -> String;

    fn source(&self) -> PredictionSource;

    async fn predict(&self, input: &PredictionInput) -> Result<ModelPrediction, PredictorError>;
}

/// Ordered fallback chain of predictors; the first success wins.
pub struct ForecastEngine {
    stages: Vec<Arc<dyn UsagePredictor>>,
}

impl ForecastEngine {
    pub fn new(stages: Vec<Arc<dyn UsagePredictor>>) -> Self {
        Self { stages }
    }

    pub fn stage_labels(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.label()).collect()
    }

    pub async fn predict(
        &self,
        input: &PredictionInput,
    ) -> Result<(ModelPrediction, PredictionSource), PredictorError> {
        let mut failures = Vec::new();

        for stage in &self.stages {
            match stage.predict(input).await {
                Ok(prediction) => {
                    debug!(
                        stage = %stage.label(),
                        skipped = failures.len(),
                        "prediction obtained"
                    );
                    return Ok((prediction.normalized(), stage.source()));
                }
                Err(e) => {
                    warn!(stage = %stage.label(), error = %e, "predictor stage failed, falling back");
                    failures.push(AttemptFailure {
                        candidate: stage.label(),
                        error: e,
                    });
                }
            }
        }

        Err(PredictorError::Exhausted(failures))
    }
}
