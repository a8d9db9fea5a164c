//! External predictor adapter
//!
//! Runs `<interpreter> <script> <payload-json>` for each configured script in
//! order and accepts the first answer that parses as a [`ModelPrediction`].
//! Every attempt is bounded by its own timeout and by one deadline shared by
//! the whole chain; the child is killed when the wait future is dropped.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use super::engine::{AttemptFailure, PredictorError, UsagePredictor};
use crate::config::PredictorConfig;
use crate::domain::{ModelPrediction, PredictionInput, PredictionSource};

const STDERR_TAIL_CHARS: usize = 512;

/// JSON argument handed to predictor scripts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictorPayload {
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    pub prediction_date: String,
    pub model_type: String,
}

impl From<&PredictionInput> for PredictorPayload {
    fn from(input: &PredictionInput) -> Self {
        Self {
            state: input.region.clone(),
            lat: input.latitude,
            lon: input.longitude,
            prediction_date: input.target_date.format("%Y-%m-%d").to_string(),
            model_type: input.model.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExternalPredictor {
    enabled: bool,
    interpreter: String,
    scripts: Vec<PathBuf>,
    timeout: Duration,
    chain_timeout: Duration,
}

impl ExternalPredictor {
    pub fn new(cfg: &PredictorConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            interpreter: cfg.interpreter.clone(),
            scripts: cfg.scripts.clone(),
            timeout: cfg.timeout(),
            chain_timeout: cfg.chain_timeout(),
        }
    }

    async fn run_script(
        &self,
        script: &Path,
        payload: &str,
        limit: Duration,
    ) -> Result<ModelPrediction, PredictorError> {
        if tokio::fs::metadata(script).await.is_err() {
            return Err(PredictorError::ScriptMissing(script.to_path_buf()));
        }

        let child = Command::new(&self.interpreter)
            .arg(script)
            .arg(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PredictorError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(result) => result.map_err(PredictorError::Wait)?,
            Err(_) => return Err(PredictorError::Timeout(limit)),
        };

        if !output.status.success() {
            return Err(PredictorError::NonZeroExit {
                code: output.status.code(),
                detail: stderr_tail(&output.stderr),
            });
        }

        parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse predictor stdout. Exactly one JSON object is accepted.
pub fn parse_output(stdout: &str) -> Result<ModelPrediction, PredictorError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(PredictorError::MalformedOutput("empty output".to_string()));
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| PredictorError::MalformedOutput(e.to_string()))?;

    let Value::Object(map) = &value else {
        return Err(PredictorError::MalformedOutput(
            "output is not a JSON object".to_string(),
        ));
    };

    if let Some(error) = map.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(PredictorError::Reported(message));
    }

    let prediction: ModelPrediction = serde_json::from_value(value)
        .map_err(|e| PredictorError::MalformedOutput(e.to_string()))?;

    if !prediction.predicted_usage.is_finite() {
        return Err(PredictorError::MalformedOutput(
            "predicted_usage is not finite".to_string(),
        ));
    }

    Ok(prediction)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    text.chars().skip(count - STDERR_TAIL_CHARS).collect()
}

#[async_trait]
impl UsagePredictor for ExternalPredictor {
    fn label(&self) -> String {
        "external".to_string()
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::External
    }

    async fn predict(&self, input: &PredictionInput) -> Result<ModelPrediction, PredictorError> {
        if !self.enabled {
            return Err(PredictorError::Disabled);
        }
        if self.scripts.is_empty() {
            return Err(PredictorError::NoCandidates);
        }

        let payload = serde_json::to_string(&PredictorPayload::from(input))
            .map_err(|e| PredictorError::MalformedOutput(e.to_string()))?;

        let deadline = Instant::now() + self.chain_timeout;
        let mut failures = Vec::new();
        for script in &self.scripts {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(script = %script.display(), "chain deadline reached, skipping");
                failures.push(AttemptFailure {
                    candidate: script.display().to_string(),
                    error: PredictorError::DeadlineExceeded(self.chain_timeout),
                });
                continue;
            }

            debug!(script = %script.display(), region = %input.region, "invoking external predictor");
            match self.run_script(script, &payload, self.timeout.min(remaining)).await {
                Ok(prediction) => {
                    info!(
                        script = %script.display(),
                        model = %prediction.model_type,
                        "external prediction accepted"
                    );
                    return Ok(prediction);
                }
                Err(e) => {
                    warn!(script = %script.display(), error = %e, "external predictor attempt failed");
                    failures.push(AttemptFailure {
                        candidate: script.display().to_string(),
                        error: e,
                    });
                }
            }
        }

        Err(PredictorError::Exhausted(failures))
    }
}
