use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Result of one verification point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionOutcome {
    pub check: String,
    pub passed: bool,
    pub detail: String,
}

impl AssertionOutcome {
    pub fn pass(check: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::expect(check, true, detail)
    }

    pub fn fail(check: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::expect(check, false, detail)
    }

    pub fn expect(check: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed,
            detail: detail.into(),
        }
    }
}

/// Every outcome of one scenario execution.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub capability: String,
    pub outcomes: Vec<AssertionOutcome>,
    /// The step error that ended the run early, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioReport {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            outcomes: Vec::new(),
            error: None,
        }
    }

    pub fn record(&mut self, outcome: AssertionOutcome) {
        if outcome.passed {
            tracing::info!("PASS {}: {}", outcome.check, outcome.detail);
        } else {
            tracing::warn!("FAIL {}: {}", outcome.check, outcome.detail);
        }
        self.outcomes.push(outcome);
    }

    /// An empty or aborted report does not pass.
    pub fn passed(&self) -> bool {
        self.error.is_none()
            && !self.outcomes.is_empty()
            && self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub async fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}
