use std::time::Duration;

/// Every way a scenario step can fail.
///
/// Assertion mismatches are not errors; they are reported as failed
/// [`AssertionOutcome`](crate::scenario::report::AssertionOutcome)s so that
/// teardown and reporting proceed normally.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("environment not ready: {0}")]
    EnvironmentNotReady(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("timed out after {}ms waiting for {what}", timeout.as_millis())]
    Timeout { what: String, timeout: Duration },

    #[error("verification timed out after {}ms: {what}", timeout.as_millis())]
    VerificationTimeout { what: String, timeout: Duration },

    #[error("element obscured after direct activation fallback: {0}")]
    ElementObscured(String),

    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

impl ScenarioError {
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            timeout,
        }
    }

    /// True for failures caused by a slow page rather than a missing one.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::VerificationTimeout { .. })
    }
}

pub type Result<T, E = ScenarioError> = std::result::Result<T, E>;
