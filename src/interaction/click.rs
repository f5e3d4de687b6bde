use crate::browser::{ClickMethod, ClickOutcome, PageDriver};
use crate::error::{Result, ScenarioError};
use crate::interaction::wait::{wait_ready, PhaseTimeouts};
use crate::selectors::Locator;

/// Wait for `locator` to be ready, then click it.
///
/// Pointer events come first. If another element covers the target's
/// center, the click is retried exactly once with a direct script
/// activation; a second failure is fatal for the step.
pub async fn activate(
    driver: &dyn PageDriver,
    locator: &Locator,
    phases: &PhaseTimeouts,
) -> Result<ClickMethod> {
    wait_ready(driver, locator, phases).await?;

    match driver.click(locator, ClickMethod::Pointer).await? {
        ClickOutcome::Activated => {
            tracing::debug!("Clicked {} (pointer)", locator);
            return Ok(ClickMethod::Pointer);
        }
        ClickOutcome::Detached => {
            return Err(ScenarioError::ElementNotFound(locator.to_string()));
        }
        ClickOutcome::Obscured => {
            tracing::warn!("{} is obscured, falling back to direct activation", locator);
        }
    }

    match driver.click(locator, ClickMethod::Direct).await? {
        ClickOutcome::Activated => {
            tracing::info!("Clicked {} (direct fallback)", locator);
            Ok(ClickMethod::Direct)
        }
        ClickOutcome::Detached => Err(ScenarioError::ElementNotFound(locator.to_string())),
        ClickOutcome::Obscured => Err(ScenarioError::ElementObscured(locator.to_string())),
    }
}
