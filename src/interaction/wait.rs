use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::browser::{ElementState, PageDriver};
use crate::error::{Result, ScenarioError};
use crate::selectors::Locator;

/// Bounds for the presence → visibility → interactability wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimeouts {
    pub presence: Duration,
    pub visibility: Duration,
    pub interactable: Duration,
    pub poll_interval: Duration,
}

/// Poll `check` until it yields a value or `timeout` elapses.
///
/// The check always runs at least once. Errors from the check count as
/// "not yet" so a transient transport hiccup does not abort the wait.
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match check().await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => tracing::debug!("Wait condition check failed: {:#}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

async fn wait_for_state<P>(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
    accept: P,
) -> Option<ElementState>
where
    P: Fn(&ElementState) -> bool,
{
    let accept = &accept;
    poll_until(timeout, interval, move || async move {
        let state = driver.probe(locator).await?;
        Ok::<_, anyhow::Error>(accept(&state).then_some(state))
    })
    .await
}

/// Phase 1: the element exists in the document.
pub async fn wait_present(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
) -> Result<ElementState> {
    wait_for_state(driver, locator, timeout, interval, |s| s.present)
        .await
        .ok_or_else(|| ScenarioError::ElementNotFound(locator.to_string()))
}

/// Phase 2: the element is rendered with a non-empty box.
pub async fn wait_visible(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
) -> Result<ElementState> {
    wait_for_state(driver, locator, timeout, interval, |s| s.present && s.visible)
        .await
        .ok_or_else(|| ScenarioError::timeout(format!("{} to become visible", locator), timeout))
}

/// Phase 3: the element is visible and not disabled.
pub async fn wait_interactable(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
) -> Result<ElementState> {
    wait_for_state(driver, locator, timeout, interval, |s| {
        s.present && s.visible && s.enabled
    })
    .await
    .ok_or_else(|| ScenarioError::timeout(format!("{} to become enabled", locator), timeout))
}

/// Run all three phases in order, each against its own bound.
pub async fn wait_ready(
    driver: &dyn PageDriver,
    locator: &Locator,
    phases: &PhaseTimeouts,
) -> Result<ElementState> {
    wait_present(driver, locator, phases.presence, phases.poll_interval).await?;
    wait_visible(driver, locator, phases.visibility, phases.poll_interval).await?;
    wait_interactable(driver, locator, phases.interactable, phases.poll_interval).await
}

/// Wait for an element to be absent or hidden, e.g. a loading spinner.
pub async fn wait_gone(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    wait_for_state(driver, locator, timeout, interval, |s| !s.present || !s.visible)
        .await
        .map(|_| ())
        .ok_or_else(|| ScenarioError::timeout(format!("{} to clear", locator), timeout))
}

/// Wait for a checkbox or radio to report `checked`.
pub async fn wait_checked(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
) -> Result<ElementState> {
    wait_for_state(driver, locator, timeout, interval, |s| s.present && s.checked)
        .await
        .ok_or_else(|| ScenarioError::timeout(format!("{} to become checked", locator), timeout))
}

/// Wait until the texts of every element matching `locator` satisfy `accept`.
pub async fn wait_for_texts<P>(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
    accept: P,
) -> Option<Vec<String>>
where
    P: Fn(&[String]) -> bool,
{
    let accept = &accept;
    poll_until(timeout, interval, move || async move {
        let texts = driver.texts(locator).await?;
        Ok::<_, anyhow::Error>(accept(&texts).then_some(texts))
    })
    .await
}
