use crate::browser::PageDriver;
use crate::error::Result;
use crate::interaction::click::activate;
use crate::interaction::wait::{wait_ready, PhaseTimeouts};
use crate::selectors::Locator;

/// Put `value` into `control`.
///
/// Native inputs get the value set directly. Anything else is treated as a
/// composite dropdown: it is opened by activating it, then `option` (the
/// entry showing `value`) is activated.
pub async fn choose_value(
    driver: &dyn PageDriver,
    control: &Locator,
    option: &Locator,
    value: &str,
    phases: &PhaseTimeouts,
) -> Result<()> {
    let state = wait_ready(driver, control, phases).await?;

    if state.is_native_input() {
        driver.fill(control, value).await?;
        tracing::info!("Set {} directly", control);
        return Ok(());
    }

    activate(driver, control, phases).await?;
    tracing::debug!("Opened dropdown {}", control);
    activate(driver, option, phases).await?;
    tracing::info!("Selected option for {} from dropdown", control);
    Ok(())
}
