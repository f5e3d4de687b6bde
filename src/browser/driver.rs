use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::capabilities::Capability;
use crate::config::Credentials;
use crate::selectors::Locator;

/// Snapshot of an element at the moment it was probed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementState {
    pub present: bool,
    pub visible: bool,
    pub enabled: bool,
    pub checked: bool,
    pub tag: Option<String>,
}

impl ElementState {
    pub fn absent() -> Self {
        Self::default()
    }

    /// Native form controls accept a value directly; anything else is
    /// treated as a composite widget that has to be opened and picked from.
    pub fn is_native_input(&self) -> bool {
        matches!(
            self.tag.as_deref(),
            Some("input") | Some("textarea") | Some("select")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickMethod {
    /// Real pointer events at the element's center.
    Pointer,
    /// `HTMLElement.click()` from script, bypassing hit testing.
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Activated,
    /// Another element sits on top of the target's center point.
    Obscured,
    /// The element disappeared between locating and clicking.
    Detached,
}

/// The operations the scenario needs from one browser page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn probe(&self, locator: &Locator) -> Result<ElementState>;

    async fn click(&self, locator: &Locator, method: ClickMethod) -> Result<ClickOutcome>;

    /// Set the value of a native input and fire `input`/`change`.
    async fn fill(&self, locator: &Locator, value: &str) -> Result<()>;

    /// Trimmed text content of every element matching `locator`.
    async fn texts(&self, locator: &Locator) -> Result<Vec<String>>;

    async fn text(&self, locator: &Locator) -> Result<Option<String>> {
        Ok(self.texts(locator).await?.into_iter().next())
    }

    async fn page_source(&self) -> Result<String>;

    /// PNG bytes of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    async fn close(&self) -> Result<()>;
}

/// Opens pages in the environment a capability describes.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Whether vendor credentials are needed to connect.
    fn requires_credentials(&self) -> bool {
        true
    }

    async fn connect(
        &self,
        capability: &Capability,
        credentials: Option<&Credentials>,
    ) -> Result<Box<dyn PageDriver>>;
}

/// One live browser session, closed exactly once.
pub struct Session {
    driver: Box<dyn PageDriver>,
    capability: String,
    closed: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("capability", &self.capability)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(driver: Box<dyn PageDriver>, capability: impl Into<String>) -> Self {
        Self {
            driver,
            capability: capability.into(),
            closed: false,
        }
    }

    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the underlying browser. Later calls are no-ops.
    ///
    /// The session counts as closed even when the driver reports an error,
    /// so a failed close is never retried.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            tracing::debug!("Session for {} already closed", self.capability);
            return Ok(());
        }
        self.closed = true;
        tracing::info!("Closing browser session ({})", self.capability);
        self.driver.close().await
    }
}
