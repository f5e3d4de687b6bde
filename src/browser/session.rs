use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::capabilities::{Capability, DEFAULT_CDP_ENDPOINT};
use super::driver::{ClickMethod, ClickOutcome, Connector, ElementState, PageDriver};
use super::launcher;
use crate::config::Credentials;
use crate::selectors::Locator;

/// A single CDP page plus the browser connection that owns it.
pub struct CdpPage {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: JoinHandle<()>,
    _profile_dir: Option<tempfile::TempDir>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PointerTarget {
    detached: bool,
    unobscured: bool,
    x: f64,
    y: f64,
}

impl CdpPage {
    async fn open(
        browser: Browser,
        handler_task: JoinHandle<()>,
        profile_dir: Option<tempfile::TempDir>,
    ) -> Result<Self> {
        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(anyhow!(e).context("Failed to create initial page"));
            }
        };

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
            _profile_dir: profile_dir,
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, js: String, what: &str) -> Result<T> {
        self.page
            .evaluate(js)
            .await
            .with_context(|| format!("Failed to evaluate {}", what))?
            .into_value()
            .with_context(|| format!("Failed to parse {} result", what))
    }

    async fn dispatch_mouse(&self, kind: DispatchMouseEventType, x: f64, y: f64) -> Result<()> {
        let is_move = matches!(kind, DispatchMouseEventType::MouseMoved);
        let mut builder = DispatchMouseEventParams::builder().r#type(kind).x(x).y(y);
        if !is_move {
            builder = builder.button(MouseButton::Left).click_count(1);
        }
        let params = builder.build().map_err(|e| anyhow!("{}", e))?;
        self.page
            .execute(params)
            .await
            .context("Failed to dispatch mouse event")?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn goto(&self, url: &str) -> Result<()> {
        tracing::info!("Navigating to: {}", url);
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn probe(&self, locator: &Locator) -> Result<ElementState> {
        let js = format!(
            r#"(() => {{
                const el = {selector_js};
                if (!el) return {{ present: false }};
                const style = getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                const visible = style.display !== 'none'
                    && style.visibility !== 'hidden'
                    && parseFloat(style.opacity) > 0
                    && rect.width > 0
                    && rect.height > 0;
                const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true';
                return {{
                    present: true,
                    visible: visible,
                    enabled: enabled,
                    checked: !!el.checked,
                    tag: el.tagName.toLowerCase()
                }};
            }})()"#,
            selector_js = locator.to_js()?
        );
        self.eval(js, "element probe").await
    }

    async fn click(&self, locator: &Locator, method: ClickMethod) -> Result<ClickOutcome> {
        let selector_js = locator.to_js()?;

        if method == ClickMethod::Direct {
            let js = format!(
                r#"(() => {{
                    const el = {selector_js};
                    if (!el) return false;
                    el.click();
                    return true;
                }})()"#
            );
            let clicked: bool = self.eval(js, "direct click").await?;
            return Ok(if clicked {
                ClickOutcome::Activated
            } else {
                ClickOutcome::Detached
            });
        }

        let js = format!(
            r#"(() => {{
                const el = {selector_js};
                if (!el) return {{ detached: true }};
                el.scrollIntoView({{ block: 'center', inline: 'center', behavior: 'instant' }});
                const rect = el.getBoundingClientRect();
                const x = rect.left + rect.width / 2;
                const y = rect.top + rect.height / 2;
                const topEl = document.elementFromPoint(x, y);
                const unobscured = !!topEl && (el === topEl || el.contains(topEl) || topEl.contains(el));
                return {{ detached: false, unobscured: unobscured, x: x, y: y }};
            }})()"#
        );
        let target: PointerTarget = self.eval(js, "click target").await?;

        if target.detached {
            return Ok(ClickOutcome::Detached);
        }
        if !target.unobscured {
            return Ok(ClickOutcome::Obscured);
        }

        self.dispatch_mouse(DispatchMouseEventType::MouseMoved, target.x, target.y)
            .await?;
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, target.x, target.y)
            .await?;
        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, target.x, target.y)
            .await?;
        Ok(ClickOutcome::Activated)
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const el = {selector_js};
                if (!el) throw new Error('Element not found: ' + {desc});
                el.focus();
                const proto = el.tagName === 'TEXTAREA'
                    ? window.HTMLTextAreaElement.prototype
                    : el.tagName === 'SELECT'
                        ? window.HTMLSelectElement.prototype
                        : window.HTMLInputElement.prototype;
                const setter = Object.getOwnPropertyDescriptor(proto, 'value')?.set;
                if (setter) {{
                    setter.call(el, {value});
                }} else {{
                    el.value = {value};
                }}
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            selector_js = locator.to_js()?,
            desc = serde_json::to_string(&locator.to_string())?,
            value = serde_json::to_string(value)?
        );
        let _: bool = self.eval(js, "fill").await?;
        Ok(())
    }

    async fn texts(&self, locator: &Locator) -> Result<Vec<String>> {
        let js = format!(
            r#"(() => {}.map(el => (el.textContent || '').trim()))()"#,
            locator.to_js_all()?
        );
        self.eval(js, "text lookup").await
    }

    async fn page_source(&self) -> Result<String> {
        self.page.content().await.context("Failed to read page source")
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(
                CaptureScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await
            .context("Failed to take screenshot")
    }

    async fn close(&self) -> Result<()> {
        let browser = self.browser.lock().await.take();
        let result = match browser {
            Some(mut browser) => {
                let closed = browser.close().await.context("Failed to close browser");
                // Reaps the child process for local launches; remote connections return at once.
                let _ = browser.wait().await;
                closed.map(|_| ())
            }
            None => Ok(()),
        };
        self.handler_task.abort();
        result
    }
}

/// Connects to the vendor's remote CDP endpoint.
pub struct VendorConnector {
    endpoint: String,
}

impl VendorConnector {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for VendorConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CDP_ENDPOINT)
    }
}

#[async_trait]
impl Connector for VendorConnector {
    async fn connect(
        &self,
        capability: &Capability,
        credentials: Option<&Credentials>,
    ) -> Result<Box<dyn PageDriver>> {
        let credentials =
            credentials.context("Vendor sessions need SERVICE_USERNAME and SERVICE_ACCESS_KEY")?;
        tracing::info!(
            "Opening remote session '{}' via {}",
            capability.name,
            self.endpoint
        );

        let url = capability.endpoint_url(&self.endpoint, credentials);
        let (browser, mut handler) = Browser::connect(url)
            .await
            .with_context(|| format!("Failed to connect to {}", self.endpoint))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler error: {}", e);
                }
            }
        });

        let page = CdpPage::open(browser, handler_task, None).await?;
        Ok(Box::new(page))
    }
}

/// Launches a local Chrome; for development runs and fixture tests.
pub struct LocalConnector {
    headless: bool,
}

impl LocalConnector {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    fn requires_credentials(&self) -> bool {
        false
    }

    async fn connect(
        &self,
        capability: &Capability,
        _credentials: Option<&Credentials>,
    ) -> Result<Box<dyn PageDriver>> {
        let chrome = launcher::find_chrome_binary()?;
        let profile_dir = tempfile::tempdir().context("Failed to create Chrome profile dir")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .user_data_dir(profile_dir.path())
            .window_size(1280, 720)
            .args(launcher::local_chrome_args(self.headless));
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(|e| anyhow!("{}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chrome")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler error: {}", e);
                }
            }
        });

        tracing::info!(
            "Local browser started for '{}' (headless: {})",
            capability.name,
            self.headless
        );

        let page = CdpPage::open(browser, handler_task, Some(profile_dir)).await?;
        Ok(Box::new(page))
    }
}
