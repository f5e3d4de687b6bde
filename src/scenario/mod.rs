//! The login → filter → favorite → verify scenario.
//!
//! [`ScenarioRunner::run`] owns the session for one execution: it opens it,
//! walks the steps in order, and closes it on every exit path. The step
//! methods are public so a harness can drive them individually.

pub mod artifacts;
pub mod report;
pub mod storefront;

use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::browser::{Capability, Connector, PageDriver, Session};
use crate::config::{
    Credentials, ScenarioPlan, StorefrontLogin, Timeouts, ACCESS_KEY_ENV, USERNAME_ENV,
};
use crate::error::{Result, ScenarioError};
use crate::interaction::wait::{wait_checked, wait_for_texts, wait_present, wait_visible};
use crate::interaction::{activate, choose_value, poll_until, wait_gone, wait_ready};

pub use report::{AssertionOutcome, ScenarioReport};
pub use storefront::Storefront;

/// Favorites counter before and after a favorite toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterChange {
    pub before: u32,
    pub after: u32,
}

enum SignInSignal {
    SignedIn,
    Rejected(String),
}

pub struct ScenarioRunner {
    connector: Arc<dyn Connector>,
    storefront: Storefront,
    timeouts: Timeouts,
    artifacts_dir: Option<PathBuf>,
}

impl ScenarioRunner {
    pub fn new(connector: Arc<dyn Connector>, storefront: Storefront) -> Self {
        Self {
            connector,
            storefront,
            timeouts: Timeouts::default(),
            artifacts_dir: None,
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    /// Open a session and wait for the storefront to render.
    ///
    /// Credentials are checked before anything is opened. If the page never
    /// becomes ready, the new session is closed before the error returns.
    pub async fn initialize(
        &self,
        capability: &Capability,
        credentials: Option<&Credentials>,
    ) -> Result<Session> {
        if self.connector.requires_credentials() {
            let credentials = credentials.ok_or_else(|| {
                ScenarioError::Configuration(format!(
                    "{} and {} must be set",
                    USERNAME_ENV, ACCESS_KEY_ENV
                ))
            })?;
            credentials.validate()?;
        }

        let driver = self.connector.connect(capability, credentials).await?;
        let mut session = Session::new(driver, capability.name.clone());

        if let Err(e) = self.await_ready(session.driver()).await {
            if let Err(close_err) = session.close().await {
                tracing::warn!("Failed to close session after startup error: {:#}", close_err);
            }
            return Err(e);
        }
        Ok(session)
    }

    async fn await_ready(&self, driver: &dyn PageDriver) -> Result<()> {
        driver.goto(&self.storefront.entry_url).await?;
        tracing::info!("Navigated to {}", driver.current_url().await?);

        let ready = storefront::ready_signal();
        let phases = self.timeouts.ready_phases();
        let waited = async {
            wait_present(driver, &ready, phases.presence, phases.poll_interval).await?;
            wait_visible(driver, &ready, phases.visibility, phases.poll_interval).await
        }
        .await;

        match waited {
            Ok(_) => {
                tracing::info!("Application ready ({} visible)", ready);
                Ok(())
            }
            Err(e) => {
                let url = driver.current_url().await.unwrap_or_default();
                let source = driver.page_source().await.unwrap_or_default();
                tracing::warn!("Current URL during load error: {}", url);
                tracing::warn!(
                    "Page source during load error (first 500 chars): {}",
                    artifacts::excerpt(&source, 500)
                );
                Err(ScenarioError::EnvironmentNotReady(format!("{} (at {})", e, url)))
            }
        }
    }

    /// Sign in and wait for the storefront to confirm or reject it.
    pub async fn authenticate(&self, session: &Session, login: &StorefrontLogin) -> Result<()> {
        let driver = session.driver();
        let phases = self.timeouts.phases();

        choose_value(
            driver,
            &storefront::username_control(),
            &storefront::dropdown_option(&login.username),
            &login.username,
            &phases,
        )
        .await?;
        choose_value(
            driver,
            &storefront::password_control(),
            &storefront::dropdown_option(&login.password),
            &login.password,
            &phases,
        )
        .await?;
        activate(driver, &storefront::login_button(), &phases).await?;
        tracing::info!("Submitted sign-in form as {}", login.username);

        let error = storefront::login_error();
        let marker = storefront::signed_in_marker(&login.username);
        let (error, marker, site) = (&error, &marker, &self.storefront);
        let signal = poll_until(
            self.timeouts.auth_verification,
            self.timeouts.poll_interval,
            move || async move {
                if driver.probe(marker).await?.visible {
                    return Ok(Some(SignInSignal::SignedIn));
                }
                let url = driver.current_url().await?;
                if site.left_sign_in(&url) {
                    return Ok(Some(SignInSignal::SignedIn));
                }
                // Only a visible alert counts; hidden route announcers also hold text.
                if driver.probe(error).await?.visible {
                    if let Some(text) = driver.text(error).await? {
                        if !text.is_empty() {
                            return Ok(Some(SignInSignal::Rejected(text)));
                        }
                    }
                }
                Ok::<_, anyhow::Error>(None)
            },
        )
        .await;

        match signal {
            Some(SignInSignal::SignedIn) => {
                tracing::info!("Sign-in confirmed for {}", login.username);
                Ok(())
            }
            Some(SignInSignal::Rejected(text)) => Err(ScenarioError::Authentication(text)),
            None => Err(ScenarioError::VerificationTimeout {
                what: format!("sign-in confirmation for {}", login.username),
                timeout: self.timeouts.auth_verification,
            }),
        }
    }

    /// Tick the brand filter and wait for the filtered catalog.
    /// Returns how many products are listed afterwards.
    ///
    /// The catalog counts as filtered once the checkbox is checked, any
    /// spinner has cleared, and the listing differs from the one shown
    /// before the click.
    pub async fn apply_filter(&self, session: &Session, label: &str) -> Result<usize> {
        let driver = session.driver();
        let interval = self.timeouts.poll_interval;
        let titles_locator = storefront::product_titles();

        let unfiltered = driver.texts(&titles_locator).await?;
        activate(driver, &storefront::brand_filter(label), &self.timeouts.phases()).await?;
        tracing::info!("Selected '{}' filter", label);

        wait_checked(
            driver,
            &storefront::brand_filter_input(label),
            self.timeouts.interactable,
            interval,
        )
        .await?;
        wait_gone(driver, &storefront::loading_indicator(), self.timeouts.loading, interval).await?;

        let titles = wait_for_texts(driver, &titles_locator, self.timeouts.presence, interval, |titles| {
            !titles.is_empty() && titles != unfiltered.as_slice()
        })
        .await
        .ok_or_else(|| {
            ScenarioError::timeout(
                format!("catalog to change after filtering by '{}'", label),
                self.timeouts.presence,
            )
        })?;

        tracing::info!("{} product(s) listed for '{}'", titles.len(), label);
        Ok(titles.len())
    }

    /// Click the heart on `name`'s card and wait for the counter to rise.
    pub async fn favorite_item(&self, session: &Session, name: &str) -> Result<CounterChange> {
        let driver = session.driver();
        let phases = self.timeouts.phases();
        let counter = storefront::favorites_counter();

        let before = read_counter(driver.text(&counter).await?);

        wait_ready(driver, &storefront::product_title(name), &phases).await?;
        activate(driver, &storefront::favorite_toggle(name), &phases).await?;
        tracing::info!("Clicked favorite toggle for '{}'", name);

        wait_present(driver, &counter, self.timeouts.counter, self.timeouts.poll_interval).await?;
        let counter = &counter;
        let after = poll_until(
            self.timeouts.counter,
            self.timeouts.poll_interval,
            move || async move {
                let count = read_counter(driver.text(counter).await?);
                Ok::<_, anyhow::Error>((count > before).then_some(count))
            },
        )
        .await
        .ok_or_else(|| {
            ScenarioError::timeout(
                format!("favorites counter to rise above {}", before),
                self.timeouts.counter,
            )
        })?;

        tracing::info!("Favorites count updated from {} to {}", before, after);
        Ok(CounterChange { before, after })
    }

    /// Open the favorites view and check `name` is the only item on it.
    ///
    /// A mismatch is a failed outcome, not an error.
    pub async fn verify_favorite(&self, session: &Session, name: &str) -> Result<AssertionOutcome> {
        let driver = session.driver();
        let interval = self.timeouts.poll_interval;

        let link = storefront::favorites_link();
        match wait_present(driver, &link, self.timeouts.presence, interval).await {
            Ok(_) => {
                activate(driver, &link, &self.timeouts.phases()).await?;
            }
            Err(ScenarioError::ElementNotFound(_)) => {
                tracing::info!("No favorites link, navigating directly");
                driver.goto(&self.storefront.favorites_url).await?;
            }
            Err(e) => return Err(e),
        }

        let titles_locator = storefront::product_titles();
        let titles = match wait_for_texts(
            driver,
            &titles_locator,
            self.timeouts.favorites_view,
            interval,
            |titles| titles.iter().any(|t| t.contains(name)),
        )
        .await
        {
            Some(titles) => titles,
            None => driver.texts(&titles_locator).await?,
        };

        Ok(favorites_outcome(name, &titles))
    }

    /// Close the session. Safe to call more than once.
    pub async fn teardown(&self, session: &mut Session) -> Result<()> {
        session.close().await?;
        Ok(())
    }

    /// Run the whole scenario on a fresh session.
    ///
    /// The session is closed whether or not a step fails; a step error
    /// takes precedence over a teardown error.
    pub async fn run(
        &self,
        capability: &Capability,
        credentials: Option<&Credentials>,
        plan: &ScenarioPlan,
    ) -> Result<ScenarioReport> {
        let mut report = ScenarioReport::new(&capability.name);
        self.run_into(capability, credentials, plan, &mut report).await?;
        Ok(report)
    }

    /// Like [`run`](Self::run), but records into `report` so the outcomes
    /// gathered before a failing step survive it. The error is also
    /// stored on the report.
    pub async fn run_into(
        &self,
        capability: &Capability,
        credentials: Option<&Credentials>,
        plan: &ScenarioPlan,
        report: &mut ScenarioReport,
    ) -> Result<()> {
        let result = self.run_session(capability, credentials, plan, report).await;
        if let Err(e) = &result {
            report.error = Some(e.to_string());
        }
        result
    }

    async fn run_session(
        &self,
        capability: &Capability,
        credentials: Option<&Credentials>,
        plan: &ScenarioPlan,
        report: &mut ScenarioReport,
    ) -> Result<()> {
        let mut session = self.initialize(capability, credentials).await?;

        let steps = self.run_steps(&session, plan, report).await;
        if let Err(e) = &steps {
            tracing::error!("Scenario step failed: {}", e);
            self.capture_failure(&session).await;
        }

        let closed = self.teardown(&mut session).await;
        steps?;
        closed
    }

    async fn run_steps(
        &self,
        session: &Session,
        plan: &ScenarioPlan,
        report: &mut ScenarioReport,
    ) -> Result<()> {
        self.authenticate(session, &plan.login).await?;
        report.record(AssertionOutcome::pass(
            "signed in",
            format!("'{}' shown after sign-in", plan.login.username),
        ));

        let listed = self.apply_filter(session, &plan.brand).await?;
        let checked = session
            .driver()
            .probe(&storefront::brand_filter_input(&plan.brand))
            .await?
            .checked;
        report.record(AssertionOutcome::expect(
            "brand filter applied",
            checked && listed > 0,
            format!(
                "'{}' checked: {}, {} product(s) listed",
                plan.brand, checked, listed
            ),
        ));

        let change = self.favorite_item(session, &plan.item).await?;
        report.record(AssertionOutcome::expect(
            "favorites counter incremented",
            change.after == change.before + 1,
            format!("counter went from {} to {}", change.before, change.after),
        ));

        report.record(self.verify_favorite(session, &plan.item).await?);
        Ok(())
    }

    async fn capture_failure(&self, session: &Session) {
        let Some(dir) = &self.artifacts_dir else {
            return;
        };
        match artifacts::capture_failure(session.driver(), dir, session.capability()).await {
            Ok(path) => tracing::info!("Saved failure screenshot to {}", path.display()),
            Err(e) => tracing::warn!("Could not capture failure screenshot: {:#}", e),
        }
    }
}

/// Parse the favorites counter text; a missing or non-numeric counter reads as 0.
pub fn read_counter(text: Option<String>) -> u32 {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("valid digits regex"));
    text.as_deref()
        .and_then(|t| digits.find(t))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Pass iff the favorites view lists exactly one item and it is `name`.
pub fn favorites_outcome(name: &str, titles: &[String]) -> AssertionOutcome {
    const CHECK: &str = "favorites view";
    match titles {
        [only] if only.contains(name) => {
            AssertionOutcome::pass(CHECK, format!("'{}' is the only favorite", only))
        }
        _ => AssertionOutcome::fail(
            CHECK,
            format!(
                "expected only '{}', found {} item(s): {:?}",
                name,
                titles.len(),
                titles
            ),
        ),
    }
}
