use std::fmt;
use std::time::Duration;

use crate::error::{Result, ScenarioError};
use crate::interaction::wait::PhaseTimeouts;

pub const USERNAME_ENV: &str = "SERVICE_USERNAME";
pub const ACCESS_KEY_ENV: &str = "SERVICE_ACCESS_KEY";

/// Vendor account credentials. Never logged: `Debug` redacts the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub access_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            access_key: access_key.into(),
        }
    }

    /// Read `SERVICE_USERNAME` / `SERVICE_ACCESS_KEY` from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USERNAME_ENV).filter(|v| !v.trim().is_empty())?;
        let access_key = lookup(ACCESS_KEY_ENV).filter(|v| !v.trim().is_empty())?;
        Some(Self::new(username, access_key))
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(ScenarioError::Configuration(format!(
                "{} is empty",
                USERNAME_ENV
            )));
        }
        if self.access_key.trim().is_empty() {
            return Err(ScenarioError::Configuration(format!(
                "{} is empty",
                ACCESS_KEY_ENV
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("access_key", &"<redacted>")
            .finish()
    }
}

/// The storefront account used to sign in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontLogin {
    pub username: String,
    pub password: String,
}

impl Default for StorefrontLogin {
    fn default() -> Self {
        Self {
            username: "demouser".into(),
            password: "testingisfun99".into(),
        }
    }
}

/// Every bound the scenario waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub poll_interval: Duration,
    pub presence: Duration,
    pub visibility: Duration,
    pub interactable: Duration,
    pub ready_presence: Duration,
    pub ready_visibility: Duration,
    pub auth_verification: Duration,
    pub loading: Duration,
    pub counter: Duration,
    pub favorites_view: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            presence: Duration::from_secs(15),
            visibility: Duration::from_secs(5),
            interactable: Duration::from_secs(5),
            ready_presence: Duration::from_secs(20),
            ready_visibility: Duration::from_secs(10),
            auth_verification: Duration::from_secs(30),
            loading: Duration::from_secs(10),
            counter: Duration::from_secs(10),
            favorites_view: Duration::from_secs(15),
        }
    }
}

impl Timeouts {
    /// Bounds for the three-phase wait before any element interaction.
    pub fn phases(&self) -> PhaseTimeouts {
        PhaseTimeouts {
            presence: self.presence,
            visibility: self.visibility,
            interactable: self.interactable,
            poll_interval: self.poll_interval,
        }
    }

    /// Bounds for the application ready signal. There is no interactability
    /// phase for a root container.
    pub fn ready_phases(&self) -> PhaseTimeouts {
        PhaseTimeouts {
            presence: self.ready_presence,
            visibility: self.ready_visibility,
            interactable: Duration::ZERO,
            poll_interval: self.poll_interval,
        }
    }
}

/// What the scenario filters by and favorites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPlan {
    pub login: StorefrontLogin,
    pub brand: String,
    pub item: String,
}

impl Default for ScenarioPlan {
    fn default() -> Self {
        Self {
            login: StorefrontLogin::default(),
            brand: "Samsung".into(),
            item: "Galaxy S20+".into(),
        }
    }
}
