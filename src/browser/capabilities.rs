use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Credentials;

pub const DEFAULT_CDP_ENDPOINT: &str = "wss://cdp.browserstack.com/puppeteer";

const BUILD_NAME: &str = "BSTACK Tech Challenge";
const SESSION_NAME: &str = "Tech Challenge Test";

/// The fixed set of remote environments the scenario can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CapabilityPreset {
    /// Windows 10, Chrome
    WindowsChrome,
    /// OS X Ventura, Firefox
    MacosFirefox,
    /// Samsung Galaxy S22 real device
    GalaxyS22,
}

impl CapabilityPreset {
    pub fn descriptor(self) -> Capability {
        let base = Capability {
            name: String::new(),
            os: None,
            os_version: None,
            browser_name: String::new(),
            device: None,
            real_mobile: false,
            build: BUILD_NAME.into(),
            session_name: SESSION_NAME.into(),
            debug: true,
            network_logs: true,
        };
        match self {
            Self::WindowsChrome => Capability {
                name: "windows-chrome".into(),
                os: Some("Windows".into()),
                os_version: Some("10".into()),
                browser_name: "Chrome".into(),
                ..base
            },
            Self::MacosFirefox => Capability {
                name: "macos-firefox".into(),
                os: Some("OS X".into()),
                os_version: Some("Ventura".into()),
                browser_name: "Firefox".into(),
                ..base
            },
            Self::GalaxyS22 => Capability {
                name: "galaxy-s22".into(),
                device: Some("Samsung Galaxy S22".into()),
                real_mobile: true,
                browser_name: "Android".into(),
                ..base
            },
        }
    }
}

/// Immutable description of one remote environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capability {
    pub name: String,
    pub os: Option<String>,
    pub os_version: Option<String>,
    pub browser_name: String,
    pub device: Option<String>,
    pub real_mobile: bool,
    pub build: String,
    pub session_name: String,
    pub debug: bool,
    pub network_logs: bool,
}

impl Capability {
    /// The vendor's caps object, credentials included.
    pub fn vendor_caps(&self, credentials: &Credentials) -> Value {
        let mut caps = json!({
            "browserName": self.browser_name,
            "build": self.build,
            "name": self.session_name,
            "browserstack.debug": self.debug,
            "browserstack.networkLogs": self.network_logs,
            "browserstack.username": credentials.username,
            "browserstack.accessKey": credentials.access_key,
        });
        if let Some(os) = &self.os {
            caps["os"] = json!(os);
        }
        if let Some(os_version) = &self.os_version {
            caps["os_version"] = json!(os_version);
        }
        if let Some(device) = &self.device {
            caps["device"] = json!(device);
        }
        if self.real_mobile {
            caps["realMobile"] = json!("true");
        }
        caps
    }

    /// Websocket URL for the vendor's CDP endpoint with caps in the query string.
    pub fn endpoint_url(&self, endpoint: &str, credentials: &Credentials) -> String {
        let caps = self.vendor_caps(credentials).to_string();
        format!("{}?caps={}", endpoint, urlencoding::encode(&caps))
    }
}
