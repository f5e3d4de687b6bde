use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Install locations checked before a `PATH` lookup.
#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"];
#[cfg(not(target_os = "macos"))]
const INSTALL_PATHS: &[&str] = &["/usr/bin/google-chrome", "/usr/bin/chromium"];

const PATH_NAMES: &[&str] = &["google-chrome", "chromium", "chrome"];

/// Locate Chrome for a local run: `CHROME_PATH`, then [`INSTALL_PATHS`],
/// then `PATH`.
pub fn find_chrome_binary() -> Result<PathBuf> {
    let from_env = std::env::var_os("CHROME_PATH").map(PathBuf::from);
    let installed = INSTALL_PATHS.iter().map(PathBuf::from);
    if let Some(path) = from_env.into_iter().chain(installed).find(|p| p.exists()) {
        tracing::info!("Using Chrome at {}", path.display());
        return Ok(path);
    }

    PATH_NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| anyhow!("No local Chrome found; set CHROME_PATH"))
}

/// Extra Chrome switches for local runs. The profile directory and window
/// size are set on the config builder.
pub fn local_chrome_args(headless: bool) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-first-run".into(),
        "--no-default-browser-check".into(),
        "--disable-background-networking".into(),
        "--disable-default-apps".into(),
        "--disable-extensions".into(),
        "--disable-popup-blocking".into(),
        "--disable-sync".into(),
        "--disable-translate".into(),
    ];

    if headless {
        args.push("--headless=new".into());
    }

    args
}
