pub mod browser;
pub mod config;
pub mod error;
pub mod interaction;
pub mod scenario;
pub mod selectors;

pub use error::{Result, ScenarioError};
