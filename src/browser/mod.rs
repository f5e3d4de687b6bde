pub mod capabilities;
pub mod driver;
pub mod launcher;
pub mod session;

pub use capabilities::{Capability, CapabilityPreset};
pub use driver::{ClickMethod, ClickOutcome, Connector, ElementState, PageDriver, Session};
pub use session::{CdpPage, LocalConnector, VendorConnector};
