pub mod click;
pub mod input;
pub mod wait;

pub use click::activate;
pub use input::choose_value;
pub use wait::{poll_until, wait_gone, wait_ready, PhaseTimeouts};
