//! Application wiring: asset loading, the fixed-rate timer, per-user
//! directories and the headless world run.

pub mod assets;
pub mod demo;
pub mod game_loop;
pub mod platform;

pub use demo::{DemoError, DemoSummary, run_headless};
pub use game_loop::FixedTimestep;
pub use platform::{PlatformDirs, PlatformError};
