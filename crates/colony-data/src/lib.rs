//! Data-driven configuration for the colony power network.
//!
//! Settings live in RON, TOML, or JSON files; the format is picked from the
//! file extension. Loaded data is validated and resolved into the runtime
//! types of `colony-power`.

pub mod config;
pub mod loader;

pub use config::{PowerConfigData, load_power_config};
pub use loader::{DataLoadError, Format};
