//! Display configuration
//!
//! Configuration is compiled into the firmware as TOML text and parsed at
//! startup with [`parse_config`]. Anything not mentioned keeps its default.

pub mod parse;
pub mod types;

pub use parse::parse_config;
pub use types::{
    ConfigError, DisplayConfig, LoopConfig, PanelConfig, RefreshConfig, TouchConfig,
    MAX_NAME_LEN,
};
