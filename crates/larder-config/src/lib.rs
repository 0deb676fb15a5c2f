//! Configuration system for Larder.
//!
//! Provides TOML-based configuration with:
//! - Optional maintenance threshold overrides (`[maintenance]`)
//! - Store location and log output settings
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    load_config, load_config_file, load_config_with_options, save_config, xdg_config_dir,
    xdg_config_path, ConfigSource, LoadedConfig,
};
pub use error::{ConfigError, Result};
pub use types::*;
