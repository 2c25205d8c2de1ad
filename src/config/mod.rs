//! Configuration loading and parsing for pullcdn.
//!
//! This module handles:
//! - TOML settings file parsing
//! - Directory cascade discovery
//! - Per-key merging and environment overrides

pub mod cascade;
pub mod parser;
pub mod template;
pub mod types;

pub use cascade::{
	CONFIG_FILE_NAME, ENV_CDN_HOST, ENV_DISABLE, ENV_UPLOADS_ONLY, apply_env_overrides,
	discover_configs, is_truthy, load_config_file, load_merged_config, merge_configs,
	user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use template::generate_init_template;
pub use types::{Config, LoadedConfig, MergedConfig, Setting, SettingSource, Toggle};
