use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, MergedConfig, Setting, SettingSource, Toggle};
use crate::error::{CdnError, Result};
use std::path::{Path, PathBuf};

/// Name of the settings file looked up in each directory.
pub const CONFIG_FILE_NAME: &str = ".pullcdn.toml";

/// Overrides `cdn-host`.
pub const ENV_CDN_HOST: &str = "CDN_HOST";

/// Overrides `uploads`: truthy means uploads only.
pub const ENV_UPLOADS_ONLY: &str = "CDN_UPLOADS_ONLY";

/// Truthy disables rewriting.
pub const ENV_DISABLE: &str = "CDN_DISABLE";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.pullcdn.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.pullcdn.toml
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = start_dir.to_path_buf();

	// Walk up the directory tree
	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			let config = parse_config_file(&config_path)?;
			let is_root = config.root;
			log::debug!("found config {}", config_path.display());

			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if is_root {
				break;
			}
		}

		// Move to parent directory
		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Load the user's ~/.pullcdn.toml if it exists and the walk didn't already pick it up.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	let user_config_path = user_config_path()?;

	if existing_configs.iter().any(|c| c.path == user_config_path) {
		return Ok(None);
	}

	if user_config_path.exists() {
		let config = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedConfig {
			config,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Check if an environment value counts as "on".
pub fn is_truthy(value: &str) -> bool {
	let lower = value.trim().to_lowercase();
	!lower.is_empty() && lower != "0" && lower != "false" && lower != "no"
}

/// Merge multiple configs into a single effective config.
///
/// For each key the first config in cascade order that sets it wins.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	fn pick<T: Clone>(slot: &mut Option<Setting<T>>, value: &Option<T>, path: &Path) {
		if slot.is_none()
			&& let Some(value) = value
		{
			*slot = Some(Setting::new(
				value.clone(),
				SettingSource::File(path.to_path_buf()),
			));
		}
	}

	let mut merged = MergedConfig::default();

	for loaded in configs {
		let config = &loaded.config;
		let path = loaded.path.as_path();
		pick(&mut merged.cdn_host, &config.cdn_host, path);
		pick(&mut merged.uploads, &config.uploads, path);
		pick(&mut merged.site_url, &config.site_url, path);
		pick(&mut merged.uploads_url, &config.uploads_url, path);
		pick(&mut merged.extensions, &config.extensions, path);
		pick(&mut merged.disabled, &config.disabled, path);
	}

	merged
}

/// Apply `CDN_HOST`, `CDN_UPLOADS_ONLY` and `CDN_DISABLE` on top of file settings.
///
/// `lookup` returns the value of an environment variable, if set.
pub fn apply_env_overrides<F>(merged: &mut MergedConfig, lookup: F) -> Result<()>
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(host) = lookup(ENV_CDN_HOST) {
		crate::config::types::validate_cdn_host(&host)?;
		merged.cdn_host = Some(Setting::new(host, SettingSource::Env(ENV_CDN_HOST)));
	}

	if let Some(value) = lookup(ENV_UPLOADS_ONLY) {
		merged.uploads = Some(Setting::new(
			Toggle::from(is_truthy(&value)),
			SettingSource::Env(ENV_UPLOADS_ONLY),
		));
	}

	if let Some(value) = lookup(ENV_DISABLE)
		&& is_truthy(&value)
	{
		merged.disabled = Some(Setting::new(true, SettingSource::Env(ENV_DISABLE)));
	}

	Ok(())
}

fn process_env(name: &str) -> Option<String> {
	std::env::var(name).ok()
}

/// Discover, load, and merge configs from a directory, then apply the environment.
///
/// The loaded files are returned alongside for display.
pub fn load_merged_config(start_dir: &Path) -> Result<(Vec<LoadedConfig>, MergedConfig)> {
	let configs = discover_configs(start_dir)?;
	let mut merged = merge_configs(&configs);
	apply_env_overrides(&mut merged, process_env)?;
	Ok((configs, merged))
}

/// Load exactly one config file, skipping discovery.
pub fn load_config_file(path: &Path) -> Result<(LoadedConfig, MergedConfig)> {
	let loaded = LoadedConfig {
		config: parse_config_file(path)?,
		path: path.to_path_buf(),
	};
	let mut merged = merge_configs(std::slice::from_ref(&loaded));
	apply_env_overrides(&mut merged, process_env)?;
	Ok((loaded, merged))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(CdnError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::parser::parse_config_str;
	use crate::rewrite::Mode;
	use std::collections::HashMap;

	fn loaded(content: &str, path: &str) -> LoadedConfig {
		let path = PathBuf::from(path);
		LoadedConfig {
			config: parse_config_str(content, &path).unwrap(),
			path,
		}
	}

	fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name: &str| map.get(name).cloned()
	}

	#[test]
	fn test_is_truthy() {
		assert!(!is_truthy(""));
		assert!(!is_truthy("0"));
		assert!(!is_truthy("false"));
		assert!(!is_truthy("FALSE"));
		assert!(!is_truthy("no"));
		assert!(is_truthy("1"));
		assert!(is_truthy("true"));
		assert!(is_truthy("yes"));
		assert!(is_truthy("on"));
	}

	#[test]
	fn test_merge_most_specific_wins_per_key() {
		let configs = vec![
			loaded(r#"cdn-host = "cdn.project.net""#, "/srv/site/.pullcdn.toml"),
			loaded(
				r#"
cdn-host = "cdn.user.net"
uploads = "off"
site-url = "https://example.com"
"#,
				"/home/me/.pullcdn.toml",
			),
		];
		let merged = merge_configs(&configs);

		let host = merged.cdn_host.as_ref().unwrap();
		assert_eq!(host.value, "cdn.project.net");
		assert_eq!(
			host.source,
			SettingSource::File(PathBuf::from("/srv/site/.pullcdn.toml"))
		);

		let uploads = merged.uploads.as_ref().unwrap();
		assert_eq!(uploads.value, Toggle::Off);
		assert_eq!(
			uploads.source,
			SettingSource::File(PathBuf::from("/home/me/.pullcdn.toml"))
		);
		assert!(merged.extensions.is_none());
	}

	#[test]
	fn test_env_overrides() {
		let mut merged = merge_configs(&[loaded(
			r#"
cdn-host = "cdn.file.net"
uploads = "on"
"#,
			"test.toml",
		)]);
		apply_env_overrides(
			&mut merged,
			env(&[(ENV_CDN_HOST, "cdn.env.net"), (ENV_UPLOADS_ONLY, "0")]),
		)
		.unwrap();

		let config = merged.configuration();
		assert_eq!(config.cdn_host, "cdn.env.net");
		assert_eq!(config.mode, Mode::AllAssets);
		assert_eq!(
			merged.cdn_host.unwrap().source,
			SettingSource::Env(ENV_CDN_HOST)
		);
	}

	#[test]
	fn test_env_empty_host_disables() {
		let mut merged = merge_configs(&[loaded(r#"cdn-host = "cdn.file.net""#, "test.toml")]);
		apply_env_overrides(&mut merged, env(&[(ENV_CDN_HOST, "")])).unwrap();
		assert!(!merged.configuration().is_active());
	}

	#[test]
	fn test_env_disable() {
		let mut merged = MergedConfig::default();
		apply_env_overrides(&mut merged, env(&[(ENV_DISABLE, "no")])).unwrap();
		assert!(merged.disabled.is_none());

		apply_env_overrides(&mut merged, env(&[(ENV_DISABLE, "1")])).unwrap();
		assert!(merged.configuration().disabled);
	}

	#[test]
	fn test_env_host_validated() {
		let mut merged = MergedConfig::default();
		let result = apply_env_overrides(&mut merged, env(&[(ENV_CDN_HOST, "http://cdn.net")]));
		assert!(matches!(result, Err(CdnError::InvalidCdnHost { .. })));
	}

	#[test]
	fn test_user_config_path() {
		let path = user_config_path();
		assert!(path.is_ok());
		let path = path.unwrap();
		assert!(path.ends_with(".pullcdn.toml"));
	}
}
