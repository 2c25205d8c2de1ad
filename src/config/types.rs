use crate::error::CdnError;
use crate::rewrite::{Configuration, DEFAULT_EXTENSIONS, Mode};
use crate::site::ConfiguredSite;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Top-level configuration from a `.pullcdn.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// If true, stop the directory cascade here and jump to ~/.pullcdn.toml.
	#[serde(default)]
	pub root: bool,

	/// CDN hostname without a scheme, e.g. `cdn.example.net`.
	pub cdn_host: Option<String>,

	/// `on` rewrites uploads only, `off` rewrites every asset.
	pub uploads: Option<Toggle>,

	/// The site's home URL.
	pub site_url: Option<String>,

	/// Base URL of upload storage. Defaults to `<site-url>/wp-content/uploads`.
	pub uploads_url: Option<String>,

	/// Extension patterns to rewrite, e.g. `["jpe?g", "png"]`.
	pub extensions: Option<Vec<String>>,

	/// Turn rewriting off without removing the rest of the settings.
	pub disabled: Option<bool>,
}

/// An `on`/`off` switch as stored in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
	On,
	Off,
}

impl Toggle {
	pub fn is_on(self) -> bool {
		self == Toggle::On
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Toggle::On => "on",
			Toggle::Off => "off",
		}
	}
}

impl From<bool> for Toggle {
	fn from(on: bool) -> Self {
		if on { Toggle::On } else { Toggle::Off }
	}
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Where an effective setting came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingSource {
	File(PathBuf),
	Env(&'static str),
}

impl fmt::Display for SettingSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SettingSource::File(path) => write!(f, "{}", path.display()),
			SettingSource::Env(var) => write!(f, "${}", var),
		}
	}
}

/// A setting value together with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting<T> {
	pub value: T,
	pub source: SettingSource,
}

impl<T> Setting<T> {
	pub fn new(value: T, source: SettingSource) -> Self {
		Setting { value, source }
	}
}

/// Effective configuration after the cascade and environment overrides.
///
/// `None` means no file or variable set the key and the default applies.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	pub cdn_host: Option<Setting<String>>,
	pub uploads: Option<Setting<Toggle>>,
	pub site_url: Option<Setting<String>>,
	pub uploads_url: Option<Setting<String>>,
	pub extensions: Option<Setting<Vec<String>>>,
	pub disabled: Option<Setting<bool>>,
}

impl MergedConfig {
	/// The rewriter configuration these settings describe.
	pub fn configuration(&self) -> Configuration {
		let cdn_host = self
			.cdn_host
			.as_ref()
			.map(|s| s.value.trim().to_string())
			.unwrap_or_default();
		let uploads = self.uploads.as_ref().is_none_or(|s| s.value.is_on());
		let extensions = match self.extensions {
			Some(ref s) => s.value.clone(),
			None => DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
		};

		Configuration {
			cdn_host,
			mode: Mode::from_uploads_flag(uploads),
			extensions,
			disabled: self.disabled.as_ref().is_some_and(|s| s.value),
		}
	}

	/// The site lookups these settings describe.
	pub fn site(&self) -> ConfiguredSite {
		ConfiguredSite::new(
			self.site_url.as_ref().map(|s| s.value.clone()),
			self.uploads_url.as_ref().map(|s| s.value.clone()),
		)
	}
}

impl Config {
	/// Reject values that can never work as a CDN host.
	pub fn validate(&self) -> Result<(), CdnError> {
		if let Some(ref host) = self.cdn_host {
			validate_cdn_host(host)?;
		}
		Ok(())
	}
}

/// A CDN host is a bare hostname (optionally with port): no scheme, no path.
///
/// Only characters that can appear in a host name, IP literal or port are
/// accepted, since the value is written straight into attribute values.
pub fn validate_cdn_host(host: &str) -> Result<(), CdnError> {
	let host = host.trim();
	let valid = host
		.chars()
		.all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '[' | ']'));
	if !valid {
		return Err(CdnError::InvalidCdnHost {
			host: host.to_string(),
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn file_setting<T>(value: T) -> Option<Setting<T>> {
		Some(Setting::new(
			value,
			SettingSource::File(PathBuf::from("test.toml")),
		))
	}

	#[test]
	fn test_empty_merged_config_defaults() {
		let merged = MergedConfig::default();
		let config = merged.configuration();

		assert_eq!(config.cdn_host, "");
		assert_eq!(config.mode, Mode::UploadsOnly);
		assert_eq!(config.extensions.len(), DEFAULT_EXTENSIONS.len());
		assert!(!config.disabled);
		assert!(!config.is_active());
	}

	#[test]
	fn test_merged_config_to_configuration() {
		let merged = MergedConfig {
			cdn_host: file_setting(" cdn.example.net ".to_string()),
			uploads: file_setting(Toggle::Off),
			extensions: file_setting(vec!["png".to_string()]),
			..Default::default()
		};
		let config = merged.configuration();

		assert_eq!(config.cdn_host, "cdn.example.net");
		assert_eq!(config.mode, Mode::AllAssets);
		assert_eq!(config.extensions, vec!["png".to_string()]);
		assert!(config.is_active());
	}

	#[test]
	fn test_merged_config_site() {
		let merged = MergedConfig {
			site_url: file_setting("https://example.com".to_string()),
			..Default::default()
		};
		let site = merged.site();
		assert_eq!(site.site_url.as_deref(), Some("https://example.com"));
		assert!(site.uploads_url.is_none());
	}

	#[test]
	fn test_validate_cdn_host() {
		assert!(validate_cdn_host("cdn.example.net").is_ok());
		assert!(validate_cdn_host("cdn.example.net:8080").is_ok());
		assert!(validate_cdn_host("").is_ok());
		assert!(matches!(
			validate_cdn_host("https://cdn.example.net"),
			Err(CdnError::InvalidCdnHost { .. })
		));
		assert!(validate_cdn_host("cdn.example.net/assets").is_err());
		assert!(validate_cdn_host("cdn example.net").is_err());
	}

	#[test]
	fn test_validate_cdn_host_rejects_markup_characters() {
		for host in [
			r#"cdn".example.net"#,
			"cdn'.example.net",
			"<cdn>.example.net",
			"cdn$1.example.net",
			"cdn.example.net?x=1",
			"user@cdn.example.net",
		] {
			assert!(
				matches!(validate_cdn_host(host), Err(CdnError::InvalidCdnHost { .. })),
				"{host} should be rejected"
			);
		}
		assert!(validate_cdn_host("bücher-cdn.example.net").is_ok());
		assert!(validate_cdn_host("[::1]:8080").is_ok());
	}

	#[test]
	fn test_setting_source_display() {
		assert_eq!(SettingSource::Env("CDN_HOST").to_string(), "$CDN_HOST");
		assert_eq!(
			SettingSource::File(PathBuf::from("/srv/.pullcdn.toml")).to_string(),
			"/srv/.pullcdn.toml"
		);
	}
}
