use std::path::PathBuf;

/// Library-level structured errors for pullcdn.
///
/// The CLI binary wraps these with `anyhow` for context chains.
#[derive(Debug, thiserror::Error)]
pub enum CdnError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid CDN host (expected a bare hostname, no scheme or path): {host}")]
	InvalidCdnHost { host: String },

	#[error("Invalid extension pattern: {pattern}")]
	InvalidExtension {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Extension patterns must not be empty")]
	EmptyExtension,

	#[error("Failed to compile asset pattern")]
	InvalidPattern {
		#[source]
		source: regex::Error,
	},

	#[error("Invalid URL: {url}")]
	InvalidUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},

	#[error("URL has no host: {url}")]
	MissingHost { url: String },

	#[error("No site URL configured (needed for {needed_for})")]
	MissingSiteUrl { needed_for: &'static str },

	#[error("Failed to read body from {source_name}")]
	BodyReadError {
		source_name: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write body to {target_name}")]
	BodyWriteError {
		target_name: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using CdnError.
pub type Result<T> = std::result::Result<T, CdnError>;
