//! Site and upload-storage resolution.
//!
//! The rewriter needs two facts about the site it is serving: the site's own
//! hostname (for rewriting every asset) and the base URL of upload storage
//! (for rewriting uploads only). Both come through the [`Site`] trait so that
//! an embedding server can answer them however it likes.

use crate::error::{CdnError, Result};
use url::Url;

/// Upload path used when only a site URL is configured.
pub const DEFAULT_UPLOADS_PATH: &str = "/wp-content/uploads";

/// Host and base path of the upload storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBase {
	/// Hostname, without scheme or port.
	pub host: String,

	/// Base path without a trailing slash, e.g. `/wp-content/uploads`.
	/// Empty when uploads live at the site root.
	pub path: String,
}

/// Source of the site facts the rewriter depends on.
pub trait Site {
	/// The site's own hostname.
	fn site_host(&self) -> Result<String>;

	/// The resolved upload-storage base.
	fn upload_base(&self) -> Result<UploadBase>;
}

/// A [`Site`] backed by URLs from the settings file.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredSite {
	pub site_url: Option<String>,
	pub uploads_url: Option<String>,
}

impl ConfiguredSite {
	pub fn new(site_url: Option<String>, uploads_url: Option<String>) -> Self {
		ConfiguredSite {
			site_url,
			uploads_url,
		}
	}
}

impl Site for ConfiguredSite {
	fn site_host(&self) -> Result<String> {
		let site_url = self
			.site_url
			.as_deref()
			.ok_or(CdnError::MissingSiteUrl {
				needed_for: "all-assets mode",
			})?;
		Ok(parse_url(site_url)?.0)
	}

	fn upload_base(&self) -> Result<UploadBase> {
		if let Some(ref uploads_url) = self.uploads_url {
			return parse_upload_base(uploads_url);
		}

		let site_url = self
			.site_url
			.as_deref()
			.ok_or(CdnError::MissingSiteUrl {
				needed_for: "uploads-only mode",
			})?;
		let (host, path) = parse_url(site_url)?;
		Ok(UploadBase {
			host,
			path: format!("{}{}", path, DEFAULT_UPLOADS_PATH),
		})
	}
}

/// Parse an upload-storage base URL into host and path.
///
/// Protocol-relative values (`//host/path`) are treated as `http://host/path`.
pub fn parse_upload_base(raw: &str) -> Result<UploadBase> {
	let (host, path) = parse_url(raw)?;
	Ok(UploadBase { host, path })
}

/// Turn a protocol-relative URL into an `http` one; anything else is returned as-is.
pub fn normalize_protocol_relative(raw: &str) -> String {
	match raw.strip_prefix("//") {
		Some(rest) => format!("http://{}", rest.trim_start_matches('/')),
		None => raw.to_string(),
	}
}

/// Split a URL into `(host, path)` with the path's trailing slash removed.
///
/// `Url` only validates; host and path are taken verbatim from the input so
/// they match how the site writes its own references (no punycode, no case
/// folding, no percent-encoding). Userinfo and port are dropped.
fn parse_url(raw: &str) -> Result<(String, String)> {
	let normalized = normalize_protocol_relative(raw.trim());
	let url = Url::parse(&normalized).map_err(|source| CdnError::InvalidUrl {
		url: raw.to_string(),
		source,
	})?;
	let parsed_host = url
		.host_str()
		.filter(|h| !h.is_empty())
		.ok_or_else(|| CdnError::MissingHost {
			url: raw.to_string(),
		})?;
	let (host, path) = match split_authority(&normalized) {
		Some((host, path)) if !host.is_empty() => (host.to_string(), path.to_string()),
		_ => (parsed_host.to_string(), url.path().to_string()),
	};

	Ok((host, path.trim_end_matches('/').to_string()))
}

/// Raw `(host, path)` slices of `scheme://[userinfo@]host[:port]/path[?query][#fragment]`.
fn split_authority(url: &str) -> Option<(&str, &str)> {
	let (_, rest) = url.split_once("://")?;
	let authority_end = rest
		.find(|c: char| matches!(c, '/' | '?' | '#'))
		.unwrap_or(rest.len());
	let (authority, rest) = rest.split_at(authority_end);
	let path = &rest[..rest.find(|c: char| matches!(c, '?' | '#')).unwrap_or(rest.len())];

	let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
	let host = if host_port.starts_with('[') {
		// IPv6 literal keeps its brackets
		&host_port[..=host_port.find(']')?]
	} else {
		host_port.split_once(':').map_or(host_port, |(h, _)| h)
	};

	Some((host, path))
}
