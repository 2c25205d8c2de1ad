use crate::error::Result;
use crate::site::Site;

/// Which asset references are eligible for rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
	/// Any asset on the site's own host, or any root-relative asset.
	AllAssets,

	/// Only assets under the upload storage base path.
	#[default]
	UploadsOnly,
}

impl Mode {
	/// Map the stored `uploads` toggle onto a mode.
	pub fn from_uploads_flag(uploads: bool) -> Self {
		if uploads {
			Mode::UploadsOnly
		} else {
			Mode::AllAssets
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Mode::AllAssets => "all-assets",
			Mode::UploadsOnly => "uploads-only",
		}
	}
}

/// Everything the rewriter factory needs besides the site lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
	/// CDN hostname, no scheme. Empty disables rewriting.
	pub cdn_host: String,

	pub mode: Mode,

	/// Extension patterns, e.g. `jpe?g`. Empty disables rewriting.
	pub extensions: Vec<String>,

	/// Kill switch that overrides everything else.
	pub disabled: bool,
}

impl Configuration {
	/// Why rewriting is off for this configuration, if it is.
	pub fn disabled_reason(&self) -> Option<&'static str> {
		if self.disabled {
			Some("disabled by configuration")
		} else if self.cdn_host.trim().is_empty() {
			Some("no cdn-host configured")
		} else if self.extensions.is_empty() {
			Some("no extensions configured")
		} else {
			None
		}
	}

	pub fn is_active(&self) -> bool {
		self.disabled_reason().is_none()
	}
}

/// The origin locations whose asset references get rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginScope {
	/// Root-relative paths, or absolute URLs on the site's own host.
	AllAssets { host: String },

	/// Paths under `path`, optionally prefixed with the upload host.
	UploadsOnly { host: String, path: String },
}

impl OriginScope {
	/// Resolve the scope for `mode`, consulting the site only for what that mode needs.
	pub fn resolve(mode: Mode, site: &dyn Site) -> Result<Self> {
		match mode {
			Mode::AllAssets => Ok(OriginScope::AllAssets {
				host: site.site_host()?,
			}),
			Mode::UploadsOnly => {
				let base = site.upload_base()?;
				Ok(OriginScope::UploadsOnly {
					host: base.host,
					path: base.path,
				})
			}
		}
	}

	pub fn host(&self) -> &str {
		match self {
			OriginScope::AllAssets { host } | OriginScope::UploadsOnly { host, .. } => host,
		}
	}

	/// Path kept between the CDN host and the matched relative path.
	pub fn base_path(&self) -> &str {
		match self {
			OriginScope::AllAssets { .. } => "",
			OriginScope::UploadsOnly { path, .. } => path,
		}
	}
}
