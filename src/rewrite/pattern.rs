use crate::error::{CdnError, Result};
use crate::rewrite::policy::OriginScope;
use regex::{Captures, Regex};

/// Extensions rewritten when the configuration does not name its own.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpe?g", "gif", "png", "css", "bmp", "js", "ico"];

/// One alternative of the compiled pattern per quote style.
///
/// `regex` has no back-references, so "closing quote equals opening quote"
/// is expressed by compiling the whole reference once for each quote.
const QUOTES: &[(char, &str)] = &[('"', "dq"), ('\'', "sq")];

/// An asset reference found inside an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedReference<'h> {
	/// The quote character delimiting the attribute value.
	pub quote: char,

	/// Scheme and host prefix, e.g. `https://example.com`. None for relative references.
	pub domain: Option<&'h str>,

	/// Path and basename after the origin prefix, without a leading slash.
	pub path: &'h str,

	/// The extension, without the dot.
	pub extension: &'h str,

	/// Query string including the leading `?`.
	pub query: Option<&'h str>,
}

/// Compiled matcher for `="<origin>/<path>.<ext>[?query]"` attribute values.
#[derive(Debug, Clone)]
pub struct AssetPattern {
	regex: Regex,
}

impl AssetPattern {
	/// Build the matcher for `extensions` under `scope`.
	///
	/// Every extension pattern is validated on its own first so that a bad
	/// entry is reported by name.
	pub fn compile(extensions: &[String], scope: &OriginScope) -> Result<Self> {
		for ext in extensions {
			validate_extension(ext)?;
		}

		let alternation = extensions
			.iter()
			.map(|ext| format!("(?:{})", ext))
			.collect::<Vec<_>>()
			.join("|");

		let branches = QUOTES
			.iter()
			.map(|&(quote, tag)| reference_branch(quote, tag, scope, &alternation))
			.collect::<Vec<_>>()
			.join("|");
		let pattern = format!("=(?:{})", branches);

		let regex = Regex::new(&pattern).map_err(|source| CdnError::InvalidPattern { source })?;
		log::debug!("compiled asset pattern: {}", regex.as_str());

		Ok(AssetPattern { regex })
	}

	pub fn regex(&self) -> &Regex {
		&self.regex
	}

	/// Pull the reference parts out of one match of this pattern.
	pub fn reference<'h>(&self, caps: &Captures<'h>) -> Option<MatchedReference<'h>> {
		QUOTES.iter().find_map(|&(quote, tag)| {
			let path = caps.name(&format!("{tag}_path"))?;
			let extension = caps.name(&format!("{tag}_ext"))?;
			Some(MatchedReference {
				quote,
				domain: caps.name(&format!("{tag}_domain")).map(|m| m.as_str()),
				path: path.as_str(),
				extension: extension.as_str(),
				query: caps.name(&format!("{tag}_query")).map(|m| m.as_str()),
			})
		})
	}

	/// All references in `body`, left to right, non-overlapping.
	pub fn references<'h>(&self, body: &'h str) -> impl Iterator<Item = MatchedReference<'h>> {
		self.regex
			.captures_iter(body)
			.filter_map(move |caps| self.reference(&caps))
	}
}

fn validate_extension(ext: &str) -> Result<()> {
	if ext.trim().is_empty() {
		return Err(CdnError::EmptyExtension);
	}
	Regex::new(&format!("^(?:{})$", ext)).map_err(|source| CdnError::InvalidExtension {
		pattern: ext.to_string(),
		source,
	})?;
	Ok(())
}

/// The part between the opening quote and the relative path.
///
/// The scheme+host is optional in both scopes; uploads scope also requires
/// the upload base path.
fn origin_prefix(scope: &OriginScope, tag: &str) -> String {
	let host = regex::escape(scope.host());
	let path = regex::escape(scope.base_path());
	format!("(?P<{tag}_domain>(?:https?:)?//{host})?{path}/")
}

fn reference_branch(quote: char, tag: &str, scope: &OriginScope, alternation: &str) -> String {
	let q = regex::escape(&quote.to_string());
	let origin = origin_prefix(scope, tag);
	// Everything up to the closing quote, on one line. The first path byte
	// may not be '/', so protocol-relative URLs of other hosts never match.
	let not_quote = format!("[^{q}\\n]");
	let path_start = format!("[^/{q}\\n]");

	format!(
		"{q}{origin}(?P<{tag}_path>{path_start}{not_quote}*)\\.(?P<{tag}_ext>{alternation})(?P<{tag}_query>\\?{not_quote}+)?{q}"
	)
}
